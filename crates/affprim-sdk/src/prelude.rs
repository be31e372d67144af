//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use affprim_sdk::prelude::*;
//! ```

// 客户端层
pub use affprim_client::{
    ActionEngine, CheckOutcome, EngineBuilder, EngineConfig, EngineStatus, ExecutorState,
};

// 控制层
pub use affprim_control::{ApproachStrategy, GestureCombinator, GestureKeys};

// 数据模型
pub use affprim_protocol::{Action, ArmTarget, AxisAngle, ContactGuard, Position3D};

// 服务接口与仿真后端
pub use affprim_driver::{
    Completion, ContactSource, JointController, OutputSource, PoseController, SimJointController,
    SimOutputSource, SimPoseController, contact_channel,
};

// 配置文件
pub use affprim_tools::{EngineSettings, HandSequenceFile, default_hand_sequences};

// 错误类型
pub use affprim_client::EngineError;
pub use affprim_control::GestureError;
pub use affprim_driver::DriverError;
