//! affprim SDK - 机械臂动作原语引擎
//!
//! 把"到达某个位姿""执行某个手部序列""等待一段时间"这类原语排队，
//! 由固定周期的执行器逐个驱动到完成，并提供可中断的阻塞式完成查询。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 位姿、手部路点、动作数据模型
//! - **驱动层** (`driver`): 外部运动服务接口、接触数据流、仿真后端
//! - **工具层** (`tools`): TOML 配置与手部序列文件
//! - **客户端层** (`client`): 动作引擎（队列、序列库、适配器、执行器、同步门）
//! - **控制层** (`control`): 抓取/触碰/轻敲手势组合
//!
//! # 快速开始
//!
//! ```rust
//! use affprim_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = EngineBuilder::new()
//!     .pose_controller(Arc::new(SimPoseController::new(Completion::Instant)))
//!     .joint_controller(Arc::new(SimJointController::new(9, Completion::Instant)))
//!     .hand_sequences(default_hand_sequences())
//!     .build()
//!     .unwrap();
//!
//! engine
//!     .push_reach_with_hand(Position3D::new(-0.3, 0.0, 0.1), AxisAngle::IDENTITY, "open_hand")
//!     .unwrap();
//! assert!(engine.check_actions_done(true));
//! ```

mod logging;
pub mod prelude;

/// 协议层
pub mod protocol {
    pub use affprim_protocol::*;
}

/// 驱动层
pub mod driver {
    pub use affprim_driver::*;
}

/// 工具层
pub mod tools {
    pub use affprim_tools::*;
}

/// 客户端层
pub mod client {
    pub use affprim_client::*;
}

/// 控制层
pub mod control {
    pub use affprim_control::*;
}

// --- 用户以此为界 ---

pub use logging::{init_logger, init_logger_with_filter};

// 协议层
pub use affprim_protocol::{
    Action, ArmTarget, AxisAngle, ContactGuard, Facet, HandLayout, HandWayPoint, Position3D,
    ProtocolError,
};

// 驱动层错误
pub use affprim_driver::DriverError;

// 客户端层（推荐入口）
pub use affprim_client::{
    ActionEngine, CheckOutcome, EngineBuilder, EngineConfig, EngineError, EngineStatus,
    ExecutorState, FaultRecord,
};

// 控制层
pub use affprim_control::{ApproachStrategy, GestureCombinator, GestureError, GestureKeys};
