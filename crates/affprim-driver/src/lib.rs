//! 驱动层模块
//!
//! 本模块定义引擎与外部运动服务之间的边界，包括：
//! - 服务接口（任务空间位姿控制、手部关节控制、接触数据流、关节输出信号）
//! - 基于 channel 的接触数据流
//! - 后台接触监控线程（碰到即停）
//! - 进程内仿真后端
//!
//! # 使用场景
//!
//! 接入真实控制器时实现 [`PoseController`] / [`JointController`] 等 trait；
//! 测试和演示使用 [`sim`] 模块中的仿真器。
//! 大多数用户应该使用 `affprim-client` 提供的更高级接口。

pub mod contact;
mod error;
pub mod monitor;
mod service;
pub mod sim;

pub use contact::{ChannelContactSource, ContactSender, contact_channel};
pub use error::DriverError;
pub use monitor::{ContactMonitor, MonitorConfig};
pub use service::{ContactSource, JointController, OutputSource, PoseController};
pub use sim::{Completion, SimJointController, SimOutputSource, SimPoseController};
