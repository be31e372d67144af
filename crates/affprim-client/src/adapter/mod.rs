//! 运动适配器
//!
//! 包装外部运动服务，供执行器在控制周期内非阻塞地启动、轮询和中止运动。
//!
//! - [`ArmMotion`]: 任务空间到达（含辅助自由度管理和接触保护）
//! - [`HandMotion`]: 逐路点推进手部序列（含接触检测）

mod arm;
mod hand;

pub use arm::ArmMotion;
pub use hand::HandMotion;
