//! 高层控制模块
//!
//! 在动作原语之上组合出抓取、触碰、轻敲等手势：
//! - [`GestureCombinator`]: 手势组合器（组合而非继承：接收端 + 接近策略）
//! - [`ApproachStrategy`]: 普通到达或碰到即停
//! - [`PrimitiveSink`]: 组合器依赖的最小接口，[`ActionEngine`](affprim_client::ActionEngine) 已实现

mod error;
pub mod gesture;
pub mod sink;

pub use error::GestureError;
pub use gesture::{ApproachStrategy, GestureCombinator, GestureKeys};
pub use sink::PrimitiveSink;
