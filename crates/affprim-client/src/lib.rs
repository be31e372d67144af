//! 客户端接口模块
//!
//! 本模块提供动作原语引擎的用户接口，包括：
//! - 动作队列（FIFO，单一消费者）
//! - 手部序列库（并发读写）
//! - 手臂/手部运动适配器
//! - 周期执行器（独立线程或手动步进）
//! - 同步门（阻塞式完成查询，可中断）
//!
//! # 使用场景
//!
//! 这是大多数用户应该使用的模块：通过 [`EngineBuilder`] 接入运动服务，
//! 然后在任意线程上向 [`ActionEngine`] 压入动作并查询完成状态。
//! 抓取/触碰/轻敲等组合动作见 `affprim-control`。

mod adapter;
pub mod builder;
pub mod config;
pub mod engine;
mod error;
pub mod executor;
pub mod gate;
pub mod latches;
pub mod library;
mod loop_runner;
pub mod queue;

// 重新导出常用类型
pub use adapter::{ArmMotion, HandMotion};
pub use builder::EngineBuilder;
pub use config::{AuxDof, EngineConfig};
pub use engine::ActionEngine;
pub use error::{EngineError, Result};
pub use executor::{EngineStatus, ExecutorState, FaultRecord};
pub use gate::{CheckOutcome, SyncGate};
pub use latches::{CompletionLatches, LatchSnapshot};
pub use library::HandSeqLibrary;
pub use loop_runner::LoopConfig;
pub use queue::{ActionQueue, QueuedAction};
