//! # affprim Tools - 配置文件与手部序列文件
//!
//! **依赖原则**: 只依赖 `affprim-protocol`，避免依赖 `affprim-client`
//!
//! ## 包含模块
//!
//! - `settings` - 引擎配置文件（只读结构，可生成模板）
//! - `sequences` - 手部序列定义文件（只读）
//!
//! 所有加载函数返回 `anyhow::Result`，错误信息带有文件路径和条目位置。

pub mod sequences;
pub mod settings;

// 重新导出常用类型
pub use sequences::{HandSequenceDef, HandSequenceFile, default_hand_sequences};
pub use settings::{AuxDofSettings, EngineSection, EngineSettings, HandSettings};
