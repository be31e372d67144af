//! 命令定义和实现

pub mod config;
pub mod gesture;
pub mod seqs;

pub use config::ConfigCommand;
pub use gesture::GestureCommand;
pub use seqs::SeqsCommand;
