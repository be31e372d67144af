//! 错误类型体系
//!
//! 区分被拒绝的请求（无状态变化）、初始化失败和运行期运动故障。
//!
//! # 示例
//!
//! ```rust
//! use affprim_client::EngineError;
//!
//! fn handle_error(err: EngineError) {
//!     if err.is_config_error() {
//!         eprintln!("引擎不可用: {}", err);
//!     } else if err.is_rejection() {
//!         eprintln!("请求被拒绝，队列未改变: {}", err);
//!     } else {
//!         eprintln!("运动故障: {}", err);
//!     }
//! }
//! ```

use affprim_driver::DriverError;
use affprim_protocol::{Facet, ProtocolError};
use thiserror::Error;

/// 引擎错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    // ==================== Setup ====================
    /// 缺少或无效的配置项（引擎无法创建）
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ==================== Rejected requests ====================
    /// 路点向量长度与手部布局不符
    #[error("Dimension mismatch for {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// 出错的向量
        field: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 手部序列未注册
    #[error("Unknown hand sequence: \"{0}\"")]
    UnknownSequence(String),

    /// 引擎已关闭
    #[error("Action queue unavailable: engine is closed")]
    QueueUnavailable,

    /// 动作本身无效
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// 仅在手动步进模式下可用的操作
    #[error("Engine is not in manual stepping mode")]
    NotManual,

    // ==================== Runtime ====================
    /// 外部服务在动作执行中报告故障
    #[error("{facet} motion fault: {message}")]
    MotionFault {
        /// 出错的 facet
        facet: Facet,
        /// 服务返回的信息
        message: String,
    },
}

impl EngineError {
    /// 由驱动错误构造运动故障
    pub fn motion_fault(facet: Facet, err: &DriverError) -> Self {
        EngineError::MotionFault {
            facet,
            message: err.to_string(),
        }
    }

    /// 是否为初始化阶段的配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// 是否为被拒绝的请求（调用方可修正后重试，引擎状态未变）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::UnknownSequence(_)
                | Self::InvalidAction(_)
                | Self::QueueUnavailable
                | Self::NotManual
        )
    }
}

impl From<ProtocolError> for EngineError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::DimensionMismatch {
                field,
                expected,
                actual,
            } => EngineError::DimensionMismatch {
                field,
                expected,
                actual,
            },
            ProtocolError::InvalidLayout(msg) => EngineError::Configuration(msg),
            ProtocolError::InvalidAction(msg) => EngineError::InvalidAction(msg),
        }
    }
}

/// 引擎结果类型
pub type Result<T> = std::result::Result<T, EngineError>;
