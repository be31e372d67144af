//! 驱动层错误类型定义

use thiserror::Error;

/// 外部运动服务错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 服务不可用（未连接或已关闭）
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// 服务拒绝了命令
    #[error("Command rejected: {0}")]
    Rejected(String),

    /// 服务报告硬件故障
    #[error("Hardware fault: {0}")]
    Fault(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,

    /// 无效输入（如维度不匹配）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DriverError {
    /// 是否可重试
    ///
    /// 超时和服务暂时不可用可能在下一次调用时恢复。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Unavailable(_))
    }
}
