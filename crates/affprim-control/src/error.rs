//! 组合动作错误类型

use affprim_client::EngineError;
use thiserror::Error;

/// 组合动作错误
///
/// 任何错误发生时都没有动作被压入队列。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GestureError {
    /// 手势需要的手部序列未注册
    #[error("Gesture \"{gesture}\" needs hand sequence \"{key}\", which is not registered")]
    MissingHandSequence {
        /// 手势名
        gesture: &'static str,
        /// 缺失的序列标签
        key: String,
    },

    /// 接触保护策略需要输出信号源
    #[error("Contact-guarded approach is not supported by this engine (no output signal source)")]
    GuardUnsupported,

    /// 引擎拒绝了动作
    #[error("Engine rejected gesture: {0}")]
    Engine(#[from] EngineError),
}

impl GestureError {
    /// 是否可以通过补充配置（注册序列、接入输出信号源）解决
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHandSequence { .. } | Self::GuardUnsupported
        ) || matches!(self, Self::Engine(e) if e.is_config_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_key() {
        let err = GestureError::MissingHandSequence {
            gesture: "grasp",
            key: "close_hand".into(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("grasp") && msg.contains("close_hand"));
        assert!(err.is_setup_error());
    }

    #[test]
    fn test_engine_error_converts() {
        let err: GestureError = EngineError::QueueUnavailable.into();
        assert_eq!(err, GestureError::Engine(EngineError::QueueUnavailable));
        assert!(!err.is_setup_error());
    }
}
