//! 原语接收端
//!
//! 组合动作只依赖这三个操作，方便在测试中替换为记录器。

use affprim_client::{ActionEngine, EngineError};
use affprim_protocol::Action;
use std::sync::Arc;

/// 接收原语动作的一方（通常是 [`ActionEngine`]）
pub trait PrimitiveSink {
    /// 原子地压入一组动作
    fn push_batch(&self, actions: Vec<Action>) -> Result<Vec<u64>, EngineError>;

    /// 手部序列是否已注册
    fn is_valid_hand_seq(&self, tag: &str) -> bool;

    /// 是否能执行带接触保护的到达
    fn supports_contact_guard(&self) -> bool;
}

impl PrimitiveSink for ActionEngine {
    fn push_batch(&self, actions: Vec<Action>) -> Result<Vec<u64>, EngineError> {
        ActionEngine::push_batch(self, actions)
    }

    fn is_valid_hand_seq(&self, tag: &str) -> bool {
        ActionEngine::is_valid_hand_seq(self, tag)
    }

    fn supports_contact_guard(&self) -> bool {
        ActionEngine::supports_contact_guard(self)
    }
}

impl<T: PrimitiveSink + ?Sized> PrimitiveSink for &T {
    fn push_batch(&self, actions: Vec<Action>) -> Result<Vec<u64>, EngineError> {
        (**self).push_batch(actions)
    }

    fn is_valid_hand_seq(&self, tag: &str) -> bool {
        (**self).is_valid_hand_seq(tag)
    }

    fn supports_contact_guard(&self) -> bool {
        (**self).supports_contact_guard()
    }
}

impl<T: PrimitiveSink + ?Sized> PrimitiveSink for Arc<T> {
    fn push_batch(&self, actions: Vec<Action>) -> Result<Vec<u64>, EngineError> {
        (**self).push_batch(actions)
    }

    fn is_valid_hand_seq(&self, tag: &str) -> bool {
        (**self).is_valid_hand_seq(tag)
    }

    fn supports_contact_guard(&self) -> bool {
        (**self).supports_contact_guard()
    }
}
