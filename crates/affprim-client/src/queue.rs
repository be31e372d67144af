//! 动作队列
//!
//! FIFO：尾部插入、头部消费。队列本身不加锁，由引擎的共享状态锁保护；
//! 正在执行的动作留在队头，完成后才由执行器移除。
//!
//! 每个条目带有单调递增的 id，执行器只会移除自己启动的那个条目
//! （例如在执行期间客户端 `clear()` 后又 `push()` 了新动作）。

use crate::error::{EngineError, Result};
use affprim_protocol::Action;
use std::collections::VecDeque;

/// 队列条目
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedAction {
    /// 条目 id（引擎内唯一）
    pub id: u64,
    /// 动作
    pub action: Action,
}

/// 动作队列
#[derive(Debug, Default)]
pub struct ActionQueue {
    entries: VecDeque<QueuedAction>,
    next_id: u64,
    closed: bool,
}

impl ActionQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 尾部追加，返回条目 id
    pub fn push(&mut self, action: Action) -> Result<u64> {
        if self.closed {
            return Err(EngineError::QueueUnavailable);
        }
        Ok(self.push_unchecked(action))
    }

    /// 连续追加一组动作，返回它们的 id
    pub fn push_batch(&mut self, actions: Vec<Action>) -> Result<Vec<u64>> {
        if self.closed {
            return Err(EngineError::QueueUnavailable);
        }
        Ok(actions.into_iter().map(|a| self.push_unchecked(a)).collect())
    }

    fn push_unchecked(&mut self, action: Action) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_back(QueuedAction { id, action });
        id
    }

    /// 移除并返回队头
    pub fn pop_front(&mut self) -> Option<QueuedAction> {
        self.entries.pop_front()
    }

    /// 仅当队头 id 匹配时移除队头
    pub fn pop_front_if(&mut self, id: u64) -> Option<QueuedAction> {
        if self.front().map(|e| e.id) == Some(id) {
            self.pop_front()
        } else {
            None
        }
    }

    /// 查看队头
    pub fn front(&self) -> Option<&QueuedAction> {
        self.entries.front()
    }

    /// 清空队列，返回被丢弃的条目数
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 按顺序遍历条目
    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.entries.iter()
    }

    /// 关闭队列（之后的 push 均失败）并清空
    pub fn close(&mut self) {
        self.closed = true;
        self.entries.clear();
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
