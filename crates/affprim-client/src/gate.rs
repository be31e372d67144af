//! 同步门（Synchronization Gate）
//!
//! 提供"队列是否已排空"的阻塞/非阻塞查询，阻塞等待可被取消。
//!
//! 与引擎共享状态锁分离：门拥有自己的 `Mutex + Condvar`，
//! 执行器在每个周期结束时（持有共享状态锁）发布空闲状态。
//! 锁顺序固定为：共享状态 → 门。
//!
//! # 语义
//!
//! - 已空闲时阻塞查询立即返回 [`CheckOutcome::Done`]（即使阻塞功能已被禁用）
//! - `interrupt(false)` 唤醒当前所有等待者，返回 [`CheckOutcome::Interrupted`]
//! - `interrupt(true)` 额外设置常驻标志，之后的阻塞查询不再等待
//! - `reinstate()` 清除常驻标志
//! - 超时返回 [`CheckOutcome::Pending`]

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// 同步查询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// 队列已排空且没有动作在执行
    Done,
    /// 仍有动作（非阻塞查询，或阻塞查询超时）
    Pending,
    /// 阻塞查询被中断
    Interrupted,
}

impl CheckOutcome {
    /// 是否为 [`CheckOutcome::Done`]
    pub fn is_done(self) -> bool {
        self == CheckOutcome::Done
    }
}

#[derive(Debug)]
struct GateInner {
    idle: bool,
    disabled: bool,
    epoch: u64,
}

/// 同步门
#[derive(Debug)]
pub struct SyncGate {
    inner: Mutex<GateInner>,
    cond: Condvar,
}

impl Default for SyncGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncGate {
    /// 创建处于空闲状态的门
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                idle: true,
                disabled: false,
                epoch: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// 发布空闲状态；变为空闲时唤醒所有等待者
    pub fn set_idle(&self, idle: bool) {
        let mut inner = self.inner.lock();
        let became_idle = idle && !inner.idle;
        inner.idle = idle;
        if became_idle {
            self.cond.notify_all();
        }
    }

    /// 非阻塞查询
    pub fn is_idle(&self) -> bool {
        self.inner.lock().idle
    }

    /// 阻塞等待空闲
    ///
    /// `timeout` 为 `None` 时无限等待（直到空闲或被中断）。
    pub fn wait_idle(&self, timeout: Option<Duration>) -> CheckOutcome {
        let mut inner = self.inner.lock();
        if inner.idle {
            return CheckOutcome::Done;
        }
        if inner.disabled {
            return CheckOutcome::Interrupted;
        }

        let epoch = inner.epoch;
        // 超出时钟范围的超时按无限等待处理
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            if inner.idle {
                return CheckOutcome::Done;
            }
            if inner.disabled || inner.epoch != epoch {
                return CheckOutcome::Interrupted;
            }
            match deadline {
                None => self.cond.wait(&mut inner),
                Some(deadline) => {
                    if self.cond.wait_until(&mut inner, deadline).timed_out() {
                        return if inner.idle {
                            CheckOutcome::Done
                        } else if inner.epoch != epoch {
                            CheckOutcome::Interrupted
                        } else {
                            CheckOutcome::Pending
                        };
                    }
                },
            }
        }
    }

    /// 中断所有正在等待的阻塞查询
    ///
    /// `disable` 为 true 时，之后的阻塞查询也立即返回，直到 [`reinstate`](Self::reinstate)。
    pub fn interrupt(&self, disable: bool) {
        let mut inner = self.inner.lock();
        inner.epoch = inner.epoch.wrapping_add(1);
        if disable {
            inner.disabled = true;
        }
        self.cond.notify_all();
        debug!("Sync gate interrupted (disable = {})", disable);
    }

    /// 恢复阻塞查询
    pub fn reinstate(&self) {
        self.inner.lock().disabled = false;
    }

    /// 阻塞查询是否被禁用
    pub fn is_disabled(&self) -> bool {
        self.inner.lock().disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_idle_gate_returns_immediately() {
        let gate = SyncGate::new();
        let start = Instant::now();
        assert_eq!(gate.wait_idle(None), CheckOutcome::Done);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_huge_timeout_waits_until_interrupted() {
        let gate = Arc::new(SyncGate::new());
        gate.set_idle(false);

        let g = gate.clone();
        let waiter = thread::spawn(move || g.wait_idle(Some(Duration::MAX)));
        thread::sleep(Duration::from_millis(20));
        gate.interrupt(false);
        assert_eq!(waiter.join().unwrap(), CheckOutcome::Interrupted);
    }

    #[test]
    fn test_timeout_returns_pending() {
        let gate = SyncGate::new();
        gate.set_idle(false);
        assert_eq!(
            gate.wait_idle(Some(Duration::from_millis(20))),
            CheckOutcome::Pending
        );
    }

    #[test]
    fn test_waiter_woken_on_idle() {
        let gate = Arc::new(SyncGate::new());
        gate.set_idle(false);

        let g = gate.clone();
        let waiter = thread::spawn(move || g.wait_idle(Some(Duration::from_secs(5))));
        thread::sleep(Duration::from_millis(20));
        gate.set_idle(true);
        assert_eq!(waiter.join().unwrap(), CheckOutcome::Done);
    }

    #[test]
    fn test_interrupt_wakes_waiter() {
        let gate = Arc::new(SyncGate::new());
        gate.set_idle(false);

        let g = gate.clone();
        let waiter = thread::spawn(move || g.wait_idle(None));
        thread::sleep(Duration::from_millis(20));
        gate.interrupt(false);
        assert_eq!(waiter.join().unwrap(), CheckOutcome::Interrupted);

        // 非禁用中断不影响之后的查询
        assert!(!gate.is_disabled());
        assert_eq!(
            gate.wait_idle(Some(Duration::from_millis(10))),
            CheckOutcome::Pending
        );
    }

    #[test]
    fn test_disable_and_reinstate() {
        let gate = SyncGate::new();
        gate.set_idle(false);
        gate.interrupt(true);
        assert_eq!(gate.wait_idle(None), CheckOutcome::Interrupted);

        gate.reinstate();
        assert_eq!(
            gate.wait_idle(Some(Duration::from_millis(10))),
            CheckOutcome::Pending
        );
    }

    #[test]
    fn test_disabled_gate_still_reports_done_when_idle() {
        let gate = SyncGate::new();
        gate.interrupt(true);
        assert_eq!(gate.wait_idle(None), CheckOutcome::Done);
    }
}
