//! 完成标志
//!
//! 两个独立的完成标志（arm / hand）及其"锁存"快照。
//! 只由执行器写入；状态查询在共享状态锁下读取，不会看到写了一半的状态。

/// 一组完成标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatchSnapshot {
    /// 手臂运动已完成
    pub arm_done: bool,
    /// 手部序列已完成
    pub hand_done: bool,
}

/// 完成标志及其锁存快照
#[derive(Debug, Default)]
pub struct CompletionLatches {
    current: LatchSnapshot,
    latched: LatchSnapshot,
}

impl CompletionLatches {
    /// 标记当前动作的手臂部分完成
    pub fn set_arm_done(&mut self) {
        self.current.arm_done = true;
    }

    /// 标记当前动作的手部部分完成
    pub fn set_hand_done(&mut self) {
        self.current.hand_done = true;
    }

    /// 动作完成时锁存当前标志，随后清除
    pub fn latch_and_clear(&mut self) {
        self.latched = self.current;
        self.current = LatchSnapshot::default();
    }

    /// 清除当前标志（不影响锁存值）
    pub fn clear(&mut self) {
        self.current = LatchSnapshot::default();
    }

    /// 当前动作的进度
    pub fn current(&self) -> LatchSnapshot {
        self.current
    }

    /// 上一个完成的动作的标志
    pub fn latched(&self) -> LatchSnapshot {
        self.latched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_and_clear() {
        let mut latches = CompletionLatches::default();
        latches.set_arm_done();
        assert_eq!(
            latches.current(),
            LatchSnapshot {
                arm_done: true,
                hand_done: false
            }
        );

        latches.set_hand_done();
        latches.latch_and_clear();
        assert_eq!(latches.current(), LatchSnapshot::default());
        assert!(latches.latched().arm_done && latches.latched().hand_done);

        latches.set_hand_done();
        latches.clear();
        assert_eq!(latches.current(), LatchSnapshot::default());
        assert!(latches.latched().arm_done);
    }
}
