//! 手势组合器
//!
//! 把手臂到达和手部序列组合成抓取、触碰、轻敲三种手势。
//! 组合在调用线程上完成，不经过执行器：先检查所有手部序列，
//! 再把整个手势一次性压入队列，队列中不会出现半个手势。
//!
//! | 手势 | 压入的动作 |
//! |------|-----------|
//! | `grasp(x, o, d)` | (x+d, o, 张开) → (x, o) → (握紧) |
//! | `touch(x, o, d)` | (x+d, o, 张开) → (x, o) |
//! | `tap(x1, o1, x2, o2, t)` | (x1, o1, 掌刀) → (x2, o2, 用时 t) → (x1, o1) |
//!
//! 使用 [`ApproachStrategy::ContactGuarded`] 时，抓取和触碰中的接近段 (x, o)
//! 带有接触保护：被保护的关节保持不动，其输出信号越过阈值时到达立即停止。

use crate::error::GestureError;
use crate::sink::PrimitiveSink;
use affprim_protocol::{Action, ArmTarget, AxisAngle, ContactGuard, Position3D};
use std::time::Duration;
use tracing::debug;

/// 接近策略
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ApproachStrategy {
    /// 普通到达：到位后结束
    #[default]
    Plain,
    /// 碰到即停
    ContactGuarded(ContactGuard),
}

/// 手势使用的手部序列标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureKeys {
    /// 张开
    pub open: String,
    /// 握紧
    pub close: String,
    /// 掌刀（轻敲）
    pub karate: String,
}

impl Default for GestureKeys {
    fn default() -> Self {
        Self {
            open: "open_hand".to_string(),
            close: "close_hand".to_string(),
            karate: "karate_hand".to_string(),
        }
    }
}

/// 手势组合器
///
/// # Example
///
/// ```rust
/// use affprim_client::EngineBuilder;
/// use affprim_control::GestureCombinator;
/// use affprim_driver::{Completion, SimJointController, SimPoseController};
/// use affprim_protocol::{AxisAngle, Position3D};
/// use affprim_tools::default_hand_sequences;
/// use std::sync::Arc;
///
/// let engine = EngineBuilder::new()
///     .pose_controller(Arc::new(SimPoseController::new(Completion::Instant)))
///     .joint_controller(Arc::new(SimJointController::new(9, Completion::Instant)))
///     .hand_sequences(default_hand_sequences())
///     .manual_stepping()
///     .build()
///     .unwrap();
///
/// let gestures = GestureCombinator::new(&engine);
/// let ids = gestures
///     .grasp(
///         Position3D::new(-0.3, 0.1, 0.0),
///         AxisAngle::IDENTITY,
///         Position3D::new(0.0, 0.0, 0.05),
///     )
///     .unwrap();
/// assert_eq!(ids.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct GestureCombinator<S> {
    sink: S,
    keys: GestureKeys,
    strategy: ApproachStrategy,
}

impl<S: PrimitiveSink> GestureCombinator<S> {
    /// 使用默认序列标签和普通接近策略
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            keys: GestureKeys::default(),
            strategy: ApproachStrategy::Plain,
        }
    }

    /// 设置序列标签
    pub fn with_keys(mut self, keys: GestureKeys) -> Self {
        self.keys = keys;
        self
    }

    /// 设置接近策略
    pub fn with_strategy(mut self, strategy: ApproachStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// 当前接近策略
    pub fn strategy(&self) -> ApproachStrategy {
        self.strategy
    }

    /// 序列标签
    pub fn keys(&self) -> &GestureKeys {
        &self.keys
    }

    /// 底层接收端
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 抓取：张开手从 `x + d` 接近 `x`，然后握紧
    pub fn grasp(
        &self,
        x: Position3D,
        o: AxisAngle,
        d: Position3D,
    ) -> Result<Vec<u64>, GestureError> {
        self.require("grasp", &[&self.keys.open, &self.keys.close])?;
        let mut actions = self.approach(x, o, d)?;
        actions.push(Action::hand(self.keys.close.clone()));
        self.submit("grasp", actions)
    }

    /// 触碰：张开手从 `x + d` 接近 `x`
    pub fn touch(
        &self,
        x: Position3D,
        o: AxisAngle,
        d: Position3D,
    ) -> Result<Vec<u64>, GestureError> {
        self.require("touch", &[&self.keys.open])?;
        let actions = self.approach(x, o, d)?;
        self.submit("touch", actions)
    }

    /// 轻敲：掌刀姿态到 `x1`，用 `exec_time` 敲到 `x2`，再回到 `x1`
    pub fn tap(
        &self,
        x1: Position3D,
        o1: AxisAngle,
        x2: Position3D,
        o2: AxisAngle,
        exec_time: Duration,
    ) -> Result<Vec<u64>, GestureError> {
        self.require("tap", &[&self.keys.karate])?;
        let actions = vec![
            Action::motion(
                Some(ArmTarget::new(x1, o1)),
                Some(self.keys.karate.clone()),
            )
            .map_err(affprim_client::EngineError::from)?,
            Action::reach(ArmTarget::new(x2, o2).with_exec_time(exec_time)),
            Action::reach(ArmTarget::new(x1, o1)),
        ];
        self.submit("tap", actions)
    }

    /// 预备段 (x+d, o, 张开) 与接近段 (x, o)
    fn approach(
        &self,
        x: Position3D,
        o: AxisAngle,
        d: Position3D,
    ) -> Result<Vec<Action>, GestureError> {
        let pre = Action::motion(
            Some(ArmTarget::new(x + d, o)),
            Some(self.keys.open.clone()),
        )
        .map_err(affprim_client::EngineError::from)?;

        let target = match self.strategy {
            ApproachStrategy::Plain => ArmTarget::new(x, o),
            ApproachStrategy::ContactGuarded(guard) => {
                if !self.sink.supports_contact_guard() {
                    return Err(GestureError::GuardUnsupported);
                }
                ArmTarget::new(x, o).with_guard(guard)
            },
        };
        Ok(vec![pre, Action::reach(target)])
    }

    fn require(&self, gesture: &'static str, keys: &[&String]) -> Result<(), GestureError> {
        for key in keys {
            if !self.sink.is_valid_hand_seq(key) {
                return Err(GestureError::MissingHandSequence {
                    gesture,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn submit(&self, gesture: &str, actions: Vec<Action>) -> Result<Vec<u64>, GestureError> {
        let ids = self.sink.push_batch(actions)?;
        debug!("Gesture {} queued as {:?}", gesture, ids);
        Ok(ids)
    }
}
