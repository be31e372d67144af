//! 动作（Action）定义
//!
//! 一个动作是对执行器的一次"请求"，由三个正交的 facet 组成：
//!
//! - **wait**: 等待指定时长（与其他 facet 互斥）
//! - **arm**: 任务空间到达目标位姿
//! - **hand**: 按标签执行手部序列
//!
//! arm 与 hand 可以同时出现，此时两者在同一周期启动、并行执行。
//!
//! # 示例
//!
//! ```rust
//! use affprim_protocol::{Action, ArmTarget, AxisAngle, Facet, Position3D};
//! use std::time::Duration;
//!
//! let reach = ArmTarget::new(Position3D::new(-0.3, 0.0, 0.1), AxisAngle::IDENTITY);
//! let grasp = Action::motion(Some(reach), Some("close_hand".into())).unwrap();
//! assert!(grasp.has_facet(Facet::Arm) && grasp.has_facet(Facet::Hand));
//!
//! let pause = Action::wait(Duration::from_millis(500));
//! assert!(pause.has_facet(Facet::Wait));
//!
//! assert!(Action::motion(None, None).is_err());
//! ```

use crate::ProtocolError;
use crate::pose::{AxisAngle, Position3D};
use std::fmt;
use std::time::Duration;

/// 动作的组成部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    /// 等待
    Wait,
    /// 手臂（任务空间）
    Arm,
    /// 手部（关节空间）
    Hand,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Wait => write!(f, "wait"),
            Facet::Arm => write!(f, "arm"),
            Facet::Hand => write!(f, "hand"),
        }
    }
}

/// 接触保护
///
/// 到达过程中锁定手臂的某个关节，并监控其底层输出信号；
/// 信号绝对值超过阈值即视为接触，立即停止到达运动。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactGuard {
    /// 被锁定并监控的手臂关节
    pub joint: usize,
    /// 输出信号阈值
    pub threshold: f64,
}

impl ContactGuard {
    /// 创建接触保护
    pub const fn new(joint: usize, threshold: f64) -> Self {
        Self { joint, threshold }
    }

    /// 信号是否越过阈值
    pub fn is_triggered(&self, signal: f64) -> bool {
        signal.abs() > self.threshold
    }
}

/// arm facet：任务空间目标
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmTarget {
    /// 目标位置（米）
    pub position: Position3D,
    /// 目标姿态（轴角）
    pub orientation: AxisAngle,
    /// 执行时间；`None` 表示使用配置的默认值
    pub exec_time: Option<Duration>,
    /// 可选的接触保护
    pub guard: Option<ContactGuard>,
}

impl ArmTarget {
    /// 使用默认执行时间的目标
    pub fn new(position: Position3D, orientation: AxisAngle) -> Self {
        Self {
            position,
            orientation,
            exec_time: None,
            guard: None,
        }
    }

    /// 指定执行时间
    pub fn with_exec_time(mut self, exec_time: Duration) -> Self {
        self.exec_time = Some(exec_time);
        self
    }

    /// 附加接触保护
    pub fn with_guard(mut self, guard: ContactGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// 校验目标数值
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.position.is_finite() || !self.orientation.is_finite() {
            return Err(ProtocolError::InvalidAction(format!(
                "non-finite arm target {} / {}",
                self.position, self.orientation
            )));
        }
        if let Some(t) = self.exec_time
            && t.is_zero()
        {
            return Err(ProtocolError::InvalidAction(
                "arm execution time must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 队列中的动作
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// 等待状态
    Wait {
        /// 等待时长
        timeout: Duration,
    },
    /// 运动（arm 和/或 hand）
    Motion {
        /// arm facet
        arm: Option<ArmTarget>,
        /// hand facet（序列标签）
        hand: Option<String>,
    },
}

impl Action {
    /// 等待动作
    pub fn wait(timeout: Duration) -> Self {
        Action::Wait { timeout }
    }

    /// 运动动作；arm 与 hand 均为空时返回错误
    pub fn motion(arm: Option<ArmTarget>, hand: Option<String>) -> Result<Self, ProtocolError> {
        let action = Action::Motion { arm, hand };
        action.validate()?;
        Ok(action)
    }

    /// 仅手臂到达
    pub fn reach(target: ArmTarget) -> Self {
        Action::Motion {
            arm: Some(target),
            hand: None,
        }
    }

    /// 仅手部序列
    pub fn hand(tag: impl Into<String>) -> Self {
        Action::Motion {
            arm: None,
            hand: Some(tag.into()),
        }
    }

    /// 是否包含指定 facet
    pub fn has_facet(&self, facet: Facet) -> bool {
        match (self, facet) {
            (Action::Wait { .. }, Facet::Wait) => true,
            (Action::Motion { arm, .. }, Facet::Arm) => arm.is_some(),
            (Action::Motion { hand, .. }, Facet::Hand) => hand.is_some(),
            _ => false,
        }
    }

    /// arm facet
    pub fn arm(&self) -> Option<&ArmTarget> {
        match self {
            Action::Motion { arm, .. } => arm.as_ref(),
            Action::Wait { .. } => None,
        }
    }

    /// hand facet 的序列标签
    pub fn hand_tag(&self) -> Option<&str> {
        match self {
            Action::Motion { hand, .. } => hand.as_deref(),
            Action::Wait { .. } => None,
        }
    }

    /// 校验动作
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Action::Wait { .. } => Ok(()),
            Action::Motion {
                arm: None,
                hand: None,
            } => Err(ProtocolError::InvalidAction(
                "action carries neither arm nor hand facet".to_string(),
            )),
            Action::Motion { arm, hand } => {
                if let Some(target) = arm {
                    target.validate()?;
                }
                if let Some(tag) = hand
                    && tag.is_empty()
                {
                    return Err(ProtocolError::InvalidAction(
                        "empty hand sequence tag".to_string(),
                    ));
                }
                Ok(())
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Wait { timeout } => write!(f, "wait({:?})", timeout),
            Action::Motion { arm, hand } => {
                write!(f, "motion(")?;
                if let Some(t) = arm {
                    write!(f, "arm -> {}", t.position)?;
                }
                if let Some(tag) = hand {
                    if arm.is_some() {
                        write!(f, ", ")?;
                    }
                    write!(f, "hand \"{}\"", tag)?;
                }
                write!(f, ")")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ArmTarget {
        ArmTarget::new(Position3D::new(0.3, 0.0, 0.2), AxisAngle::new(0.0, 0.0, 1.0, 0.0))
    }

    #[test]
    fn test_facets() {
        let a = Action::reach(target());
        assert!(a.has_facet(Facet::Arm));
        assert!(!a.has_facet(Facet::Hand));
        assert!(!a.has_facet(Facet::Wait));

        let h = Action::hand("open_hand");
        assert_eq!(h.hand_tag(), Some("open_hand"));
        assert!(h.arm().is_none());

        let w = Action::wait(Duration::from_secs(1));
        assert!(w.has_facet(Facet::Wait));
        assert!(w.arm().is_none() && w.hand_tag().is_none());
    }

    #[test]
    fn test_empty_motion_rejected() {
        let err = Action::motion(None, None).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAction(_)));
    }

    #[test]
    fn test_invalid_targets_rejected() {
        let nan = ArmTarget::new(Position3D::new(f64::NAN, 0.0, 0.0), AxisAngle::IDENTITY);
        assert!(Action::motion(Some(nan), None).is_err());

        let zero_time = target().with_exec_time(Duration::ZERO);
        assert!(Action::motion(Some(zero_time), None).is_err());

        assert!(Action::motion(None, Some(String::new())).is_err());
    }

    #[test]
    fn test_contact_guard_threshold() {
        let g = ContactGuard::new(4, 200.0);
        assert!(!g.is_triggered(150.0));
        assert!(g.is_triggered(-250.0));
        assert!(!g.is_triggered(200.0));
    }

    #[test]
    fn test_display() {
        let a = Action::motion(Some(target()), Some("close_hand".into())).unwrap();
        let s = format!("{}", a);
        assert!(s.contains("arm"));
        assert!(s.contains("close_hand"));
        assert_eq!(format!("{}", Facet::Hand), "hand");
    }
}
