//! # affprim Protocol
//!
//! 动作原语的数据模型（无硬件依赖、无线程）
//!
//! ## 模块
//!
//! - `pose`: 任务空间位置与轴角姿态
//! - `waypoint`: 手部路点与手部关节布局
//! - `action`: 队列动作及其 facet
//!
//! ## 单位
//!
//! - 位置：米
//! - 姿态：轴角，弧度
//! - 手部关节：度、度/秒

pub mod action;
pub mod pose;
pub mod waypoint;

// 重新导出常用类型
pub use action::{Action, ArmTarget, ContactGuard, Facet};
pub use pose::{AxisAngle, Position3D};
pub use waypoint::{DigitJoints, HandLayout, HandWayPoint};

use thiserror::Error;

/// 数据模型校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Dimension mismatch for {field}: expected {expected}, got {actual}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid hand layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::DimensionMismatch {
            field: "positions",
            expected: 9,
            actual: 7,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("positions"));
        assert!(msg.contains('9') && msg.contains('7'));

        let err = ProtocolError::InvalidAction("empty".to_string());
        assert_eq!(format!("{}", err), "Invalid action: empty");
    }
}
