//! 手部路点与手部关节布局
//!
//! 手部序列由若干路点（way-point）组成，每个路点给出：
//! - N 个手指关节的目标位置（度）
//! - N 个关节速度（度/秒）
//! - M 个手指（digit）的接触检测阈值
//!
//! [`HandLayout`] 描述 N、M 以及"手指 → 关节"的映射，用于校验路点维度，
//! 并在接触检测触发时决定停止哪些关节。

use crate::ProtocolError;
use smallvec::{SmallVec, smallvec};

/// 单个手指驱动的关节列表（通常 1~3 个）
pub type DigitJoints = SmallVec<[usize; 4]>;

/// 手部路点
///
/// 构造后不可变；由手部序列库持有。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandWayPoint {
    tag: String,
    positions: Vec<f64>,
    velocities: Vec<f64>,
    thresholds: Vec<f64>,
}

impl HandWayPoint {
    /// 创建路点
    ///
    /// 维度校验由 [`HandLayout::check_way_point`] 完成。
    pub fn new(
        tag: impl Into<String>,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        thresholds: Vec<f64>,
    ) -> Self {
        Self {
            tag: tag.into(),
            positions,
            velocities,
            thresholds,
        }
    }

    /// 所属序列的标签（匿名路点为空字符串）
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 关节目标位置（度）
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// 关节速度（度/秒）
    pub fn velocities(&self) -> &[f64] {
        &self.velocities
    }

    /// 每个手指的接触阈值
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

/// 手部关节布局
///
/// 关节索引是手部本地索引（`0..joint_count`），与关节控制器的接口一致。
#[derive(Debug, Clone, PartialEq)]
pub struct HandLayout {
    joint_count: usize,
    digits: Vec<DigitJoints>,
}

impl HandLayout {
    /// 创建布局并校验映射
    pub fn new(joint_count: usize, digits: Vec<DigitJoints>) -> Result<Self, ProtocolError> {
        let layout = Self {
            joint_count,
            digits,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// 关节数 N
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// 手指数 M
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    /// 指定手指驱动的关节（越界返回空切片）
    pub fn digit_joints(&self, digit: usize) -> &[usize] {
        self.digits.get(digit).map(|j| j.as_slice()).unwrap_or(&[])
    }

    /// 校验布局本身
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.joint_count == 0 {
            return Err(ProtocolError::InvalidLayout(
                "hand joint count must be > 0".to_string(),
            ));
        }
        if self.digits.is_empty() {
            return Err(ProtocolError::InvalidLayout(
                "hand layout needs at least one digit".to_string(),
            ));
        }
        for (digit, joints) in self.digits.iter().enumerate() {
            if let Some(&j) = joints.iter().find(|&&j| j >= self.joint_count) {
                return Err(ProtocolError::InvalidLayout(format!(
                    "digit {} maps to joint {} (joint count {})",
                    digit, j, self.joint_count
                )));
            }
        }
        Ok(())
    }

    /// 校验路点维度是否与布局匹配
    pub fn check_way_point(&self, wp: &HandWayPoint) -> Result<(), ProtocolError> {
        check_len("positions", self.joint_count, wp.positions.len())?;
        check_len("velocities", self.joint_count, wp.velocities.len())?;
        check_len("thresholds", self.digit_count(), wp.thresholds.len())?;
        Ok(())
    }
}

impl Default for HandLayout {
    /// 9 个手部关节、5 个手指的默认布局
    ///
    /// | 手指 | 关节 |
    /// |---|---|
    /// | 拇指 | 1, 2, 3 |
    /// | 食指 | 4, 5 |
    /// | 中指 | 6, 7 |
    /// | 无名指 | 8 |
    /// | 小指 | 8 |
    ///
    /// 关节 0（手指外展）不归属任何手指。
    fn default() -> Self {
        Self {
            joint_count: 9,
            digits: vec![
                smallvec![1, 2, 3],
                smallvec![4, 5],
                smallvec![6, 7],
                smallvec![8],
                smallvec![8],
            ],
        }
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), ProtocolError> {
    if expected != actual {
        return Err(ProtocolError::DimensionMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
