//! 任务空间位姿类型
//!
//! 提供末端执行器目标的位置与姿态表示。
//!
//! # 约定
//!
//! - **位置**: 米（m），三维笛卡尔坐标
//! - **姿态**: 轴角表示（axis-angle），轴为单位向量，角度为弧度
//!
//! # 示例
//!
//! ```rust
//! use affprim_protocol::{AxisAngle, Position3D};
//!
//! let target = Position3D::new(-0.3, 0.0, 0.1);
//! let approach = target + Position3D::new(0.0, 0.0, 0.05);
//! let palm_down = AxisAngle::new(0.0, 0.0, 1.0, std::f64::consts::PI);
//!
//! assert!((approach.z - 0.15).abs() < 1e-12);
//! assert_eq!(palm_down.to_array()[3], std::f64::consts::PI);
//! ```

use std::fmt;
use std::ops::{Add, Neg, Sub};

/// 轴向量归一化阈值（避免除零）
const AXIS_NORM_THRESHOLD: f64 = 1e-10;

/// 三维位置向量（米）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position3D {
    /// X 坐标（米）
    pub x: f64,
    /// Y 坐标（米）
    pub y: f64,
    /// Z 坐标（米）
    pub z: f64,
}

impl Position3D {
    /// 创建新的三维位置
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position3D { x, y, z }
    }

    /// 零向量
    pub const ZERO: Self = Position3D::new(0.0, 0.0, 0.0);

    /// 计算向量长度（范数）
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// 到另一点的欧氏距离
    pub fn distance(&self, other: &Position3D) -> f64 {
        (*self - *other).norm()
    }

    /// 转换为数组 `[x, y, z]`
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// 所有分量是否为有限值
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Position3D {
    fn from(v: [f64; 3]) -> Self {
        Position3D::new(v[0], v[1], v[2])
    }
}

impl Add for Position3D {
    type Output = Position3D;

    fn add(self, rhs: Position3D) -> Position3D {
        Position3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Position3D {
    type Output = Position3D;

    fn sub(self, rhs: Position3D) -> Position3D {
        Position3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Position3D {
    type Output = Position3D;

    fn neg(self) -> Position3D {
        Position3D::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for Position3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// 轴角姿态（4 个分量：轴 x/y/z + 角度）
///
/// 与位姿控制服务的接口保持一致：轴为单位向量，角度为弧度。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisAngle {
    /// 旋转轴 X 分量
    pub x: f64,
    /// 旋转轴 Y 分量
    pub y: f64,
    /// 旋转轴 Z 分量
    pub z: f64,
    /// 旋转角（弧度）
    pub angle: f64,
}

impl AxisAngle {
    /// 无旋转
    pub const IDENTITY: Self = AxisAngle {
        x: 0.0,
        y: 0.0,
        z: 1.0,
        angle: 0.0,
    };

    /// 创建轴角姿态（轴会被归一化）
    ///
    /// 轴长度接近 0 时返回 [`AxisAngle::IDENTITY`]。
    pub fn new(x: f64, y: f64, z: f64, angle: f64) -> Self {
        let n = (x * x + y * y + z * z).sqrt();
        if n < AXIS_NORM_THRESHOLD {
            return Self::IDENTITY;
        }
        AxisAngle {
            x: x / n,
            y: y / n,
            z: z / n,
            angle,
        }
    }

    /// 转换为数组 `[x, y, z, angle]`
    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.angle]
    }

    /// 所有分量是否为有限值
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.angle.is_finite()
    }
}

impl Default for AxisAngle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 4]> for AxisAngle {
    fn from(v: [f64; 4]) -> Self {
        AxisAngle::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Display for AxisAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "axis=({:.3}, {:.3}, {:.3}) angle={:.3}",
            self.x, self.y, self.z, self.angle
        )
    }
}
