//! # 引擎配置文件
//!
//! 引擎运行参数的 TOML 表示。缺省字段使用默认值，因此空文件也是合法配置。
//!
//! ```toml
//! [engine]
//! name = "affprim"
//! part = "left_arm"
//! period_ms = 50
//! default_exec_time_s = 2.0
//! reach_tol_m = 0.005
//! hand_tol_deg = 1.0
//! tracking_mode = false
//! # sync_timeout_ms = 10000
//!
//! [[aux_dof]]
//! name = "torso_pitch"
//! index = 0
//! min = -10.0
//! max = 30.0
//!
//! [hand]
//! joint_count = 9
//! digits = [[1, 2, 3], [4, 5], [6, 7], [8], [8]]
//! ```

use affprim_protocol::{DigitJoints, HandLayout};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 引擎配置文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// 引擎参数
    pub engine: EngineSection,

    /// 运动期间启用的辅助自由度（如躯干关节）
    pub aux_dof: Vec<AuxDofSettings>,

    /// 手部关节布局
    pub hand: HandSettings,
}

impl EngineSettings {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("failed to parse TOML")?;
        settings.hand.to_layout()?;
        Ok(settings)
    }

    /// 序列化为 TOML（用于生成配置模板）
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }
}

/// `[engine]` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// 日志中使用的名称
    pub name: String,

    /// 被控制的手臂
    pub part: String,

    /// 控制周期（毫秒）
    pub period_ms: u64,

    /// 手臂运动默认执行时间（秒）
    pub default_exec_time_s: f64,

    /// 到达容差（米）
    pub reach_tol_m: f64,

    /// 手部关节收敛容差（度）
    pub hand_tol_deg: f64,

    /// 到达后保持笛卡尔位姿
    pub tracking_mode: bool,

    /// 阻塞同步查询的超时（毫秒）；缺省为无限等待
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_timeout_ms: Option<u64>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            name: "affprim".to_string(),
            part: "left_arm".to_string(),
            period_ms: 50,
            default_exec_time_s: 2.0,
            reach_tol_m: 0.005,
            hand_tol_deg: 1.0,
            tracking_mode: false,
            sync_timeout_ms: None,
        }
    }
}

/// `[[aux_dof]]` 条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxDofSettings {
    /// 名称（如 `torso_pitch`）
    pub name: String,

    /// 控制链中的自由度索引
    pub index: usize,

    /// 下限（度）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// 上限（度）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// `[hand]` 段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandSettings {
    /// 手部关节数
    pub joint_count: usize,

    /// 每个手指驱动的关节
    pub digits: Vec<Vec<usize>>,
}

impl HandSettings {
    /// 转换为经过校验的 [`HandLayout`]
    pub fn to_layout(&self) -> Result<HandLayout> {
        let digits = self
            .digits
            .iter()
            .map(|joints| joints.iter().copied().collect::<DigitJoints>())
            .collect();
        HandLayout::new(self.joint_count, digits).context("invalid [hand] section")
    }
}

impl Default for HandSettings {
    fn default() -> Self {
        let layout = HandLayout::default();
        Self {
            joint_count: layout.joint_count(),
            digits: (0..layout.digit_count())
                .map(|d| layout.digit_joints(d).to_vec())
                .collect(),
        }
    }
}
