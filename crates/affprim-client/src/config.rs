//! 引擎配置
//!
//! 构造时一次性校验的不可变配置。所有字段都有文档化的默认值，
//! 也可以从 `affprim-tools` 的配置文件转换而来。
//!
//! ```rust
//! use affprim_client::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig {
//!     period: Duration::from_millis(20),
//!     tracking_mode: true,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{EngineError, Result};
use affprim_protocol::HandLayout;
use affprim_tools::EngineSettings;
use std::cmp::Ordering;
use std::time::Duration;

/// 运动期间启用的辅助自由度
#[derive(Debug, Clone, PartialEq)]
pub struct AuxDof {
    /// 名称（仅用于日志）
    pub name: String,
    /// 控制链中的自由度索引
    pub index: usize,
    /// 限位 `(min, max)`，单位度
    pub limits: Option<(f64, f64)>,
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// 日志中使用的名称
    pub name: String,

    /// 被控制的手臂（如 `left_arm`）
    pub part: String,

    /// 控制周期
    ///
    /// 默认 50ms。
    pub period: Duration,

    /// 手臂运动的默认执行时间
    ///
    /// 默认 2s；动作未指定执行时间时使用。
    pub default_exec_time: Duration,

    /// 到达容差（米）
    ///
    /// 默认 5mm。
    pub reach_tolerance: f64,

    /// 手部关节收敛容差（度）
    ///
    /// 默认 1 度。
    pub hand_tolerance_deg: f64,

    /// 跟踪模式：到达后保持笛卡尔位姿
    pub tracking_mode: bool,

    /// 运动期间启用的辅助自由度
    pub aux_dofs: Vec<AuxDof>,

    /// 手部关节布局
    pub hand_layout: HandLayout,

    /// 阻塞同步查询的超时；`None` 表示无限等待
    pub sync_timeout: Option<Duration>,

    /// 接触监控线程的轮询间隔
    ///
    /// 默认 5ms。
    pub monitor_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: "affprim".to_string(),
            part: "left_arm".to_string(),
            period: Duration::from_millis(50),
            default_exec_time: Duration::from_secs(2),
            reach_tolerance: 0.005,
            hand_tolerance_deg: 1.0,
            tracking_mode: false,
            aux_dofs: Vec::new(),
            hand_layout: HandLayout::default(),
            sync_timeout: None,
            monitor_period: Duration::from_millis(5),
        }
    }
}

impl EngineConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(EngineError::Configuration("period must be > 0".to_string()));
        }
        if self.default_exec_time.is_zero() {
            return Err(EngineError::Configuration(
                "default_exec_time must be > 0".to_string(),
            ));
        }
        if !(self.reach_tolerance.is_finite() && self.reach_tolerance > 0.0) {
            return Err(EngineError::Configuration(format!(
                "invalid reach_tolerance: {} (must be > 0)",
                self.reach_tolerance
            )));
        }
        if !(self.hand_tolerance_deg.is_finite() && self.hand_tolerance_deg >= 0.0) {
            return Err(EngineError::Configuration(format!(
                "invalid hand_tolerance_deg: {} (must be >= 0)",
                self.hand_tolerance_deg
            )));
        }
        if self.monitor_period.is_zero() {
            return Err(EngineError::Configuration(
                "monitor_period must be > 0".to_string(),
            ));
        }
        for dof in &self.aux_dofs {
            if let Some((min, max)) = dof.limits
                && matches!(min.partial_cmp(&max), None | Some(Ordering::Greater))
            {
                return Err(EngineError::Configuration(format!(
                    "aux dof {} has min {} > max {}",
                    dof.name, min, max
                )));
            }
        }
        self.hand_layout.validate()?;
        Ok(())
    }

    /// 从配置文件转换
    ///
    /// 辅助自由度的限位必须同时给出 `min` 和 `max`，或都不给出。
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        let engine = &settings.engine;
        let aux_dofs = settings
            .aux_dof
            .iter()
            .map(|dof| {
                let limits = match (dof.min, dof.max) {
                    (Some(min), Some(max)) => Some((min, max)),
                    (None, None) => None,
                    _ => {
                        return Err(EngineError::Configuration(format!(
                            "aux dof {} needs both min and max limits",
                            dof.name
                        )));
                    },
                };
                Ok(AuxDof {
                    name: dof.name.clone(),
                    index: dof.index,
                    limits,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let default_exec_time = Duration::try_from_secs_f64(engine.default_exec_time_s)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "invalid default_exec_time_s: {}",
                    engine.default_exec_time_s
                ))
            })?;

        let hand_layout = settings
            .hand
            .to_layout()
            .map_err(|e| EngineError::Configuration(format!("{:#}", e)))?;

        let config = EngineConfig {
            name: engine.name.clone(),
            part: engine.part.clone(),
            period: Duration::from_millis(engine.period_ms),
            default_exec_time,
            reach_tolerance: engine.reach_tol_m,
            hand_tolerance_deg: engine.hand_tol_deg,
            tracking_mode: engine.tracking_mode,
            aux_dofs,
            hand_layout,
            sync_timeout: engine.sync_timeout_ms.map(Duration::from_millis),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}
