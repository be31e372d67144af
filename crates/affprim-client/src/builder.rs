//! Builder 模式实现
//!
//! 提供链式构造 [`ActionEngine`] 的便捷方式。

use crate::adapter::{ArmMotion, HandMotion};
use crate::config::EngineConfig;
use crate::engine::{ActionEngine, Runner};
use crate::error::{EngineError, Result};
use crate::executor::{Executor, Shared};
use crate::library::HandSeqLibrary;
use crate::loop_runner::{self, LoopConfig};
use affprim_driver::{
    ContactMonitor, ContactSource, JointController, MonitorConfig, OutputSource, PoseController,
};
use affprim_tools::HandSequenceDef;
use std::sync::Arc;
use tracing::info;

/// ActionEngine Builder（链式构造）
///
/// 位姿服务和关节服务是必需的；接触数据流和输出信号源是可选的：
///
/// - 没有接触数据流时，手部路点只在关节收敛时结束
/// - 没有输出信号源时，带 [`ContactGuard`](affprim_protocol::ContactGuard) 的动作在压入时被拒绝
///
/// # Example
///
/// ```rust
/// use affprim_client::{EngineBuilder, EngineConfig};
/// use affprim_driver::{Completion, SimJointController, SimPoseController};
/// use affprim_tools::default_hand_sequences;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let engine = EngineBuilder::new()
///     .pose_controller(Arc::new(SimPoseController::new(Completion::Instant)))
///     .joint_controller(Arc::new(SimJointController::new(9, Completion::Instant)))
///     .hand_sequences(default_hand_sequences())
///     .config(EngineConfig {
///         period: Duration::from_millis(10),
///         ..Default::default()
///     })
///     .build()
///     .unwrap();
///
/// assert!(engine.is_valid_hand_seq("close_hand"));
/// ```
pub struct EngineBuilder {
    pose: Option<Arc<dyn PoseController>>,
    joints: Option<Arc<dyn JointController>>,
    contact: Option<Arc<dyn ContactSource>>,
    output: Option<Arc<dyn OutputSource>>,
    config: EngineConfig,
    sequences: Vec<HandSequenceDef>,
    /// 不启动执行器线程，由调用方 `step()` 驱动
    manual: bool,
}

impl EngineBuilder {
    /// 创建新的 Builder
    pub fn new() -> Self {
        Self {
            pose: None,
            joints: None,
            contact: None,
            output: None,
            config: EngineConfig::default(),
            sequences: Vec::new(),
            manual: false,
        }
    }

    /// 设置任务空间位姿服务（必需）
    pub fn pose_controller(mut self, pose: Arc<dyn PoseController>) -> Self {
        self.pose = Some(pose);
        self
    }

    /// 设置手部关节服务（必需）
    pub fn joint_controller(mut self, joints: Arc<dyn JointController>) -> Self {
        self.joints = Some(joints);
        self
    }

    /// 设置手指接触数据流（可选）
    pub fn contact_source(mut self, contact: Arc<dyn ContactSource>) -> Self {
        self.contact = Some(contact);
        self
    }

    /// 设置手臂关节输出信号源（可选，启用接触保护）
    pub fn output_source(mut self, output: Arc<dyn OutputSource>) -> Self {
        self.output = Some(output);
        self
    }

    /// 设置引擎配置（可选，默认 [`EngineConfig::default`]）
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 预加载手部序列
    pub fn hand_sequences(mut self, sequences: Vec<HandSequenceDef>) -> Self {
        self.sequences = sequences;
        self
    }

    /// 手动步进模式（测试和仿真用）
    pub fn manual_stepping(mut self) -> Self {
        self.manual = true;
        self
    }

    /// 构建引擎
    ///
    /// 校验配置、加载手部序列、启动接触监控和执行器线程。
    /// 任何一步失败都返回 [`EngineError::Configuration`]，不会留下后台线程。
    pub fn build(self) -> Result<ActionEngine> {
        self.config.validate()?;
        let pose = self
            .pose
            .ok_or_else(|| EngineError::Configuration("pose controller is required".to_string()))?;
        let joints = self.joints.ok_or_else(|| {
            EngineError::Configuration("joint controller is required".to_string())
        })?;

        let layout = self.config.hand_layout.clone();
        if let Some(n) = joints.joint_count()
            && n != layout.joint_count()
        {
            return Err(EngineError::Configuration(format!(
                "joint controller drives {} joints, hand layout has {}",
                n,
                layout.joint_count()
            )));
        }

        let library = Arc::new(HandSeqLibrary::new(layout));
        library
            .load(&self.sequences)
            .map_err(|e| EngineError::Configuration(format!("hand sequences: {}", e)))?;

        pose.set_tracking_mode(self.config.tracking_mode)
            .map_err(|e| EngineError::Configuration(format!("tracking mode: {}", e)))?;

        let monitor = self.output.map(|output| {
            ContactMonitor::start(
                output,
                pose.clone(),
                MonitorConfig {
                    poll_interval: self.config.monitor_period,
                },
            )
        });
        let guard_supported = monitor.is_some();

        let arm = ArmMotion::new(
            pose.clone(),
            monitor,
            self.config.aux_dofs.clone(),
            self.config.reach_tolerance,
        );
        let hand = HandMotion::new(
            joints.clone(),
            self.contact,
            library.clone(),
            self.config.hand_tolerance_deg,
        );

        let shared = Arc::new(Shared::new(self.config.tracking_mode));
        let executor = Executor::new(shared.clone(), arm, hand, self.config.default_exec_time);

        let runner = if self.manual {
            Runner::Manual(Box::new(executor))
        } else {
            Runner::Thread(loop_runner::spawn(
                executor,
                LoopConfig {
                    period: self.config.period,
                    thread_name: format!("affprim-{}", self.config.part),
                },
            )?)
        };

        info!(
            "Action engine \"{}\" ready on {} ({} hand sequences, period {:?}{})",
            self.config.name,
            self.config.part,
            library.len(),
            self.config.period,
            if self.manual { ", manual stepping" } else { "" }
        );

        Ok(ActionEngine::new(
            shared,
            library,
            pose,
            joints,
            self.config,
            guard_supported,
            runner,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
