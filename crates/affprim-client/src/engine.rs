//! ActionEngine - 客户端接口
//!
//! 所有方法都可以在任意线程上并发调用：压入动作、修改跟踪目标、
//! 管理手部序列库、查询状态。除了阻塞同步查询外，没有方法会等待运动完成。
//!
//! # 示例
//!
//! ```rust
//! use affprim_client::{CheckOutcome, EngineBuilder};
//! use affprim_driver::{Completion, SimJointController, SimPoseController};
//! use affprim_protocol::{AxisAngle, Position3D};
//! use std::sync::Arc;
//!
//! let engine = EngineBuilder::new()
//!     .pose_controller(Arc::new(SimPoseController::new(Completion::Instant)))
//!     .joint_controller(Arc::new(SimJointController::new(9, Completion::Instant)))
//!     .manual_stepping()
//!     .build()
//!     .unwrap();
//!
//! engine
//!     .push_reach(Position3D::new(-0.3, 0.0, 0.1), AxisAngle::IDENTITY)
//!     .unwrap();
//! assert_eq!(engine.check(false), CheckOutcome::Pending);
//!
//! engine.step().unwrap(); // 启动
//! engine.step().unwrap(); // 完成
//! assert!(engine.check_actions_done(false));
//! ```

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::executor::{EngineStatus, Executor, FaultRecord, Shared};
use crate::gate::CheckOutcome;
use crate::library::HandSeqLibrary;
use crate::loop_runner::LoopHandle;
use affprim_driver::{JointController, PoseController};
use affprim_protocol::{Action, ArmTarget, AxisAngle, Facet, Position3D};
use affprim_tools::HandSequenceDef;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 执行器的运行方式
pub(crate) enum Runner {
    /// 独立线程
    Thread(LoopHandle),
    /// 由调用方 `step()` 驱动
    Manual(Box<Executor>),
    /// 已关闭
    Closed,
}

/// 动作原语引擎
pub struct ActionEngine {
    shared: Arc<Shared>,
    library: Arc<HandSeqLibrary>,
    pose: Arc<dyn PoseController>,
    joints: Arc<dyn JointController>,
    config: EngineConfig,
    guard_supported: bool,
    runner: Mutex<Runner>,
}

impl ActionEngine {
    pub(crate) fn new(
        shared: Arc<Shared>,
        library: Arc<HandSeqLibrary>,
        pose: Arc<dyn PoseController>,
        joints: Arc<dyn JointController>,
        config: EngineConfig,
        guard_supported: bool,
        runner: Runner,
    ) -> Self {
        Self {
            shared,
            library,
            pose,
            joints,
            config,
            guard_supported,
            runner: Mutex::new(runner),
        }
    }

    /// 创建 Builder
    pub fn builder() -> crate::builder::EngineBuilder {
        crate::builder::EngineBuilder::new()
    }

    // ==================== 动作队列 ====================

    /// 压入一个动作，返回其队列 id
    ///
    /// 以下情况被拒绝且队列不变：
    /// - 动作本身无效（[`EngineError::InvalidAction`]）
    /// - 手部序列未注册（[`EngineError::UnknownSequence`]）
    /// - 带接触保护但引擎没有输出信号源（[`EngineError::InvalidAction`]）
    /// - 引擎已关闭（[`EngineError::QueueUnavailable`]）
    pub fn push(&self, action: Action) -> Result<u64> {
        self.validate_action(&action)?;
        let mut state = self.shared.state.lock();
        let id = state.queue.push(action)?;
        self.shared.gate.set_idle(false);
        debug!("Action #{} queued ({} pending)", id, state.queue.len());
        Ok(id)
    }

    /// 原子地压入一组动作（全部校验通过后连续插入）
    pub fn push_batch(&self, actions: Vec<Action>) -> Result<Vec<u64>> {
        for action in &actions {
            self.validate_action(action)?;
        }
        let mut state = self.shared.state.lock();
        if actions.is_empty() {
            return if state.queue.is_closed() {
                Err(EngineError::QueueUnavailable)
            } else {
                Ok(Vec::new())
            };
        }
        let ids = state.queue.push_batch(actions)?;
        self.shared.gate.set_idle(false);
        debug!("Actions {:?} queued ({} pending)", ids, state.queue.len());
        Ok(ids)
    }

    /// 压入手臂到达动作（默认执行时间）
    pub fn push_reach(&self, position: Position3D, orientation: AxisAngle) -> Result<u64> {
        self.push(Action::reach(ArmTarget::new(position, orientation)))
    }

    /// 压入手臂到达 + 手部序列的组合动作
    pub fn push_reach_with_hand(
        &self,
        position: Position3D,
        orientation: AxisAngle,
        hand_seq: &str,
    ) -> Result<u64> {
        self.push(Action::motion(
            Some(ArmTarget::new(position, orientation)),
            Some(hand_seq.to_string()),
        )?)
    }

    /// 压入手部序列动作
    pub fn push_hand(&self, hand_seq: &str) -> Result<u64> {
        self.push(Action::hand(hand_seq))
    }

    /// 压入等待动作
    pub fn push_wait(&self, timeout: Duration) -> Result<u64> {
        self.push(Action::wait(timeout))
    }

    /// 设置跟踪目标（不经过队列）
    ///
    /// 只保留最新的目标：正在执行手臂运动时在下一个周期直接重定向，
    /// 否则在执行器空闲且队列为空时作为仅手臂动作启动。
    pub fn reach(
        &self,
        position: Position3D,
        orientation: AxisAngle,
        exec_time: Option<Duration>,
    ) -> Result<()> {
        let target = ArmTarget {
            position,
            orientation,
            exec_time,
            guard: None,
        };
        target.validate()?;
        let mut state = self.shared.state.lock();
        if state.queue.is_closed() {
            return Err(EngineError::QueueUnavailable);
        }
        state.live_target = Some(target);
        self.shared.gate.set_idle(false);
        Ok(())
    }

    /// 清空队列并请求中止正在执行的动作，返回被丢弃的条目数
    ///
    /// 中止在执行器的下一个周期生效。
    pub fn clear_actions_queue(&self) -> usize {
        let mut state = self.shared.state.lock();
        let dropped = state.queue.clear();
        state.abort_requested = true;
        debug!("Action queue cleared ({} dropped)", dropped);
        dropped
    }

    /// 立即停止所有手臂和手部运动，并清空队列与跟踪目标
    pub fn stop_control(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            state.queue.clear();
            state.live_target = None;
            state.abort_requested = true;
        }
        self.pose
            .stop_task()
            .map_err(|e| EngineError::motion_fault(Facet::Arm, &e))?;
        let all: Vec<usize> = (0..self.library.layout().joint_count()).collect();
        self.joints
            .stop_joints(&all)
            .map_err(|e| EngineError::motion_fault(Facet::Hand, &e))?;
        info!("Control stopped");
        Ok(())
    }

    /// 是否能执行带接触保护的动作（构建时提供了输出信号源）
    pub fn supports_contact_guard(&self) -> bool {
        self.guard_supported
    }

    /// 队列长度（包括正在执行的队头）
    pub fn queue_len(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    fn validate_action(&self, action: &Action) -> Result<()> {
        action.validate()?;
        if let Some(target) = action.arm()
            && target.guard.is_some()
            && !self.guard_supported
        {
            return Err(EngineError::InvalidAction(
                "contact guard requires an output signal source".to_string(),
            ));
        }
        if let Some(tag) = action.hand_tag()
            && !self.library.is_valid(tag)
        {
            return Err(EngineError::UnknownSequence(tag.to_string()));
        }
        Ok(())
    }

    // ==================== 手部序列库 ====================

    /// 向手部序列追加路点（序列不存在时创建）
    pub fn add_hand_seq_wp(
        &self,
        tag: &str,
        positions: Vec<f64>,
        velocities: Vec<f64>,
        thresholds: Vec<f64>,
    ) -> Result<()> {
        self.library.add_way_point(tag, positions, velocities, thresholds)
    }

    /// 手部序列是否已注册
    pub fn is_valid_hand_seq(&self, tag: &str) -> bool {
        self.library.is_valid(tag)
    }

    /// 删除手部序列
    pub fn remove_hand_seq(&self, tag: &str) -> Result<()> {
        self.library.remove(tag)
    }

    /// 所有手部序列标签
    pub fn hand_seq_list(&self) -> Vec<String> {
        self.library.list_tags()
    }

    /// 批量加载手部序列，返回加载的路点数
    pub fn load_hand_sequences(&self, defs: &[HandSequenceDef]) -> Result<usize> {
        self.library.load(defs)
    }

    /// 手部序列库
    pub fn hand_library(&self) -> &Arc<HandSeqLibrary> {
        &self.library
    }

    // ==================== 位姿与跟踪模式 ====================

    /// 当前末端位姿
    pub fn pose(&self) -> Result<(Position3D, AxisAngle)> {
        self.pose
            .task_pose()
            .map_err(|e| EngineError::motion_fault(Facet::Arm, &e))
    }

    /// 设置跟踪模式
    pub fn set_tracking_mode(&self, enabled: bool) -> Result<()> {
        self.pose
            .set_tracking_mode(enabled)
            .map_err(|e| EngineError::motion_fault(Facet::Arm, &e))?;
        self.shared.state.lock().tracking_mode = enabled;
        debug!("Tracking mode {}", if enabled { "on" } else { "off" });
        Ok(())
    }

    /// 跟踪模式
    pub fn tracking_mode(&self) -> bool {
        self.shared.state.lock().tracking_mode
    }

    // ==================== 同步与状态 ====================

    /// 查询队列是否已排空
    ///
    /// `sync` 为 false 时立即返回；为 true 时阻塞直到排空、被中断或超时
    /// （超时由 [`EngineConfig::sync_timeout`] 配置）。
    pub fn check(&self, sync: bool) -> CheckOutcome {
        if sync {
            self.shared.gate.wait_idle(self.config.sync_timeout)
        } else {
            self.check_now()
        }
    }

    /// 阻塞查询，使用指定超时
    pub fn check_timeout(&self, timeout: Duration) -> CheckOutcome {
        self.shared.gate.wait_idle(Some(timeout))
    }

    fn check_now(&self) -> CheckOutcome {
        if self.shared.gate.is_idle() {
            CheckOutcome::Done
        } else {
            CheckOutcome::Pending
        }
    }

    /// 队列是否已排空（见 [`check`](Self::check)）
    pub fn check_actions_done(&self, sync: bool) -> bool {
        self.check(sync).is_done()
    }

    /// 中断所有阻塞查询；`disable` 为 true 时之后的阻塞查询也立即返回
    pub fn sync_check_interrupt(&self, disable: bool) {
        self.shared.gate.interrupt(disable);
    }

    /// 恢复阻塞查询
    pub fn sync_check_reinstate(&self) {
        self.shared.gate.reinstate();
    }

    /// 状态快照
    pub fn status(&self) -> EngineStatus {
        self.shared.state.lock().status()
    }

    /// 取出最近一次故障（取出后清除）
    pub fn take_fault(&self) -> Option<FaultRecord> {
        self.shared.state.lock().last_fault.take()
    }

    /// 配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== 生命周期 ====================

    /// 手动执行一个控制周期
    ///
    /// 仅在 [`EngineBuilder::manual_stepping`](crate::EngineBuilder::manual_stepping)
    /// 模式下可用。
    pub fn step(&self) -> Result<()> {
        match &mut *self.runner.lock() {
            Runner::Manual(executor) => {
                executor.tick();
                Ok(())
            },
            Runner::Thread(_) => Err(EngineError::NotManual),
            Runner::Closed => Err(EngineError::QueueUnavailable),
        }
    }

    /// 是否为手动步进模式
    pub fn is_manual(&self) -> bool {
        matches!(*self.runner.lock(), Runner::Manual(_))
    }

    /// 引擎是否可用（未关闭且执行器在运行）
    pub fn is_valid(&self) -> bool {
        match &*self.runner.lock() {
            Runner::Thread(handle) => handle.is_running(),
            Runner::Manual(_) => true,
            Runner::Closed => false,
        }
    }

    /// 关闭引擎
    ///
    /// 清空并关闭队列，停止执行器（中止正在执行的动作），唤醒所有阻塞查询。
    /// 重复调用无副作用。
    pub fn close(&self) {
        let runner = std::mem::replace(&mut *self.runner.lock(), Runner::Closed);
        if matches!(runner, Runner::Closed) {
            return;
        }
        {
            let mut state = self.shared.state.lock();
            state.queue.close();
            state.live_target = None;
            state.abort_requested = false;
        }
        match runner {
            Runner::Thread(mut handle) => handle.stop(),
            Runner::Manual(mut executor) => executor.shutdown(),
            Runner::Closed => {},
        }
        self.shared.gate.set_idle(true);
        info!("Action engine \"{}\" closed", self.config.name);
    }
}

impl Drop for ActionEngine {
    fn drop(&mut self) {
        self.close();
    }
}
