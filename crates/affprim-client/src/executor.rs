//! 周期执行器
//!
//! 动作队列的唯一消费者，也是两个运动适配器的唯一驱动者。每个控制周期：
//!
//! 1. 处理客户端请求：中止请求（`clear` / `stop_control`）、跟踪目标的重定向
//! 2. 轮询当前动作声明的 facet；全部完成后移除队头、锁存并清除完成标志
//! 3. 空闲时在同一周期内启动下一个动作（队头优先，其次是跟踪目标）
//! 4. 在共享状态锁下发布状态和同步门的空闲标志
//!
//! # 状态机
//!
//! ```text
//! Idle ──▶ { WaitRunning | ArmRunning | HandRunning | ArmAndHandRunning } ──▶ Done ──▶ Idle
//! ```
//!
//! `Done` 是瞬时的：同一周期内回到 `Idle` 并启动下一个动作。
//!
//! # 故障
//!
//! 启动或轮询时外部服务报错：放弃该动作，记录 [`FaultRecord`]，继续执行后续动作。
//!
//! # 锁
//!
//! 共享状态锁只在读写队列/标志时短暂持有，从不跨越服务调用。

use crate::adapter::{ArmMotion, HandMotion};
use crate::error::EngineError;
use crate::gate::SyncGate;
use crate::latches::{CompletionLatches, LatchSnapshot};
use crate::queue::ActionQueue;
use affprim_protocol::{Action, ArmTarget, Facet};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// 执行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// 没有动作在执行
    Idle,
    /// 等待动作
    WaitRunning,
    /// 仅手臂
    ArmRunning,
    /// 仅手部
    HandRunning,
    /// 手臂与手部同时
    ArmAndHandRunning,
}

impl ExecutorState {
    fn for_action(action: &Action) -> Self {
        match action {
            Action::Wait { .. } => ExecutorState::WaitRunning,
            Action::Motion {
                arm: Some(_),
                hand: Some(_),
            } => ExecutorState::ArmAndHandRunning,
            Action::Motion { arm: Some(_), .. } => ExecutorState::ArmRunning,
            Action::Motion { .. } => ExecutorState::HandRunning,
        }
    }

    /// 是否空闲
    pub fn is_idle(self) -> bool {
        self == ExecutorState::Idle
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutorState::Idle => "Idle",
            ExecutorState::WaitRunning => "WaitRunning",
            ExecutorState::ArmRunning => "ArmRunning",
            ExecutorState::HandRunning => "HandRunning",
            ExecutorState::ArmAndHandRunning => "ArmAndHandRunning",
        };
        f.write_str(s)
    }
}

/// 最近一次运动故障
#[derive(Debug, Clone, PartialEq)]
pub struct FaultRecord {
    /// 出错动作的队列 id（跟踪目标为 `None`）
    pub action_id: Option<u64>,
    /// 出错的 facet
    pub facet: Facet,
    /// 服务返回的信息
    pub message: String,
    /// 发生时间
    pub timestamp: SystemTime,
}

impl FaultRecord {
    fn new(action_id: Option<u64>, facet: Facet, message: String) -> Self {
        Self {
            action_id,
            facet,
            message,
            timestamp: SystemTime::now(),
        }
    }

    /// 转换为 [`EngineError::MotionFault`]
    pub fn to_error(&self) -> EngineError {
        EngineError::MotionFault {
            facet: self.facet,
            message: self.message.clone(),
        }
    }
}

/// 引擎状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    /// 执行器状态
    pub state: ExecutorState,
    /// 正在执行的动作 id
    pub active_id: Option<u64>,
    /// 队列长度（包括正在执行的队头）
    pub queue_len: usize,
    /// 当前动作各 facet 的完成情况
    pub progress: LatchSnapshot,
    /// 上一个完成的动作的完成标志
    pub latched: LatchSnapshot,
    /// 是否有待处理的跟踪目标
    pub live_target_pending: bool,
    /// 跟踪模式
    pub tracking_mode: bool,
    /// 上一次手臂运动是否因接触而结束
    pub contact_detected: bool,
    /// 最近一次故障
    pub last_fault: Option<FaultRecord>,
    /// 已执行的控制周期数
    pub ticks: u64,
}

impl EngineStatus {
    /// 队列已排空且没有动作在执行
    pub fn is_drained(&self) -> bool {
        self.queue_len == 0 && self.state.is_idle() && !self.live_target_pending
    }
}

/// 受引擎锁保护的共享状态
#[derive(Debug)]
pub(crate) struct SharedState {
    pub queue: ActionQueue,
    pub latches: CompletionLatches,
    pub state: ExecutorState,
    pub active_id: Option<u64>,
    pub live_target: Option<ArmTarget>,
    pub abort_requested: bool,
    pub last_fault: Option<FaultRecord>,
    pub tracking_mode: bool,
    pub contact_detected: bool,
    pub ticks: u64,
}

impl SharedState {
    pub fn new(tracking_mode: bool) -> Self {
        Self {
            queue: ActionQueue::new(),
            latches: CompletionLatches::default(),
            state: ExecutorState::Idle,
            active_id: None,
            live_target: None,
            abort_requested: false,
            last_fault: None,
            tracking_mode,
            contact_detected: false,
            ticks: 0,
        }
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.state.is_idle() && self.live_target.is_none()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            active_id: self.active_id,
            queue_len: self.queue.len(),
            progress: self.latches.current(),
            latched: self.latches.latched(),
            live_target_pending: self.live_target.is_some(),
            tracking_mode: self.tracking_mode,
            contact_detected: self.contact_detected,
            last_fault: self.last_fault.clone(),
            ticks: self.ticks,
        }
    }
}

/// 引擎与执行器共享的部分
#[derive(Debug)]
pub(crate) struct Shared {
    pub state: Mutex<SharedState>,
    pub gate: SyncGate,
}

impl Shared {
    pub fn new(tracking_mode: bool) -> Self {
        Self {
            state: Mutex::new(SharedState::new(tracking_mode)),
            gate: SyncGate::new(),
        }
    }
}

enum Running {
    /// `deadline` 为 `None` 表示时长超出时钟范围，只能被中止
    Wait { deadline: Option<Instant> },
    Motion { arm_pending: bool, hand_pending: bool },
}

struct ActiveAction {
    id: Option<u64>,
    state: ExecutorState,
    running: Running,
}

impl ActiveAction {
    fn arm_pending(&self) -> bool {
        matches!(
            self.running,
            Running::Motion {
                arm_pending: true,
                ..
            }
        )
    }
}

fn label(id: Option<u64>) -> String {
    match id {
        Some(id) => format!("#{}", id),
        None => "live target".to_string(),
    }
}

/// 周期执行器
pub(crate) struct Executor {
    shared: Arc<Shared>,
    arm: ArmMotion,
    hand: HandMotion,
    default_exec_time: Duration,
    active: Option<ActiveAction>,
}

impl Executor {
    pub fn new(
        shared: Arc<Shared>,
        arm: ArmMotion,
        hand: HandMotion,
        default_exec_time: Duration,
    ) -> Self {
        Self {
            shared,
            arm,
            hand,
            default_exec_time,
            active: None,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        f(&mut self.shared.state.lock())
    }

    /// 执行一个控制周期
    pub fn tick(&mut self) {
        let arm_pending = self.active.as_ref().is_some_and(ActiveAction::arm_pending);
        let (abort, retarget) = self.with_state(|s| {
            s.ticks += 1;
            let abort = std::mem::take(&mut s.abort_requested);
            let retarget = if !abort && arm_pending {
                s.live_target.take()
            } else {
                None
            };
            (abort, retarget)
        });

        if abort {
            self.abandon();
        }
        if let Some(target) = retarget {
            self.retarget(target);
        }
        if self.active.is_some() {
            self.poll_active();
        }

        while self.active.is_none() {
            let next = self.with_state(|s| match s.queue.front() {
                Some(entry) => Some((Some(entry.id), entry.action.clone())),
                None => s.live_target.take().map(|t| (None, Action::reach(t))),
            });
            let Some((id, action)) = next else {
                break;
            };
            self.start(id, action);
        }

        self.publish();
    }

    /// 中止当前动作并发布空闲状态（引擎关闭时调用）
    pub fn shutdown(&mut self) {
        self.abandon();
        self.publish();
    }

    fn retarget(&mut self, target: ArmTarget) {
        let exec_time = target.exec_time.unwrap_or(self.default_exec_time);
        if let Err(e) = self.arm.retarget(&target, exec_time) {
            let id = self.active.as_ref().and_then(|a| a.id);
            self.record_fault(FaultRecord::new(id, Facet::Arm, e.to_string()));
            self.abandon();
        }
    }

    fn start(&mut self, id: Option<u64>, action: Action) {
        let state = ExecutorState::for_action(&action);
        let started = match &action {
            Action::Wait { timeout } => Ok(Running::Wait {
                deadline: Instant::now().checked_add(*timeout),
            }),
            Action::Motion { arm, hand } => self.start_motion(arm.as_ref(), hand.as_deref()),
        };

        match started {
            Ok(running) => {
                self.active = Some(ActiveAction { id, state, running });
                self.with_state(|s| {
                    s.state = state;
                    s.active_id = id;
                    s.latches.clear();
                });
                debug!("Action {} started: {} [Idle -> {}]", label(id), action, state);
            },
            Err((facet, message)) => {
                let record = FaultRecord::new(id, facet, message);
                self.with_state(|s| {
                    if let Some(id) = id {
                        s.queue.pop_front_if(id);
                    }
                });
                self.record_fault(record);
            },
        }
    }

    fn start_motion(
        &mut self,
        arm: Option<&ArmTarget>,
        hand: Option<&str>,
    ) -> Result<Running, (Facet, String)> {
        if let Some(target) = arm {
            let exec_time = target.exec_time.unwrap_or(self.default_exec_time);
            self.arm
                .start(target, exec_time)
                .map_err(|e| (Facet::Arm, e.to_string()))?;
        }
        if let Some(tag) = hand
            && let Err(e) = self.hand.start(tag)
        {
            self.arm.abort();
            let message = match e {
                EngineError::MotionFault { message, .. } => message,
                other => other.to_string(),
            };
            return Err((Facet::Hand, message));
        }
        Ok(Running::Motion {
            arm_pending: arm.is_some(),
            hand_pending: hand.is_some(),
        })
    }

    fn poll_active(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let mut fault = None;
        let mut arm_finished = false;
        let mut hand_finished = false;
        let done = match &mut active.running {
            Running::Wait { deadline } => deadline.is_some_and(|d| Instant::now() >= d),
            Running::Motion {
                arm_pending,
                hand_pending,
            } => {
                if *arm_pending {
                    match self.arm.poll_done() {
                        Ok(true) => {
                            *arm_pending = false;
                            arm_finished = true;
                        },
                        Ok(false) => {},
                        Err(e) => fault = Some((Facet::Arm, e)),
                    }
                }
                if *hand_pending && fault.is_none() {
                    match self.hand.tick() {
                        Ok(true) => {
                            *hand_pending = false;
                            hand_finished = true;
                        },
                        Ok(false) => {},
                        Err(e) => fault = Some((Facet::Hand, e)),
                    }
                }
                !*arm_pending && !*hand_pending
            },
        };
        let id = active.id;
        let state = active.state;

        if arm_finished || hand_finished {
            let contact = self.arm.contact_detected();
            self.with_state(|s| {
                if arm_finished {
                    s.latches.set_arm_done();
                    s.contact_detected = contact;
                }
                if hand_finished {
                    s.latches.set_hand_done();
                }
            });
            if arm_finished && contact {
                debug!("Action {} arm motion ended on contact", label(id));
            }
        }

        if let Some((facet, err)) = fault {
            self.record_fault(FaultRecord::new(id, facet, err.to_string()));
            self.abandon();
        } else if done {
            self.active = None;
            self.with_state(|s| {
                if let Some(id) = id {
                    s.queue.pop_front_if(id);
                }
                s.latches.latch_and_clear();
                s.state = ExecutorState::Idle;
                s.active_id = None;
            });
            debug!("Action {} done [{} -> Done -> Idle]", label(id), state);
        }
    }

    /// 放弃当前动作：停止两个适配器，移除其队列条目
    fn abandon(&mut self) {
        self.arm.abort();
        self.hand.abort();
        let Some(active) = self.active.take() else {
            return;
        };
        self.with_state(|s| {
            if let Some(id) = active.id {
                s.queue.pop_front_if(id);
            }
            s.latches.clear();
            s.state = ExecutorState::Idle;
            s.active_id = None;
        });
        debug!("Action {} abandoned [{} -> Idle]", label(active.id), active.state);
    }

    fn record_fault(&self, record: FaultRecord) {
        warn!(
            "Action {} {} fault: {}",
            label(record.action_id),
            record.facet,
            record.message
        );
        self.with_state(|s| s.last_fault = Some(record));
    }

    fn publish(&self) {
        let s = self.shared.state.lock();
        self.shared.gate.set_idle(s.is_drained());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::HandSeqLibrary;
    use affprim_driver::{
        Completion, DriverError, SimJointController, SimPoseController, contact_channel,
    };
    use affprim_protocol::{AxisAngle, HandLayout, Position3D};

    struct Rig {
        executor: Executor,
        shared: Arc<Shared>,
        pose: Arc<SimPoseController>,
        joints: Arc<SimJointController>,
    }

    fn rig() -> Rig {
        let shared = Arc::new(Shared::new(false));
        let pose = Arc::new(SimPoseController::new(Completion::Manual));
        let joints = Arc::new(SimJointController::new(9, Completion::Manual));
        let library = Arc::new(HandSeqLibrary::new(HandLayout::default()));
        library
            .add_way_point("close", vec![30.0; 9], vec![40.0; 9], vec![50.0; 5])
            .unwrap();
        let (_tx, source) = contact_channel(4);
        let arm = ArmMotion::new(pose.clone(), None, Vec::new(), 0.005);
        let hand = HandMotion::new(joints.clone(), Some(Arc::new(source)), library, 1.0);
        Rig {
            executor: Executor::new(shared.clone(), arm, hand, Duration::from_secs(2)),
            shared,
            pose,
            joints,
        }
    }

    fn reach(x: f64) -> Action {
        Action::reach(ArmTarget::new(
            Position3D::new(x, 0.0, 0.2),
            AxisAngle::IDENTITY,
        ))
    }

    fn push(rig: &Rig, action: Action) -> u64 {
        let id = rig.shared.state.lock().queue.push(action).unwrap();
        rig.shared.gate.set_idle(false);
        id
    }

    fn status(rig: &Rig) -> EngineStatus {
        rig.shared.state.lock().status()
    }

    #[test]
    fn test_idle_tick_publishes_drained() {
        let mut rig = rig();
        rig.shared.gate.set_idle(false);
        rig.executor.tick();
        assert!(rig.shared.gate.is_idle());
        assert_eq!(status(&rig).ticks, 1);
    }

    #[test]
    fn test_arm_action_lifecycle() {
        let mut rig = rig();
        let id = push(&rig, reach(0.3));

        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::ArmRunning);
        assert_eq!(st.active_id, Some(id));
        assert_eq!(st.queue_len, 1);
        assert!(!rig.shared.gate.is_idle());

        rig.pose.finish_motion();
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::Idle);
        assert_eq!(st.queue_len, 0);
        assert!(st.latched.arm_done);
        assert!(rig.shared.gate.is_idle());
    }

    #[test]
    fn test_next_action_starts_in_same_tick() {
        let mut rig = rig();
        push(&rig, reach(0.3));
        push(&rig, reach(0.4));

        rig.executor.tick();
        rig.pose.finish_motion();
        rig.executor.tick();

        assert_eq!(status(&rig).state, ExecutorState::ArmRunning);
        assert_eq!(rig.pose.targets().len(), 2);
    }

    #[test]
    fn test_combined_action_waits_for_both_facets() {
        let mut rig = rig();
        push(
            &rig,
            Action::motion(
                Some(ArmTarget::new(Position3D::new(0.3, 0.0, 0.2), AxisAngle::IDENTITY)),
                Some("close".into()),
            )
            .unwrap(),
        );

        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::ArmAndHandRunning);

        rig.pose.finish_motion();
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::ArmAndHandRunning);
        assert!(st.progress.arm_done && !st.progress.hand_done);

        rig.joints.converge();
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::Idle);
        assert!(st.latched.arm_done && st.latched.hand_done);
        assert_eq!(st.progress, LatchSnapshot::default());
    }

    #[test]
    fn test_wait_action_counts_down() {
        let mut rig = rig();
        push(&rig, Action::wait(Duration::from_millis(30)));
        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::WaitRunning);
        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::WaitRunning);

        std::thread::sleep(Duration::from_millis(40));
        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::Idle);
    }

    #[test]
    fn test_unbounded_wait_runs_until_aborted() {
        let mut rig = rig();
        push(&rig, Action::wait(Duration::MAX));
        rig.executor.tick();
        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::WaitRunning);
        assert!(!rig.shared.gate.is_idle());

        {
            let mut s = rig.shared.state.lock();
            s.queue.clear();
            s.abort_requested = true;
        }
        rig.executor.tick();
        assert_eq!(status(&rig).state, ExecutorState::Idle);
        assert!(rig.shared.gate.is_idle());
    }

    #[test]
    fn test_start_fault_skips_to_next_action() {
        let mut rig = rig();
        rig.pose.fail_next_target(DriverError::Rejected("unreachable".into()));
        let bad = push(&rig, reach(5.0));
        push(&rig, reach(0.3));

        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::ArmRunning);
        assert_eq!(st.queue_len, 1);
        let fault = st.last_fault.unwrap();
        assert_eq!(fault.action_id, Some(bad));
        assert_eq!(fault.facet, Facet::Arm);
        assert!(fault.message.contains("unreachable"));
    }

    #[test]
    fn test_poll_fault_abandons_action() {
        let mut rig = rig();
        push(&rig, reach(0.3));
        rig.executor.tick();

        rig.pose.fail_queries(Some(DriverError::Timeout));
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::Idle);
        assert_eq!(st.queue_len, 0);
        assert_eq!(st.last_fault.unwrap().facet, Facet::Arm);
        assert_eq!(rig.pose.stop_count(), 1);
    }

    #[test]
    fn test_abort_request_served_next_tick() {
        let mut rig = rig();
        push(&rig, reach(0.3));
        rig.executor.tick();

        {
            let mut s = rig.shared.state.lock();
            s.queue.clear();
            s.abort_requested = true;
        }
        rig.executor.tick();
        assert_eq!(rig.pose.stop_count(), 1);
        assert_eq!(status(&rig).state, ExecutorState::Idle);
        assert!(rig.shared.gate.is_idle());
    }

    #[test]
    fn test_completion_never_pops_foreign_entry() {
        let mut rig = rig();
        push(&rig, reach(0.3));
        rig.executor.tick();

        // 执行期间客户端清空后又压入新动作，但中止请求丢失
        let newer = {
            let mut s = rig.shared.state.lock();
            s.queue.clear();
            s.queue.push(reach(0.5)).unwrap()
        };
        rig.pose.finish_motion();
        rig.executor.tick();

        let st = status(&rig);
        assert_eq!(st.active_id, Some(newer));
        assert_eq!(st.queue_len, 1);
    }

    #[test]
    fn test_live_target_starts_when_idle_and_retargets() {
        let mut rig = rig();
        let target = |x| ArmTarget::new(Position3D::new(x, 0.0, 0.2), AxisAngle::IDENTITY);

        rig.shared.state.lock().live_target = Some(target(0.3));
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::ArmRunning);
        assert_eq!(st.active_id, None);
        assert_eq!(st.queue_len, 0);

        rig.shared.state.lock().live_target = Some(target(0.32));
        rig.shared.state.lock().live_target = Some(target(0.34));
        rig.executor.tick();
        assert_eq!(
            rig.pose.targets(),
            vec![Position3D::new(0.3, 0.0, 0.2), Position3D::new(0.34, 0.0, 0.2)]
        );

        rig.pose.finish_motion();
        rig.executor.tick();
        assert!(rig.shared.gate.is_idle());
    }

    #[test]
    fn test_unknown_hand_sequence_at_start_is_fault() {
        let mut rig = rig();
        push(&rig, Action::hand("vanished"));
        rig.executor.tick();
        let st = status(&rig);
        assert_eq!(st.state, ExecutorState::Idle);
        let fault = st.last_fault.unwrap();
        assert_eq!(fault.facet, Facet::Hand);
        assert!(fault.message.contains("vanished"));
    }

    #[test]
    fn test_shutdown_aborts_active() {
        let mut rig = rig();
        push(&rig, Action::hand("close"));
        rig.executor.tick();
        rig.shared.state.lock().queue.close();
        rig.executor.shutdown();
        assert_eq!(rig.joints.stop_history().len(), 1);
        assert!(rig.shared.gate.is_idle());
    }
}
