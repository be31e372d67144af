//! 仿真后端
//!
//! 在没有真实控制服务时使用的进程内实现，用于测试、示例和 CLI 演示。
//!
//! # 完成方式
//!
//! - [`Completion::Instant`]: 下发目标后下一次查询即完成
//! - [`Completion::Timed`]: 按执行时间/关节速度随时间推进
//! - [`Completion::Manual`]: 仅在测试代码显式调用 `finish_motion()` / `converge()` 后完成
//!
//! 所有仿真器都会记录收到的命令，便于测试断言。

use crate::error::DriverError;
use crate::service::{JointController, OutputSource, PoseController};
use affprim_protocol::{AxisAngle, Position3D};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 仿真运动的完成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 立即完成
    Instant,
    /// 随时间推进
    Timed,
    /// 由测试显式完成
    Manual,
}

/// 位姿服务收到的命令
#[derive(Debug, Clone, PartialEq)]
pub enum PoseCommand {
    /// `set_task_target`
    Target {
        position: Position3D,
        orientation: AxisAngle,
        exec_time: Duration,
    },
    /// `stop_task`
    Stop,
    /// `set_tracking_mode`
    Tracking(bool),
    /// `set_dof`
    Dof { dof: usize, enabled: bool },
    /// `set_dof_limits`
    DofLimits { dof: usize, min_deg: f64, max_deg: f64 },
}

#[derive(Debug)]
struct PoseSimState {
    position: Position3D,
    orientation: AxisAngle,
    start: Position3D,
    target: Option<(Position3D, AxisAngle)>,
    started_at: Instant,
    duration: Duration,
    log: Vec<PoseCommand>,
    fail_next_target: Option<DriverError>,
    fail_queries: Option<DriverError>,
}

impl PoseSimState {
    /// 按时间推进位置；返回是否已到达
    fn advance(&mut self, completion: Completion) -> bool {
        let Some((target, orientation)) = self.target else {
            return true;
        };
        let reached = match completion {
            Completion::Instant => true,
            Completion::Manual => false,
            Completion::Timed => {
                let elapsed = self.started_at.elapsed();
                if elapsed >= self.duration {
                    true
                } else {
                    let s = elapsed.as_secs_f64() / self.duration.as_secs_f64();
                    let delta = target - self.start;
                    self.position = self.start
                        + Position3D::new(delta.x * s, delta.y * s, delta.z * s);
                    false
                }
            },
        };
        if reached {
            self.position = target;
            self.orientation = orientation;
            self.target = None;
        }
        reached
    }
}

/// 仿真位姿控制服务
pub struct SimPoseController {
    completion: Completion,
    state: Mutex<PoseSimState>,
}

impl SimPoseController {
    /// 创建仿真位姿服务，初始位姿为原点
    pub fn new(completion: Completion) -> Self {
        Self::with_pose(completion, Position3D::ZERO, AxisAngle::IDENTITY)
    }

    /// 指定初始位姿
    pub fn with_pose(completion: Completion, position: Position3D, orientation: AxisAngle) -> Self {
        Self {
            completion,
            state: Mutex::new(PoseSimState {
                position,
                orientation,
                start: position,
                target: None,
                started_at: Instant::now(),
                duration: Duration::ZERO,
                log: Vec::new(),
                fail_next_target: None,
                fail_queries: None,
            }),
        }
    }

    /// 收到的全部命令
    pub fn commands(&self) -> Vec<PoseCommand> {
        self.state.lock().log.clone()
    }

    /// 依次收到的目标位置
    pub fn targets(&self) -> Vec<Position3D> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|c| match c {
                PoseCommand::Target { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// 依次收到的执行时间
    pub fn exec_times(&self) -> Vec<Duration> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|c| match c {
                PoseCommand::Target { exec_time, .. } => Some(*exec_time),
                _ => None,
            })
            .collect()
    }

    /// `stop_task` 被调用的次数
    pub fn stop_count(&self) -> usize {
        self.state
            .lock()
            .log
            .iter()
            .filter(|c| matches!(c, PoseCommand::Stop))
            .count()
    }

    /// 是否有运动在进行
    pub fn is_moving(&self) -> bool {
        self.state.lock().target.is_some()
    }

    /// 手动完成当前运动（[`Completion::Manual`]）
    pub fn finish_motion(&self) {
        let mut st = self.state.lock();
        if let Some((p, o)) = st.target.take() {
            st.position = p;
            st.orientation = o;
        }
    }

    /// 下一次 `set_task_target` 返回指定错误
    pub fn fail_next_target(&self, error: DriverError) {
        self.state.lock().fail_next_target = Some(error);
    }

    /// 之后所有查询（`is_task_done` / `task_pose`）返回指定错误；`None` 恢复正常
    pub fn fail_queries(&self, error: Option<DriverError>) {
        self.state.lock().fail_queries = error;
    }
}

impl PoseController for SimPoseController {
    fn set_task_target(
        &self,
        position: Position3D,
        orientation: AxisAngle,
        exec_time: Duration,
    ) -> Result<(), DriverError> {
        let mut st = self.state.lock();
        if let Some(err) = st.fail_next_target.take() {
            return Err(err);
        }
        st.advance(self.completion);
        st.log.push(PoseCommand::Target {
            position,
            orientation,
            exec_time,
        });
        st.start = st.position;
        st.target = Some((position, orientation));
        st.started_at = Instant::now();
        st.duration = exec_time;
        Ok(())
    }

    fn task_pose(&self) -> Result<(Position3D, AxisAngle), DriverError> {
        let mut st = self.state.lock();
        if let Some(err) = st.fail_queries.clone() {
            return Err(err);
        }
        st.advance(self.completion);
        Ok((st.position, st.orientation))
    }

    fn is_task_done(&self) -> Result<bool, DriverError> {
        let mut st = self.state.lock();
        if let Some(err) = st.fail_queries.clone() {
            return Err(err);
        }
        Ok(st.advance(self.completion))
    }

    fn stop_task(&self) -> Result<(), DriverError> {
        let mut st = self.state.lock();
        st.advance(self.completion);
        st.target = None;
        st.log.push(PoseCommand::Stop);
        Ok(())
    }

    fn set_tracking_mode(&self, enabled: bool) -> Result<(), DriverError> {
        self.state.lock().log.push(PoseCommand::Tracking(enabled));
        Ok(())
    }

    fn set_dof(&self, dof: usize, enabled: bool) -> Result<(), DriverError> {
        self.state.lock().log.push(PoseCommand::Dof { dof, enabled });
        Ok(())
    }

    fn set_dof_limits(&self, dof: usize, min_deg: f64, max_deg: f64) -> Result<(), DriverError> {
        self.state.lock().log.push(PoseCommand::DofLimits {
            dof,
            min_deg,
            max_deg,
        });
        Ok(())
    }
}

/// 关节服务收到的命令
#[derive(Debug, Clone, PartialEq)]
pub enum JointCommand {
    /// `set_joint_targets`
    Targets {
        positions: Vec<f64>,
        velocities: Vec<f64>,
    },
    /// `stop_joints`
    Stop(Vec<usize>),
}

#[derive(Debug)]
struct JointSimState {
    positions: Vec<f64>,
    targets: Vec<f64>,
    velocities: Vec<f64>,
    stopped: Vec<bool>,
    last_update: Instant,
    log: Vec<JointCommand>,
    fail_next_targets: Option<DriverError>,
}

impl JointSimState {
    fn advance(&mut self, completion: Completion) {
        match completion {
            Completion::Manual => {},
            Completion::Instant => {
                for j in 0..self.positions.len() {
                    if !self.stopped[j] {
                        self.positions[j] = self.targets[j];
                    }
                }
            },
            Completion::Timed => {
                let dt = self.last_update.elapsed().as_secs_f64();
                for j in 0..self.positions.len() {
                    if self.stopped[j] {
                        continue;
                    }
                    let step = self.velocities[j].abs() * dt;
                    let err = self.targets[j] - self.positions[j];
                    if err.abs() <= step {
                        self.positions[j] = self.targets[j];
                    } else {
                        self.positions[j] += step * err.signum();
                    }
                }
            },
        }
        self.last_update = Instant::now();
    }
}

/// 仿真手部关节控制服务
pub struct SimJointController {
    completion: Completion,
    state: Mutex<JointSimState>,
}

impl SimJointController {
    /// 创建 `joint_count` 个关节、初始位置为 0 的仿真服务
    pub fn new(joint_count: usize, completion: Completion) -> Self {
        Self {
            completion,
            state: Mutex::new(JointSimState {
                positions: vec![0.0; joint_count],
                targets: vec![0.0; joint_count],
                velocities: vec![0.0; joint_count],
                stopped: vec![false; joint_count],
                last_update: Instant::now(),
                log: Vec::new(),
                fail_next_targets: None,
            }),
        }
    }

    /// 收到的全部命令
    pub fn commands(&self) -> Vec<JointCommand> {
        self.state.lock().log.clone()
    }

    /// 依次下发的目标位置
    pub fn target_history(&self) -> Vec<Vec<f64>> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|c| match c {
                JointCommand::Targets { positions, .. } => Some(positions.clone()),
                _ => None,
            })
            .collect()
    }

    /// 依次收到的停止请求
    pub fn stop_history(&self) -> Vec<Vec<usize>> {
        self.state
            .lock()
            .log
            .iter()
            .filter_map(|c| match c {
                JointCommand::Stop(joints) => Some(joints.clone()),
                _ => None,
            })
            .collect()
    }

    /// 直接设置关节位置（[`Completion::Manual`]）
    pub fn set_positions(&self, positions: &[f64]) {
        let mut st = self.state.lock();
        let n = st.positions.len().min(positions.len());
        st.positions[..n].copy_from_slice(&positions[..n]);
    }

    /// 所有未停止的关节立即到达当前目标
    pub fn converge(&self) {
        self.state.lock().advance(Completion::Instant);
    }

    /// 下一次 `set_joint_targets` 返回指定错误
    pub fn fail_next_targets(&self, error: DriverError) {
        self.state.lock().fail_next_targets = Some(error);
    }
}

impl JointController for SimJointController {
    fn set_joint_targets(
        &self,
        positions_deg: &[f64],
        velocities_deg_s: &[f64],
    ) -> Result<(), DriverError> {
        let mut st = self.state.lock();
        if let Some(err) = st.fail_next_targets.take() {
            return Err(err);
        }
        let n = st.positions.len();
        if positions_deg.len() != n || velocities_deg_s.len() != n {
            return Err(DriverError::InvalidInput(format!(
                "expected {} joints, got {} positions / {} velocities",
                n,
                positions_deg.len(),
                velocities_deg_s.len()
            )));
        }
        st.advance(self.completion);
        st.targets.copy_from_slice(positions_deg);
        st.velocities.copy_from_slice(velocities_deg_s);
        st.stopped.iter_mut().for_each(|s| *s = false);
        st.log.push(JointCommand::Targets {
            positions: positions_deg.to_vec(),
            velocities: velocities_deg_s.to_vec(),
        });
        Ok(())
    }

    fn joint_positions(&self) -> Result<Vec<f64>, DriverError> {
        let mut st = self.state.lock();
        st.advance(self.completion);
        Ok(st.positions.clone())
    }

    fn stop_joints(&self, joints: &[usize]) -> Result<(), DriverError> {
        let mut st = self.state.lock();
        st.advance(self.completion);
        for &j in joints {
            if j < st.stopped.len() {
                st.stopped[j] = true;
            }
        }
        st.log.push(JointCommand::Stop(joints.to_vec()));
        Ok(())
    }

    fn joint_count(&self) -> Option<usize> {
        Some(self.state.lock().positions.len())
    }
}

/// 仿真关节输出信号
#[derive(Default)]
pub struct SimOutputSource {
    outputs: Mutex<HashMap<usize, f64>>,
}

impl SimOutputSource {
    /// 创建所有关节输出为 0 的信号源
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置某个关节的输出信号
    pub fn set_output(&self, joint: usize, value: f64) {
        self.outputs.lock().insert(joint, value);
    }
}

impl OutputSource for SimOutputSource {
    fn joint_output(&self, joint: usize) -> Result<f64, DriverError> {
        Ok(self.outputs.lock().get(&joint).copied().unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::thread;

    #[test]
    fn test_instant_pose_completion() {
        let sim = SimPoseController::new(Completion::Instant);
        let target = Position3D::new(0.3, 0.0, 0.2);
        sim.set_task_target(target, AxisAngle::IDENTITY, Duration::from_secs(2))
            .unwrap();
        assert!(sim.is_task_done().unwrap());
        assert_eq!(sim.task_pose().unwrap().0, target);
        assert_eq!(sim.targets(), vec![target]);
    }

    #[test]
    fn test_manual_pose_completion() {
        let sim = SimPoseController::new(Completion::Manual);
        let target = Position3D::new(0.3, 0.0, 0.2);
        sim.set_task_target(target, AxisAngle::IDENTITY, Duration::from_secs(2))
            .unwrap();
        assert!(!sim.is_task_done().unwrap());
        assert!(sim.is_moving());

        sim.finish_motion();
        assert!(sim.is_task_done().unwrap());
        assert_eq!(sim.task_pose().unwrap().0, target);
    }

    #[test]
    fn test_timed_pose_interpolates() {
        let sim = SimPoseController::new(Completion::Timed);
        let target = Position3D::new(1.0, 0.0, 0.0);
        sim.set_task_target(target, AxisAngle::IDENTITY, Duration::from_millis(40))
            .unwrap();

        thread::sleep(Duration::from_millis(10));
        let (p, _) = sim.task_pose().unwrap();
        assert!(p.x > 0.0 && p.x < 1.0, "x = {}", p.x);

        thread::sleep(Duration::from_millis(50));
        assert!(sim.is_task_done().unwrap());
        assert_eq!(sim.task_pose().unwrap().0, target);
    }

    #[test]
    fn test_pose_failures_injected() {
        let sim = SimPoseController::new(Completion::Instant);
        sim.fail_next_target(DriverError::Rejected("unreachable".into()));
        assert!(
            sim.set_task_target(Position3D::ZERO, AxisAngle::IDENTITY, Duration::from_secs(1))
                .is_err()
        );
        assert!(sim.targets().is_empty());

        sim.fail_queries(Some(DriverError::Timeout));
        assert_eq!(sim.is_task_done(), Err(DriverError::Timeout));
        sim.fail_queries(None);
        assert!(sim.is_task_done().unwrap());
    }

    #[test]
    fn test_stop_is_logged() {
        let sim = SimPoseController::new(Completion::Manual);
        sim.set_task_target(Position3D::new(0.1, 0.0, 0.0), AxisAngle::IDENTITY, Duration::from_secs(1))
            .unwrap();
        sim.stop_task().unwrap();
        assert_eq!(sim.stop_count(), 1);
        assert!(!sim.is_moving());
    }

    #[test]
    fn test_joint_instant_and_stop() {
        let sim = SimJointController::new(3, Completion::Instant);
        sim.set_joint_targets(&[10.0, 20.0, 30.0], &[50.0; 3]).unwrap();
        assert_eq!(sim.joint_positions().unwrap(), vec![10.0, 20.0, 30.0]);

        sim.stop_joints(&[1]).unwrap();
        assert_eq!(sim.stop_history(), vec![vec![1]]);
        assert_eq!(sim.joint_count(), Some(3));
    }

    #[test]
    fn test_joint_manual_converge() {
        let sim = SimJointController::new(2, Completion::Manual);
        sim.set_joint_targets(&[10.0, 20.0], &[50.0; 2]).unwrap();
        assert_eq!(sim.joint_positions().unwrap(), vec![0.0, 0.0]);

        sim.stop_joints(&[0]).unwrap();
        sim.converge();
        assert_eq!(sim.joint_positions().unwrap(), vec![0.0, 20.0]);
    }

    #[test]
    fn test_joint_timed_motion_reaches_random_targets() {
        let mut rng = rand::thread_rng();
        let targets: Vec<f64> = (0..4).map(|_| rng.gen_range(-30.0..30.0)).collect();

        let sim = SimJointController::new(4, Completion::Timed);
        sim.set_joint_targets(&targets, &[1000.0; 4]).unwrap();
        thread::sleep(Duration::from_millis(60));

        let pos = sim.joint_positions().unwrap();
        for (p, t) in pos.iter().zip(&targets) {
            assert!((p - t).abs() < 1e-9, "{} vs {}", p, t);
        }
    }

    #[test]
    fn test_joint_dimension_checked() {
        let sim = SimJointController::new(3, Completion::Instant);
        let err = sim.set_joint_targets(&[1.0], &[1.0]).unwrap_err();
        assert!(matches!(err, DriverError::InvalidInput(_)));
    }

    #[test]
    fn test_output_source() {
        let out = SimOutputSource::new();
        assert_eq!(out.joint_output(3).unwrap(), 0.0);
        out.set_output(3, 42.0);
        assert_eq!(out.joint_output(3).unwrap(), 42.0);
    }
}
