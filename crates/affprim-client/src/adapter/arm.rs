//! 手臂运动适配器

use crate::config::AuxDof;
use affprim_driver::{ContactMonitor, DriverError, PoseController};
use affprim_protocol::{ArmTarget, ContactGuard, Position3D};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 任务空间到达
///
/// `start()` 立即返回，运动在位姿服务内部异步进行；
/// `poll_done()` 在服务报告完成或末端进入到达容差时返回 true。
///
/// 带 [`ContactGuard`] 的目标：运动期间被保护的关节从控制链中移除（保持不动），
/// 并由 [`ContactMonitor`] 监控其输出信号；监控器触发后直接停止任务，
/// 适配器在下一次轮询时报告完成并置位 `contact_detected`。
pub struct ArmMotion {
    pose: Arc<dyn PoseController>,
    monitor: Option<ContactMonitor>,
    aux_dofs: Vec<AuxDof>,
    reach_tolerance: f64,
    target: Option<Position3D>,
    guard: Option<ContactGuard>,
    contact_detected: bool,
}

impl ArmMotion {
    /// 创建适配器
    pub fn new(
        pose: Arc<dyn PoseController>,
        monitor: Option<ContactMonitor>,
        aux_dofs: Vec<AuxDof>,
        reach_tolerance: f64,
    ) -> Self {
        Self {
            pose,
            monitor,
            aux_dofs,
            reach_tolerance,
            target: None,
            guard: None,
            contact_detected: false,
        }
    }

    /// 是否能执行带接触保护的目标
    pub fn supports_guard(&self) -> bool {
        self.monitor.is_some()
    }

    /// 开始到达运动
    pub fn start(&mut self, target: &ArmTarget, exec_time: Duration) -> Result<(), DriverError> {
        if self.is_running() {
            self.abort();
        }
        if target.guard.is_some() && self.monitor.is_none() {
            return Err(DriverError::InvalidInput(
                "contact guard requires an output signal source".to_string(),
            ));
        }

        self.contact_detected = false;
        self.guard = target.guard;

        if let Err(e) = self.enable_dofs() {
            self.release_dofs();
            self.guard = None;
            return Err(e);
        }
        if let Err(e) = self
            .pose
            .set_task_target(target.position, target.orientation, exec_time)
        {
            self.release_dofs();
            self.guard = None;
            return Err(e);
        }

        if let (Some(guard), Some(monitor)) = (self.guard, &self.monitor) {
            monitor.arm(guard);
        }
        self.target = Some(target.position);
        debug!(
            "Arm reach started -> {} in {:?}{}",
            target.position,
            exec_time,
            if self.guard.is_some() { " (contact guarded)" } else { "" }
        );
        Ok(())
    }

    /// 非阻塞查询运动是否完成
    ///
    /// 未在运动时返回 true。
    pub fn poll_done(&mut self) -> Result<bool, DriverError> {
        let Some(target) = self.target else {
            return Ok(true);
        };

        if self.guard.is_some()
            && let Some(monitor) = &self.monitor
            && monitor.is_tripped()
        {
            self.contact_detected = true;
            self.finish();
            return Ok(true);
        }

        let done = if self.pose.is_task_done()? {
            true
        } else {
            let (position, _) = self.pose.task_pose()?;
            position.distance(&target) <= self.reach_tolerance
        };
        if done {
            if self.guard.is_some()
                && let Some(monitor) = &self.monitor
                && monitor.is_tripped()
            {
                self.contact_detected = true;
            }
            self.finish();
        }
        Ok(done)
    }

    /// 更新正在进行的运动的目标（跟踪模式）
    pub fn retarget(&mut self, target: &ArmTarget, exec_time: Duration) -> Result<(), DriverError> {
        if self.target.is_none() {
            return self.start(target, exec_time);
        }
        self.pose
            .set_task_target(target.position, target.orientation, exec_time)?;
        self.target = Some(target.position);
        debug!("Arm retargeted -> {}", target.position);
        Ok(())
    }

    /// 立即停止
    pub fn abort(&mut self) {
        if self.target.is_none() {
            return;
        }
        if let Err(e) = self.pose.stop_task() {
            warn!("Failed to stop arm motion: {}", e);
        }
        self.finish();
        debug!("Arm motion aborted");
    }

    /// 是否有运动在进行
    pub fn is_running(&self) -> bool {
        self.target.is_some()
    }

    /// 上一次运动是否因接触而结束
    pub fn contact_detected(&self) -> bool {
        self.contact_detected
    }

    /// 当前目标位置
    pub fn target(&self) -> Option<Position3D> {
        self.target
    }

    fn enable_dofs(&self) -> Result<(), DriverError> {
        for dof in &self.aux_dofs {
            self.pose.set_dof(dof.index, true)?;
            if let Some((min, max)) = dof.limits {
                self.pose.set_dof_limits(dof.index, min, max)?;
            }
        }
        if let Some(guard) = self.guard {
            self.pose.set_dof(guard.joint, false)?;
        }
        Ok(())
    }

    fn release_dofs(&self) {
        if let Some(guard) = self.guard
            && let Err(e) = self.pose.set_dof(guard.joint, true)
        {
            warn!("Failed to release held joint {}: {}", guard.joint, e);
        }
        for dof in &self.aux_dofs {
            if let Err(e) = self.pose.set_dof(dof.index, false) {
                warn!("Failed to disable aux dof {}: {}", dof.name, e);
            }
        }
    }

    fn finish(&mut self) {
        if let Some(monitor) = &self.monitor {
            monitor.disarm();
        }
        self.release_dofs();
        self.target = None;
        self.guard = None;
    }
}

impl Drop for ArmMotion {
    fn drop(&mut self) {
        self.abort();
    }
}
