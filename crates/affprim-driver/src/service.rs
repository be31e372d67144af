//! 外部运动服务边界
//!
//! 引擎本身不做逆运动学、不实现关节伺服，也不实现接触传感器；
//! 这些能力由外部服务提供，本模块定义它们的接口。
//!
//! 所有 trait 都要求 `Send + Sync`：同一个服务实例会被客户端线程
//! （查询位姿、切换跟踪模式）、执行器线程和接触监控线程共享。
//!
//! # 非阻塞约定
//!
//! 执行器在每个控制周期都会调用 `is_task_done()`、`joint_positions()`、
//! `poll()` 等查询方法，实现必须立即返回，不得等待运动完成。

use crate::error::DriverError;
use affprim_protocol::{AxisAngle, Position3D};
use std::time::Duration;

/// 任务空间位姿控制服务（笛卡尔控制器）
pub trait PoseController: Send + Sync {
    /// 下发目标位姿，立即返回；运动在服务内部异步进行
    fn set_task_target(
        &self,
        position: Position3D,
        orientation: AxisAngle,
        exec_time: Duration,
    ) -> Result<(), DriverError>;

    /// 当前末端位姿
    fn task_pose(&self) -> Result<(Position3D, AxisAngle), DriverError>;

    /// 服务是否认为当前运动已完成
    fn is_task_done(&self) -> Result<bool, DriverError>;

    /// 立即停止当前运动
    fn stop_task(&self) -> Result<(), DriverError>;

    /// 跟踪模式：到达后保持笛卡尔位姿（true）或保持关节位置（false）
    fn set_tracking_mode(&self, enabled: bool) -> Result<(), DriverError>;

    /// 启用/禁用控制链中的某个自由度（如躯干关节、被锁定的腕关节）
    fn set_dof(&self, dof: usize, enabled: bool) -> Result<(), DriverError> {
        let _ = (dof, enabled);
        Ok(())
    }

    /// 设置自由度的限位（度）
    fn set_dof_limits(&self, dof: usize, min_deg: f64, max_deg: f64) -> Result<(), DriverError> {
        let _ = (dof, min_deg, max_deg);
        Ok(())
    }
}

/// 手部关节位置控制服务
///
/// 关节索引为手部本地索引（`0..N`）。
pub trait JointController: Send + Sync {
    /// 下发所有手部关节的目标位置（度）与速度（度/秒）
    fn set_joint_targets(&self, positions_deg: &[f64], velocities_deg_s: &[f64])
    -> Result<(), DriverError>;

    /// 当前手部关节位置（度）
    fn joint_positions(&self) -> Result<Vec<f64>, DriverError>;

    /// 停止指定关节
    fn stop_joints(&self, joints: &[usize]) -> Result<(), DriverError>;

    /// 服务管理的关节数（未知时返回 `None`）
    fn joint_count(&self) -> Option<usize> {
        None
    }
}

/// 接触/抓取检测数据流
///
/// 每个控制周期轮询一次；返回每个手指的标量信号，无需应答。
pub trait ContactSource: Send + Sync {
    /// 读取最新一条未读消息（无新消息时返回 `None`）
    fn poll(&self) -> Option<Vec<f64>>;
}

/// 手臂关节底层输出信号（如 PWM），供接触监控使用
pub trait OutputSource: Send + Sync {
    /// 读取指定手臂关节的输出信号
    fn joint_output(&self, joint: usize) -> Result<f64, DriverError>;
}
