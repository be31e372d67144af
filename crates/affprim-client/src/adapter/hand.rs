//! 手部运动适配器

use crate::error::{EngineError, Result};
use crate::library::HandSeqLibrary;
use affprim_driver::{ContactSource, DriverError, JointController};
use affprim_protocol::{Facet, HandWayPoint};
use std::sync::Arc;
use tracing::{debug, warn};

/// 逐路点推进手部序列
///
/// 每个控制周期调用一次 [`tick`](Self::tick)。当前路点在以下任一条件成立时结束：
///
/// - 所有关节进入收敛容差
/// - 某个手指的接触信号超过该路点对应的阈值（该手指的关节立即停止）
///
/// 两个条件是"或"的关系，同一周期同时成立时没有优先级。
/// 最后一个路点结束后适配器报告完成。
pub struct HandMotion {
    joints: Arc<dyn JointController>,
    contact: Option<Arc<dyn ContactSource>>,
    library: Arc<HandSeqLibrary>,
    tolerance_deg: f64,
    tag: String,
    sequence: Option<Arc<Vec<HandWayPoint>>>,
    index: usize,
    moving: Vec<bool>,
    contact_way_points: usize,
}

impl HandMotion {
    /// 创建适配器
    pub fn new(
        joints: Arc<dyn JointController>,
        contact: Option<Arc<dyn ContactSource>>,
        library: Arc<HandSeqLibrary>,
        tolerance_deg: f64,
    ) -> Self {
        Self {
            joints,
            contact,
            library,
            tolerance_deg,
            tag: String::new(),
            sequence: None,
            index: 0,
            moving: Vec::new(),
            contact_way_points: 0,
        }
    }

    /// 开始执行序列 `tag`
    ///
    /// 序列未注册时返回 [`EngineError::UnknownSequence`]；
    /// 下发第一个路点失败时返回 [`EngineError::MotionFault`]。
    pub fn start(&mut self, tag: &str) -> Result<()> {
        if self.is_running() {
            self.abort();
        }
        let sequence = self
            .library
            .get(tag)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::UnknownSequence(tag.to_string()))?;

        // 丢弃启动前积压的接触数据
        if let Some(contact) = &self.contact {
            contact.poll();
        }

        self.tag = tag.to_string();
        self.contact_way_points = 0;
        self.begin_way_point(&sequence, 0)
            .map_err(|e| EngineError::motion_fault(Facet::Hand, &e))?;
        self.sequence = Some(sequence);
        debug!("Hand sequence \"{}\" started", tag);
        Ok(())
    }

    fn begin_way_point(&mut self, sequence: &[HandWayPoint], index: usize) -> std::result::Result<(), DriverError> {
        let wp = &sequence[index];
        self.joints.set_joint_targets(wp.positions(), wp.velocities())?;
        self.index = index;
        self.moving = vec![true; wp.positions().len()];
        Ok(())
    }

    /// 推进一个控制周期，返回序列是否已完成
    pub fn tick(&mut self) -> std::result::Result<bool, DriverError> {
        let Some(sequence) = self.sequence.clone() else {
            return Ok(true);
        };
        let wp = &sequence[self.index];

        let positions = self.joints.joint_positions()?;
        if positions.len() < wp.positions().len() {
            return Err(DriverError::InvalidInput(format!(
                "joint controller reported {} positions, way-point has {}",
                positions.len(),
                wp.positions().len()
            )));
        }
        for (j, moving) in self.moving.iter_mut().enumerate() {
            if *moving && (positions[j] - wp.positions()[j]).abs() <= self.tolerance_deg {
                *moving = false;
            }
        }
        let converged = self.moving.iter().all(|m| !m);

        let mut contacted = false;
        if let Some(values) = self.contact.as_ref().and_then(|c| c.poll()) {
            let layout = self.library.layout();
            for (digit, (&value, &threshold)) in values.iter().zip(wp.thresholds()).enumerate() {
                if value <= threshold {
                    continue;
                }
                contacted = true;
                let stop: Vec<usize> = layout
                    .digit_joints(digit)
                    .iter()
                    .copied()
                    .filter(|&j| self.moving.get(j).copied().unwrap_or(false))
                    .collect();
                if !stop.is_empty() {
                    self.joints.stop_joints(&stop)?;
                    for &j in &stop {
                        self.moving[j] = false;
                    }
                }
                debug!(
                    "Contact on digit {} ({:.1} > {:.1}), way-point {} of \"{}\" ends",
                    digit, value, threshold, self.index, self.tag
                );
            }
        }

        if !(converged || contacted) {
            return Ok(false);
        }
        if contacted {
            self.contact_way_points += 1;
        }

        let next = self.index + 1;
        if next >= sequence.len() {
            self.sequence = None;
            debug!("Hand sequence \"{}\" done", self.tag);
            return Ok(true);
        }
        self.begin_way_point(&sequence, next)?;
        Ok(false)
    }

    /// 是否已完成（未运行时为 true）
    pub fn poll_done(&self) -> bool {
        self.sequence.is_none()
    }

    /// 停止所有手部关节
    pub fn abort(&mut self) {
        if self.sequence.take().is_none() {
            return;
        }
        let all: Vec<usize> = (0..self.library.layout().joint_count()).collect();
        if let Err(e) = self.joints.stop_joints(&all) {
            warn!("Failed to stop hand joints: {}", e);
        }
        debug!("Hand sequence \"{}\" aborted", self.tag);
    }

    /// 是否有序列在执行
    pub fn is_running(&self) -> bool {
        self.sequence.is_some()
    }

    /// 正在执行（或上一次执行）的序列标签
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 当前路点索引
    pub fn way_point_index(&self) -> Option<usize> {
        self.sequence.as_ref().map(|_| self.index)
    }

    /// 本次序列中因接触而提前结束的路点数
    pub fn contact_way_points(&self) -> usize {
        self.contact_way_points
    }
}
