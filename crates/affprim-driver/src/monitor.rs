//! ContactMonitor - 后台接触监控线程
//!
//! 在到达运动期间监控某个被锁定手臂关节的底层输出信号，
//! 一旦越过阈值立即停止任务空间运动（"碰到即停"）。
//!
//! # 设计目标
//!
//! - **独立于控制周期**: 以更高频率（默认 200Hz）轮询，不等执行器的下一个周期
//! - **无锁热路径**: 当前生效的保护参数存放在 `ArcSwapOption` 中
//! - **单次触发**: 触发后自动解除，直到下一次 `arm()`
//! - **优雅关闭**: `shutdown()` / Drop 时停止线程
//!
//! # 工作原理
//!
//! ```text
//! ArmMotion::start(guard) ──arm()──▶ ┌────────────────┐
//!                                     │ ContactMonitor │──joint_output()──▶ OutputSource
//! ArmMotion::poll_done() ◀─tripped──  └────────────────┘──stop_task()────▶ PoseController
//! ```

use crate::service::{OutputSource, PoseController};
use affprim_protocol::ContactGuard;
use arc_swap::ArcSwapOption;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// ContactMonitor 配置
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            poll_interval: Duration::from_millis(5), // 200Hz
        }
    }
}

/// 一次布防
struct ArmedGuard {
    generation: u64,
    guard: ContactGuard,
}

/// 监控线程与 [`ContactMonitor`] 共享的状态
#[derive(Default)]
struct GuardState {
    armed: ArcSwapOption<ArmedGuard>,
    /// 每次 `arm()` 加一
    generation: AtomicU64,
    /// 触发时所处的布防代数（0 表示未触发）
    tripped: AtomicU64,
}

impl GuardState {
    /// 认领一次触发
    ///
    /// 只有 `seen` 仍是当前布防时才成功：撤防并发布触发标志。
    /// 读取信号期间布防已被撤销或替换时返回 false。
    fn claim_trip(&self, seen: &Option<Arc<ArmedGuard>>) -> bool {
        let Some(entry) = seen else {
            return false;
        };
        let prev = self.armed.compare_and_swap(seen, None::<Arc<ArmedGuard>>);
        let still_armed = matches!(&*prev, Some(p) if Arc::ptr_eq(p, entry));
        if !still_armed || self.generation.load(Ordering::Acquire) != entry.generation {
            return false;
        }
        // 触发标志先于停止发布：观察到停止的一方一定能看到标志
        self.tripped.store(entry.generation, Ordering::Release);
        true
    }

    fn is_tripped(&self) -> bool {
        let tripped = self.tripped.load(Ordering::Acquire);
        tripped != 0 && tripped == self.generation.load(Ordering::Acquire)
    }
}

/// 接触监控器
pub struct ContactMonitor {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    state: Arc<GuardState>,
}

impl ContactMonitor {
    /// 启动监控线程
    ///
    /// 线程启动后处于未布防状态，直到调用 [`arm`](Self::arm)。
    pub fn start(
        output: Arc<dyn OutputSource>,
        pose: Arc<dyn PoseController>,
        config: MonitorConfig,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let state = Arc::new(GuardState::default());

        let shutdown_clone = shutdown.clone();
        let state_clone = state.clone();

        let handle = thread::Builder::new()
            .name("affprim-contact-monitor".to_string())
            .spawn(move || {
                Self::monitor_loop(output, pose, config, shutdown_clone, state_clone);
            })
            .map_err(|e| warn!("Failed to spawn contact monitor thread: {}", e))
            .ok();

        ContactMonitor {
            handle,
            shutdown,
            state,
        }
    }

    /// 监控循环
    fn monitor_loop(
        output: Arc<dyn OutputSource>,
        pose: Arc<dyn PoseController>,
        config: MonitorConfig,
        shutdown: Arc<AtomicBool>,
        state: Arc<GuardState>,
    ) {
        let sleeper = SpinSleeper::default();

        while !shutdown.load(Ordering::Relaxed) {
            let seen = state.armed.load_full();
            if let Some(entry) = &seen {
                let guard = entry.guard;
                match output.joint_output(guard.joint) {
                    Ok(signal) if guard.is_triggered(signal) => {
                        if state.claim_trip(&seen) {
                            if let Err(e) = pose.stop_task() {
                                warn!("Contact cutoff failed to stop task: {}", e);
                            }
                            warn!(
                                "Contact detected on joint {}: |{:.1}| > {:.1}, reach stopped",
                                guard.joint, signal, guard.threshold
                            );
                        } else {
                            debug!("Contact on joint {} ignored, guard was replaced", guard.joint);
                        }
                    },
                    Ok(_) => {},
                    Err(e) => warn!("Output signal read failed on joint {}: {}", guard.joint, e),
                }
            }

            sleeper.sleep(config.poll_interval);
        }
    }

    /// 布防：开始监控指定关节
    ///
    /// 上一次布防的触发标志随之失效。
    pub fn arm(&self, guard: ContactGuard) {
        let generation = self.state.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state
            .armed
            .store(Some(Arc::new(ArmedGuard { generation, guard })));
        debug!(
            "Contact monitor armed on joint {} (threshold {:.1})",
            guard.joint, guard.threshold
        );
    }

    /// 撤防
    pub fn disarm(&self) {
        self.state.armed.store(None);
    }

    /// 是否处于布防状态
    pub fn is_armed(&self) -> bool {
        self.state.armed.load().is_some()
    }

    /// 自上次布防以来是否触发过
    pub fn is_tripped(&self) -> bool {
        self.state.is_tripped()
    }

    /// 优雅关闭监控线程
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    /// 检查监控线程是否在运行
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed) && self.handle.is_some()
    }

    fn stop_thread(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ContactMonitor {
    fn drop(&mut self) {
        self.stop_thread();
    }
}
