//! Loop Runner - 执行器线程
//!
//! 在独立线程上以固定周期驱动执行器。
//!
//! # 核心功能
//!
//! - **精确定时**: 使用 `spin_sleep` 实现低抖动延时
//! - **超时告警**: 单个周期耗时超过周期长度时记录 warn 日志（不补偿）
//! - **优雅关闭**: `stop()` / Drop 时退出循环，中止正在执行的动作
//! - **实时优先级**: 启用 `realtime` feature 时提升线程优先级

use crate::error::{EngineError, Result};
use crate::executor::Executor;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 执行器循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 控制周期
    pub period: Duration,

    /// 线程名
    pub thread_name: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            period: Duration::from_millis(50), // 20Hz
            thread_name: "affprim-executor".to_string(),
        }
    }
}

/// 执行器线程句柄
pub(crate) struct LoopHandle {
    handle: Option<thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl LoopHandle {
    /// 停止循环并等待线程退出
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Executor thread panicked");
        }
    }

    /// 线程是否在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && self.handle.is_some()
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 启动执行器线程
pub(crate) fn spawn(executor: Executor, config: LoopConfig) -> Result<LoopHandle> {
    if config.period.is_zero() {
        return Err(EngineError::Configuration(
            "loop period must be > 0".to_string(),
        ));
    }

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    let handle = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || run_executor_spin(executor, config.period, running_clone))
        .map_err(|e| {
            EngineError::Configuration(format!("failed to spawn executor thread: {}", e))
        })?;

    Ok(LoopHandle {
        handle: Some(handle),
        running,
    })
}

/// 使用 spin_sleep 的固定周期循环
fn run_executor_spin(mut executor: Executor, period: Duration, running: Arc<AtomicBool>) {
    // 设置线程优先级（可选 feature）
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;
        use tracing::info;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Executor thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set executor thread priority: {}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    debug!("Executor loop started (period {:?})", period);
    let sleeper = SpinSleeper::default();
    let mut overruns: u64 = 0;

    while running.load(Ordering::Acquire) {
        let started = Instant::now();
        executor.tick();
        let elapsed = started.elapsed();

        if elapsed > period {
            overruns += 1;
            warn!(
                "Executor tick overran: {:?} > {:?} ({} overruns so far)",
                elapsed, period, overruns
            );
        } else {
            sleeper.sleep(period - elapsed);
        }
    }

    executor.shutdown();
    debug!("Executor loop exited ({} overruns)", overruns);
}
