//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 输出，并把 `log` 记录转发到 `tracing`。
//! 过滤规则优先读取 `RUST_LOG`，未设置时使用默认规则。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则
const DEFAULT_FILTER: &str = "affprim=info";

/// 使用默认规则（`affprim=info`）初始化日志
///
/// 返回是否由本次调用完成安装；已有全局 subscriber 时返回 false。
///
/// ```rust
/// affprim_sdk::init_logger();
/// tracing::info!("engine starting");
/// ```
pub fn init_logger() -> bool {
    init_logger_with_filter(DEFAULT_FILTER)
}

/// 使用指定的默认规则初始化日志（`RUST_LOG` 仍然优先）
pub fn init_logger_with_filter(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    // log -> tracing 桥接（第三方依赖可能仍使用 log 宏）
    if let Err(e) = tracing_log::LogTracer::init_with_filter(log::LevelFilter::Info) {
        tracing::debug!("log bridge not installed: {}", e);
    }
    true
}
