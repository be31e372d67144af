//! 基于 channel 的接触数据流
//!
//! 生产者（抓取检测模块、仿真、测试）通过 [`ContactSender`] 推送每个手指的信号，
//! 执行器每个周期通过 [`ChannelContactSource::poll`] 取走最新一条。
//!
//! # 语义
//!
//! - **只保留最新**: `poll()` 会清空积压，仅返回最后一条
//! - **覆盖最旧**: 发送端从不阻塞，队列满时丢弃最旧的一条，为新消息腾出位置
//! - **已读即消费**: 同一条消息只会被 `poll()` 返回一次
//!
//! # 示例
//!
//! ```rust
//! use affprim_driver::contact::contact_channel;
//! use affprim_driver::ContactSource;
//!
//! let (tx, source) = contact_channel(8);
//! tx.send(vec![0.0, 0.0, 60.0, 0.0, 0.0]);
//! tx.send(vec![0.0, 0.0, 70.0, 0.0, 0.0]);
//!
//! assert_eq!(source.poll(), Some(vec![0.0, 0.0, 70.0, 0.0, 0.0]));
//! assert_eq!(source.poll(), None);
//! ```

use crate::service::ContactSource;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// 默认 channel 容量
pub const DEFAULT_CONTACT_CAPACITY: usize = 16;

/// 接触数据发送端（可克隆，可跨线程）
#[derive(Clone)]
pub struct ContactSender {
    tx: Sender<Vec<f64>>,
    /// 队列满时用来丢弃最旧消息
    evict: Receiver<Vec<f64>>,
    closed: Arc<AtomicBool>,
}

impl ContactSender {
    /// 推送一条每手指信号
    ///
    /// 队列满时丢弃最旧的一条；接收端已释放时返回 `false`。
    pub fn send(&self, values: Vec<f64>) -> bool {
        let mut values = values;
        loop {
            if self.closed.load(Ordering::Acquire) {
                return false;
            }
            match self.tx.try_send(values) {
                Ok(()) => return true,
                Err(TrySendError::Full(v)) => {
                    if self.evict.try_recv().is_ok() {
                        trace!("contact channel full, oldest reading dropped");
                    }
                    values = v;
                },
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// 基于 crossbeam channel 的接触数据源
pub struct ChannelContactSource {
    rx: Receiver<Vec<f64>>,
    closed: Arc<AtomicBool>,
}

impl Drop for ChannelContactSource {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl ContactSource for ChannelContactSource {
    fn poll(&self) -> Option<Vec<f64>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(v) => latest = Some(v),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        latest
    }
}

/// 创建接触数据 channel
pub fn contact_channel(capacity: usize) -> (ContactSender, ChannelContactSource) {
    let (tx, rx) = bounded(capacity.max(1));
    let closed = Arc::new(AtomicBool::new(false));
    (
        ContactSender {
            tx,
            evict: rx.clone(),
            closed: closed.clone(),
        },
        ChannelContactSource { rx, closed },
    )
}
