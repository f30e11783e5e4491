use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

/// 下载进度：已下载字节数与总大小；探测前或长度未知时总大小为 `None`。
///
/// 调用方通过下载器的 `progress()` 读取或监听；进度比例可用 [`DownloadProgress::pct`] 获取。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadProgress {
    /// 已下载的字节数（所有分段之和）
    pub bytes_done: u64,
    /// 文件总大小（字节），未知时为 `None`
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// 进度百分比（0～100）；总大小为 0 或未知时返回 `f64::NAN`。
    pub fn pct(&self) -> f64 {
        self.total
            .filter(|&t| t > 0)
            .map(|t| (self.bytes_done as f64 / t as f64) * 100.0)
            .unwrap_or(f64::NAN)
    }
}

/// 分段任务共享的进度计数器：原子累加字节数并推送到 watch 通道。
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    bytes_done: Arc<AtomicU64>,
    total: Option<u64>,
    sender: Arc<watch::Sender<DownloadProgress>>,
}

impl ProgressCounter {
    /// 创建计数器，并把通道里的进度重置为 `0 / total`。
    pub fn new(sender: Arc<watch::Sender<DownloadProgress>>, total: Option<u64>) -> Self {
        sender.send_replace(DownloadProgress {
            bytes_done: 0,
            total,
        });
        Self {
            bytes_done: Arc::new(AtomicU64::new(0)),
            total,
            sender,
        }
    }

    /// 不对外推送的计数器，单独调用分段下载时使用。
    pub fn detached(total: Option<u64>) -> Self {
        let (sender, _) = watch::channel(DownloadProgress::default());
        Self::new(Arc::new(sender), total)
    }

    pub fn add(&self, len: u64) {
        let current = self.bytes_done.fetch_add(len, Ordering::Relaxed) + len;
        self.sender.send_replace(DownloadProgress {
            bytes_done: current,
            total: self.total,
        });
    }

    pub fn bytes_done(&self) -> u64 {
        self.bytes_done.load(Ordering::Relaxed)
    }
}
