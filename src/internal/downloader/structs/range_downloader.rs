//! 分段并发下载器
//!
//! 把一个远程资源按字节区间切成 N 段，并发请求后按序合并成一个本地文件。
//!
//! ## 流程
//!
//! 1. **探测**：`HEAD` 请求，读取 `Accept-Ranges` 与 `Content-Length`
//! 2. **规划**：按并发数切分 `[0, total)`，见 [`plan_ranges`](super::byte_range::plan_ranges)
//! 3. **派发**：每个非空分段一个 tokio 任务，各自写入临时目录下的分段文件
//! 4. **等待**：所有任务结束后才进入合并；任一分段失败会取消其余分段
//! 5. **合并**：按分段序号依次拷贝到目标文件，随后删除临时目录
//!
//! 服务器不支持 Range 或长度未知时改用 [`WholeFetch`] 单连接下载；
//! 长度为 0 时直接创建空文件，不发分段请求。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use range_downloader::downloader::Downloader;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = Downloader::new(4)
//!     .output_dir("downloads")
//!     .download("https://example.com/archive.tar.gz", None)
//!     .await?;
//! println!("{} 字节 -> {}", result.bytes(), result.path().display());
//! # Ok(())
//! # }
//! ```

mod capability_probe;
mod parallel_download;

use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio::fs::File;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::internal::downloader::impl_traits::impl_whole_fetch::HttpWholeFetch;
use crate::internal::downloader::traits::whole_fetch::WholeFetch;

use super::download_error::DownloadError;
use super::download_job::DownloadJob;
use super::download_progress::{DownloadProgress, ProgressCounter};
use super::download_result::DownloadResult;
use super::download_state::DownloadState;
use super::downloader_config::{DEFAULT_CONCURRENCY, DownloaderConfig};
use parallel_download::{RunParallelDownloadParams, run_parallel_download};

#[cfg(test)]
pub(crate) use capability_probe::capability_from_headers;
pub use capability_probe::probe;
pub use parallel_download::{FetchRangeParams, fetch_range, merge_parts};

/// 分段并发下载器。配置在调用 [`Downloader::download`] 之前通过链式方法完成。
pub struct Downloader {
    client: Client,
    config: DownloaderConfig,
    /// 未设置时按当前 client 构造 [`HttpWholeFetch`]
    whole_fetch: Option<Arc<dyn WholeFetch>>,
    progress: Arc<watch::Sender<DownloadProgress>>,
    state: watch::Sender<DownloadState>,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl Downloader {
    /// 创建下载器；`concurrency` 为分段数，传 0 时按 1 处理。
    pub fn new(concurrency: usize) -> Self {
        let config = DownloaderConfig::default();
        Self::with_config(DownloaderConfig {
            concurrency,
            ..config
        })
    }

    pub fn with_config(mut config: DownloaderConfig) -> Self {
        if config.concurrency == 0 {
            warn!("并发数为 0，按 1 处理");
            config.concurrency = 1;
        }
        let (progress, _) = watch::channel(DownloadProgress::default());
        let (state, _) = watch::channel(DownloadState::Idle);
        Self {
            client: Client::new(),
            config,
            whole_fetch: None,
            progress: Arc::new(progress),
            state,
        }
    }

    /// 设置目标文件与临时目录所在目录，默认当前工作目录。
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 设置写盘与合并缓冲区大小（字节），最小 1。
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size.max(1);
        self
    }

    /// 使用自定义 HTTP 客户端（超时、TLS 等由客户端决定）。
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// 替换单连接下载实现。
    pub fn with_whole_fetch(mut self, whole_fetch: impl WholeFetch + 'static) -> Self {
        self.whole_fetch = Some(Arc::new(whole_fetch));
        self
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// 下载进度；`.changed().await` 监听。
    pub fn progress(&self) -> watch::Receiver<DownloadProgress> {
        self.progress.subscribe()
    }

    /// 下载状态；`.changed().await` 监听。
    pub fn state(&self) -> watch::Receiver<DownloadState> {
        self.state.subscribe()
    }

    /// 下载 `url` 到输出目录；`filename` 为空时取 URL 最后一段路径。
    pub async fn download(
        &self,
        url: &str,
        filename: Option<&str>,
    ) -> Result<DownloadResult, DownloadError> {
        let result = self.run(url, filename).await;
        match &result {
            Ok(outcome) => {
                self.set_state(DownloadState::Done);
                info!(
                    url,
                    path = %outcome.path().display(),
                    bytes = outcome.bytes(),
                    "下载完成"
                );
            }
            Err(e) => {
                self.set_state(DownloadState::Failed);
                warn!(url, error = %e, "下载失败");
            }
        }
        result
    }

    async fn run(
        &self,
        url: &str,
        filename: Option<&str>,
    ) -> Result<DownloadResult, DownloadError> {
        let job = DownloadJob::new(
            url,
            filename,
            self.config.concurrency,
            &self.config.output_dir,
        )?;

        self.set_state(DownloadState::Probing);
        self.progress.send_replace(DownloadProgress::default());
        let capability = probe(&self.client, job.url.as_str()).await?;
        debug!(url, ?capability, "探测完成");

        match capability.content_length {
            Some(0) if capability.supports_ranges => {
                let path = job.dest_path();
                File::create(&path)
                    .await
                    .map_err(DownloadError::CreateFile)?;
                info!(url, "远程文件长度为 0，已创建空文件");
                Ok(DownloadResult::Empty { path })
            }
            Some(total) if capability.supports_ranges => {
                info!(url, total, concurrency = job.concurrency, "开始分段下载");
                run_parallel_download(RunParallelDownloadParams {
                    client: &self.client,
                    job: &job,
                    total,
                    buffer_size: self.config.buffer_size,
                    progress: ProgressCounter::new(Arc::clone(&self.progress), Some(total)),
                    state: &self.state,
                })
                .await
            }
            _ => {
                info!(url, ?capability, "不支持分段下载，改为单连接下载");
                self.set_state(DownloadState::SingleStream);
                let path = job.dest_path();
                let progress =
                    ProgressCounter::new(Arc::clone(&self.progress), capability.content_length);
                let bytes = match &self.whole_fetch {
                    Some(fetcher) => {
                        fetcher
                            .fetch_whole(job.url.as_str(), &path, &progress)
                            .await?
                    }
                    None => {
                        HttpWholeFetch::new(self.client.clone())
                            .fetch_whole(job.url.as_str(), &path, &progress)
                            .await?
                    }
                };
                Ok(DownloadResult::SingleStream { path, bytes })
            }
        }
    }

    fn set_state(&self, state: DownloadState) {
        debug!(?state, "状态变更");
        self.state.send_replace(state);
    }
}
