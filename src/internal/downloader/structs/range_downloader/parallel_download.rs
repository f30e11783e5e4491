//! 分段下载：创建临时目录、派发分段任务、等待全部结束、合并、清理。

mod merge;
mod part_fetch;
mod range_request;
mod spawn_tasks;

use std::path::PathBuf;

use reqwest::Client;
use tokio::fs;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::internal::downloader::structs::{
    DownloadError, DownloadJob, DownloadResult, DownloadState, ProgressCounter, plan_ranges,
};

use spawn_tasks::{SpawnRangeTasksParams, join_range_tasks, spawn_range_tasks};

pub use merge::merge_parts;
pub use part_fetch::{FetchRangeParams, fetch_range};

/// 分段下载入口的参数（形参超过 3 个，用 struct 承载）。
pub(crate) struct RunParallelDownloadParams<'a> {
    pub client: &'a Client,
    pub job: &'a DownloadJob,
    pub total: u64,
    pub buffer_size: usize,
    pub progress: ProgressCounter,
    pub state: &'a watch::Sender<DownloadState>,
}

/// 分段下载入口：已知长度且大于 0。无论成功失败，返回前都会删除临时目录；
/// 调用方中途丢弃 future 时由 [`TempDirGuard`] 兜底删除。
pub(crate) async fn run_parallel_download(
    params: RunParallelDownloadParams<'_>,
) -> Result<DownloadResult, DownloadError> {
    let temp_dir = params.job.temp_dir();
    fs::create_dir_all(&temp_dir)
        .await
        .map_err(|source| DownloadError::CreateTempDir {
            path: temp_dir.clone(),
            source,
        })?;
    let guard = TempDirGuard::new(temp_dir);

    let outcome = fetch_and_merge(&params).await;

    guard.remove().await;
    outcome
}

/// 临时目录守卫：正常结束时异步删除；未走到 [`TempDirGuard::remove`] 就被 drop 时同步删除。
struct TempDirGuard {
    path: PathBuf,
    armed: bool,
}

impl TempDirGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    async fn remove(mut self) {
        self.armed = false;
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "删除临时目录失败");
        }
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!(path = %self.path.display(), "下载被中途丢弃，删除临时目录");
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "删除临时目录失败");
        }
    }
}

async fn fetch_and_merge(
    params: &RunParallelDownloadParams<'_>,
) -> Result<DownloadResult, DownloadError> {
    let ranges = plan_ranges(params.total, params.job.concurrency);
    debug!(?ranges, "分段规划完成");

    params.state.send_replace(DownloadState::Dispatching);
    let cancel = CancellationToken::new();
    let join_set = spawn_range_tasks(SpawnRangeTasksParams {
        client: params.client,
        job: params.job,
        ranges: &ranges,
        buffer_size: params.buffer_size,
        cancel: &cancel,
        progress: &params.progress,
    });
    let parts = join_set.len();

    params.state.send_replace(DownloadState::Waiting);
    join_range_tasks(join_set, &cancel).await?;

    params.state.send_replace(DownloadState::Merging);
    let bytes = merge_parts(params.job, params.buffer_size).await?;

    Ok(DownloadResult::Parallel {
        path: params.job.dest_path(),
        bytes,
        parts,
    })
}
