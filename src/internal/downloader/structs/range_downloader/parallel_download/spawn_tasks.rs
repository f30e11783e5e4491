//! 分段下载：spawn 各段任务，以及等待所有任务结束并汇总错误。

use reqwest::Client;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::internal::downloader::structs::{
    ByteRange, DownloadError, DownloadJob, PartError, PartFailure, ProgressCounter,
};

use super::part_fetch::{FetchRangeParams, fetch_range};

/// 单个分段任务的输出：分段区间及其结果。
pub(super) type RangeTaskOutput = (ByteRange, Result<u64, PartError>);

/// spawn 分段任务时的参数（形参超过 3 个，用 struct 承载）。
pub(super) struct SpawnRangeTasksParams<'a> {
    pub client: &'a Client,
    pub job: &'a DownloadJob,
    pub ranges: &'a [ByteRange],
    pub buffer_size: usize,
    pub cancel: &'a CancellationToken,
    pub progress: &'a ProgressCounter,
}

/// 为每个非空分段 spawn 一个任务；全部派发完才返回，不等待。
pub(super) fn spawn_range_tasks(params: SpawnRangeTasksParams<'_>) -> JoinSet<RangeTaskOutput> {
    let mut join_set = JoinSet::new();
    for range in params.ranges.iter().copied() {
        if range.is_empty() {
            debug!(index = range.index, "空分段，跳过");
            continue;
        }
        let fetch_params = FetchRangeParams {
            client: params.client.clone(),
            url: params.job.url.to_string(),
            range,
            part_path: params.job.part_path(range.index),
            buffer_size: params.buffer_size,
            cancel: params.cancel.child_token(),
            progress: params.progress.clone(),
        };
        join_set.spawn(async move { (range, fetch_range(fetch_params).await) });
    }
    join_set
}

/// 等待全部分段任务结束。
///
/// 第一个失败的分段会触发取消，但仍会等到所有任务都结束才返回，
/// 保证返回后没有任务还在写临时目录。
pub(super) async fn join_range_tasks(
    mut join_set: JoinSet<RangeTaskOutput>,
    cancel: &CancellationToken,
) -> Result<(), DownloadError> {
    let mut failures = Vec::new();
    let mut join_error = None;

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((range, Ok(bytes))) => {
                debug!(index = range.index, bytes, "分段完成");
            }
            Ok((_, Err(PartError::Cancelled))) => {}
            Ok((range, Err(error))) => {
                warn!(
                    index = range.index,
                    start = range.start,
                    end = range.end,
                    %error,
                    "分段失败，取消其余分段"
                );
                cancel.cancel();
                failures.push(PartFailure {
                    index: range.index,
                    start: range.start,
                    end: range.end,
                    error,
                });
            }
            Err(e) => {
                warn!(error = %e, "分段任务异常退出，取消其余分段");
                cancel.cancel();
                join_error.get_or_insert(e);
            }
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|f| f.index);
        return Err(DownloadError::PartsFailed(failures));
    }
    if let Some(e) = join_error {
        return Err(DownloadError::TaskJoin(e));
    }
    Ok(())
}
