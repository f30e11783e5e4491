//! 分段下载：单段 Range 请求，流式写入分段文件并更新进度。

use std::path::PathBuf;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::internal::downloader::structs::{ByteRange, PartError, ProgressCounter};

use super::range_request::fetch_range_response;

/// 执行单段下载时的参数（形参超过 3 个，用 struct 承载）。
pub struct FetchRangeParams {
    pub client: Client,
    pub url: String,
    pub range: ByteRange,
    pub part_path: PathBuf,
    /// 写盘缓冲区大小，整段复用，内存占用与分段大小无关
    pub buffer_size: usize,
    pub cancel: CancellationToken,
    pub progress: ProgressCounter,
}

/// 下载 `[start, end)` 到分段文件，返回写入字节数。
///
/// 空分段直接返回 0，不发请求也不创建文件。收到的字节数必须与区间长度一致，
/// 多了少了都算失败，不会留下被截断的分段。等待响应和每块数据之间都会检查取消。
pub async fn fetch_range(params: FetchRangeParams) -> Result<u64, PartError> {
    let range = params.range;
    if range.is_empty() {
        return Ok(0);
    }

    let resp = tokio::select! {
        biased;
        _ = params.cancel.cancelled() => return Err(PartError::Cancelled),
        resp = fetch_range_response(&params.client, &params.url, &range) => resp?,
    };

    let file = File::create(&params.part_path).await?;
    let mut writer = BufWriter::with_capacity(params.buffer_size.max(1), file);
    let mut stream = resp.bytes_stream();
    let expected = range.len();
    let mut received: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = params.cancel.cancelled() => return Err(PartError::Cancelled),
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;
        let len = chunk.len() as u64;
        received += len;
        if received > expected {
            return Err(PartError::LengthMismatch { expected, received });
        }
        writer.write_all(&chunk).await?;
        params.progress.add(len);
    }

    writer.flush().await?;

    if received != expected {
        return Err(PartError::LengthMismatch { expected, received });
    }

    debug!(index = range.index, start = range.start, end = range.end, "分段写入完成");
    Ok(received)
}
