//! 能力探测：`HEAD` 请求，判断服务器是否支持 Range 并读取资源长度。

use reqwest::Client;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap};

use crate::internal::downloader::structs::Capability;
use crate::internal::downloader::structs::DownloadError;

/// 发起 `HEAD` 请求；网络错误与非成功状态码都作为错误返回，不重试。
pub async fn probe(client: &Client, url: &str) -> Result<Capability, DownloadError> {
    let resp = client
        .head(url)
        .send()
        .await
        .map_err(DownloadError::Probe)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::ProbeStatus { status });
    }

    Ok(capability_from_headers(resp.headers()))
}

/// 从响应头解析探测结果（状态码已确认成功）。
///
/// `Content-Length` 直接解析头部文本：reqwest 对 `HEAD` 响应的 `content_length()` 取自空响应体，不可信。
pub(crate) fn capability_from_headers(headers: &HeaderMap) -> Capability {
    let supports_ranges = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false);

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    Capability {
        supports_ranges,
        content_length,
    }
}
