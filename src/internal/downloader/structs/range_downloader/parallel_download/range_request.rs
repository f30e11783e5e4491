//! 分段下载：发起单段 Range 请求，返回响应供流式读取。

use reqwest::header::RANGE;
use reqwest::{Client, Response, StatusCode};

use crate::internal::downloader::structs::{ByteRange, PartError};

/// 发起单段 Range GET 请求；只接受 `206 Partial Content`，其余状态码视为失败。
///
/// 服务器忽略 Range 返回 `200` 时响应体是整个文件，写进分段会破坏合并结果。
pub(super) async fn fetch_range_response(
    client: &Client,
    url: &str,
    range: &ByteRange,
) -> Result<Response, PartError> {
    let resp = client
        .get(url)
        .header(RANGE, range.header_value())
        .send()
        .await?;

    let status = resp.status();
    if status != StatusCode::PARTIAL_CONTENT {
        return Err(PartError::UnexpectedStatus(status));
    }
    Ok(resp)
}
