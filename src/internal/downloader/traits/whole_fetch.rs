//! 单连接下载接口：服务器不支持 Range 或长度未知时由下载器调用。

use std::path::Path;

use async_trait::async_trait;

use crate::internal::downloader::structs::{DownloadError, ProgressCounter};

/// 把 `url` 的完整内容写入 `dest`，返回写入字节数；每写入一块都应计入 `progress`。
///
/// 默认实现为 [`HttpWholeFetch`](crate::downloader::HttpWholeFetch)；
/// 通过下载器的 `with_whole_fetch` 替换。
#[async_trait]
pub trait WholeFetch: Send + Sync {
    async fn fetch_whole(
        &self,
        url: &str,
        dest: &Path,
        progress: &ProgressCounter,
    ) -> Result<u64, DownloadError>;
}
