//! 单连接整文件下载：普通 GET，流式写入目标文件。

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::internal::downloader::structs::{DownloadError, ProgressCounter};
use crate::internal::downloader::traits::whole_fetch::WholeFetch;

/// 基于 reqwest 的单连接下载。
#[derive(Debug, Clone, Default)]
pub struct HttpWholeFetch {
    client: Client,
}

impl HttpWholeFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WholeFetch for HttpWholeFetch {
    async fn fetch_whole(
        &self,
        url: &str,
        dest: &Path,
        progress: &ProgressCounter,
    ) -> Result<u64, DownloadError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::UnexpectedStatus { status });
        }

        let mut file = File::create(dest).await.map_err(DownloadError::CreateFile)?;
        let mut stream = resp.bytes_stream();
        let mut bytes_done: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            bytes_done += chunk.len() as u64;
            file.write_all(&chunk).await.map_err(DownloadError::WriteFile)?;
            progress.add(chunk.len() as u64);
        }

        file.flush().await.map_err(DownloadError::WriteFile)?;
        debug!(url, bytes = bytes_done, "单连接下载完成");
        Ok(bytes_done)
    }
}
