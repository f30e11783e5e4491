//! 下载相关错误类型。

use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("URL 无法解析 {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("无法从 URL 推断文件名: {0}")]
    NoFilename(String),

    /// 指定的文件名不是单个普通文件名（含路径分隔符、`..` 或为绝对路径）。
    #[error("文件名不合法: {0}")]
    InvalidFilename(String),

    /// 探测请求本身失败（网络、DNS、TLS）。
    #[error("探测请求失败: {0}")]
    Probe(#[source] reqwest::Error),

    #[error("探测返回非成功状态码: {status}")]
    ProbeStatus { status: StatusCode },

    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("服务器返回非成功状态码: {status}")]
    UnexpectedStatus { status: StatusCode },

    #[error("创建临时目录失败 {path}: {source}")]
    CreateTempDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("创建文件失败: {0}")]
    CreateFile(std::io::Error),

    #[error("写入文件失败: {0}")]
    WriteFile(tokio::io::Error),

    /// 任一分段失败；只列出自身失败的分段，被连带取消的分段不计入。
    #[error("分段下载失败: {}", format_failures(.0))]
    PartsFailed(Vec<PartFailure>),

    #[error("分段任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// 合并失败时目标文件可能只写了一部分。
    #[error("合并分段失败 {path}: {source}")]
    Merge {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// 单个分段失败的原因。
#[derive(Debug, Error)]
pub enum PartError {
    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("期望 206 Partial Content，实际为 {0}")]
    UnexpectedStatus(StatusCode),

    #[error("收到 {received} 字节，期望 {expected} 字节")]
    LengthMismatch { expected: u64, received: u64 },

    #[error("写入分段文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("已被取消")]
    Cancelled,
}

/// 失败分段：序号、区间与原因。
#[derive(Debug)]
pub struct PartFailure {
    pub index: usize,
    pub start: u64,
    pub end: u64,
    pub error: PartError,
}

impl fmt::Display for PartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}, {}): {}",
            self.index, self.start, self.end, self.error
        )
    }
}

fn format_failures(failures: &[PartFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
