use std::path::PathBuf;

/// 单次下载的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    /// 分段并发下载并合并完成
    Parallel {
        path: PathBuf,
        bytes: u64,
        /// 实际发起请求的分段数（空分段不计）
        parts: usize,
    },
    /// 服务器不支持 Range 或长度未知，整文件单连接下载
    SingleStream { path: PathBuf, bytes: u64 },
    /// 远程文件长度为 0，直接创建空文件
    Empty { path: PathBuf },
}

impl DownloadResult {
    /// 目标文件路径。
    pub fn path(&self) -> &PathBuf {
        match self {
            DownloadResult::Parallel { path, .. }
            | DownloadResult::SingleStream { path, .. }
            | DownloadResult::Empty { path } => path,
        }
    }

    /// 写入目标文件的字节数。
    pub fn bytes(&self) -> u64 {
        match self {
            DownloadResult::Parallel { bytes, .. }
            | DownloadResult::SingleStream { bytes, .. } => *bytes,
            DownloadResult::Empty { .. } => 0,
        }
    }
}
