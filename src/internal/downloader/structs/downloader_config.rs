use std::path::PathBuf;

/// 默认并发分段数
pub const DEFAULT_CONCURRENCY: usize = 4;

/// 默认拷贝缓冲区大小：32KB，分段写盘与合并共用
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// 分段数（并发数），构造时固定且不小于 1
    pub concurrency: usize,
    /// 写盘与合并时复用的缓冲区大小（字节）
    pub buffer_size: usize,
    /// 目标文件与临时目录所在目录
    pub output_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            output_dir: PathBuf::from("."),
        }
    }
}
