pub mod byte_range;
pub mod capability;
pub mod download_error;
pub mod download_job;
pub mod download_progress;
pub mod download_result;
pub mod download_state;
pub mod downloader_config;
pub mod range_downloader;

// 重导出公共类型
pub use byte_range::{ByteRange, plan_ranges};
pub use capability::Capability;
pub use download_error::{DownloadError, PartError, PartFailure};
pub use download_job::DownloadJob;
pub use download_progress::{DownloadProgress, ProgressCounter};
pub use download_result::DownloadResult;
pub use download_state::DownloadState;
pub use downloader_config::{DEFAULT_BUFFER_SIZE, DEFAULT_CONCURRENCY, DownloaderConfig};
pub use range_downloader::{Downloader, FetchRangeParams, fetch_range, merge_parts, probe};
