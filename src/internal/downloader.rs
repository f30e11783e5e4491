//! 下载器领域模块：分段规划、能力探测、分段下载、合并与单连接回退。
//!
//! 使用方式：`Downloader::new(4).output_dir(dir).download(url, None).await`
//! 对外导出以 [`crate::downloader`] 为准，此处仅做模块划分，不重复 pub use。

pub mod impl_traits;
pub mod structs;
pub mod traits;
