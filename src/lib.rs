/// 内部导出的模块
mod internal;


/// 分段并发下载：下载器、分段规划、探测、合并，以及单连接回退接口
pub mod downloader {
    use crate::internal;
    // 结构体模型
    pub use internal::downloader::structs::*;
    // 单连接下载：接口与默认实现
    pub use internal::downloader::impl_traits::impl_whole_fetch::HttpWholeFetch;
    pub use internal::downloader::traits::whole_fetch::WholeFetch;
}
