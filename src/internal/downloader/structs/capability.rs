/// 探测结果：服务器是否支持分段请求，以及资源长度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// 状态码成功且 `Accept-Ranges: bytes` 时为 true
    pub supports_ranges: bool,
    /// `Content-Length` 解析失败、缺失或为负数时为 `None`
    pub content_length: Option<u64>,
}

impl Capability {
    /// 能否走分段并发下载（长度为 0 的情况由调用方单独处理）。
    pub fn is_range_capable(&self) -> bool {
        self.supports_ranges && self.content_length.is_some()
    }
}
