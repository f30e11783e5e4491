//! 分段规划：把 `[0, total)` 切成与并发数等长的连续区间。

/// 单个分段：半开区间 `[start, end)`，`index` 决定合并顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// 分段序号（从 0 开始）
    pub index: usize,
    /// 起始偏移（含）
    pub start: u64,
    /// 结束偏移（不含）
    pub end: u64,
}

impl ByteRange {
    /// 分段字节数；空分段为 0。
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// 空分段不发请求，也不产生分段文件。
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// 生成 Range 请求头：`bytes=start-(end-1)`，线上格式的上界是闭区间。
    pub fn header_value(&self) -> String {
        let end_inclusive = self.end.saturating_sub(1);
        format!("bytes={}-{}", self.start, end_inclusive)
    }
}

/// 按并发数规划分段。
///
/// `part_size = total / concurrency`，除最后一段外每段宽 `part_size + 1`，
/// 最后一段强制结束于 `total`。起止都截断到 `total`，所以并发数大于长度时
/// 末尾若干段为空区间，而不会出现负宽度或重叠。返回长度恒等于 `max(concurrency, 1)`。
pub fn plan_ranges(total: u64, concurrency: usize) -> Vec<ByteRange> {
    let concurrency = concurrency.max(1);
    let part_size = total / concurrency as u64;
    let width = part_size.saturating_add(1);

    (0..concurrency)
        .map(|index| {
            let start = (index as u64).saturating_mul(width).min(total);
            let end = if index == concurrency - 1 {
                total
            } else {
                start.saturating_add(width).min(total)
            };
            ByteRange { index, start, end }
        })
        .collect()
}
