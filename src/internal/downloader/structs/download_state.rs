/// 下载状态（由下载器内部维护，外部通过 `state()` 只读监听）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadState {
    #[default]
    Idle,
    Probing,
    /// 创建临时目录并派发分段任务
    Dispatching,
    /// 服务器不支持 Range 或长度未知，走单连接下载
    SingleStream,
    /// 等待所有分段任务结束
    Waiting,
    Merging,
    Done,
    Failed,
}
