//! 下载器测试：分段下载全流程、单连接回退、空文件、分段失败与取消、重复下载。
//!
//! 全部基于 wiremock 模拟服务器，输出目录用 `TempDir` 隔离。

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer};

use crate::downloader::{
    DownloadError, DownloadProgress, DownloadResult, DownloadState, Downloader, PartError,
    ProgressCounter, WholeFetch, plan_ranges,
};
use crate::tests::{RangeResponder, head_template, init_tracing, mount_range_server, random_body};

const FILE: &str = "/dist/archive.tar.gz";

fn url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), FILE)
}

// ═══════════════════════════ 分段下载 ═══════════════════════════

#[tokio::test]
async fn download_parallel_reassembles_resource() {
    let body = random_body(1_000_003);
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), true).await;
    let dir = TempDir::new().unwrap();

    let downloader = Downloader::new(4).output_dir(dir.path());
    let progress = downloader.progress();
    let state = downloader.state();
    let result = downloader.download(&url(&server), None).await.unwrap();

    let dest = dir.path().join("archive.tar.gz");
    assert_eq!(
        result,
        DownloadResult::Parallel {
            path: dest.clone(),
            bytes: body.len() as u64,
            parts: 4,
        }
    );
    assert_eq!(fs::read(&dest).unwrap(), body);
    assert!(!dir.path().join("archive").exists(), "临时目录应已删除");
    assert_eq!(*state.borrow(), DownloadState::Done);

    let p = progress.borrow().clone();
    assert_eq!(p.bytes_done, body.len() as u64);
    assert_eq!(p.total, Some(body.len() as u64));
    assert!((p.pct() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn download_sends_one_range_request_per_part() {
    let body = random_body(12_387);
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), true).await;
    let dir = TempDir::new().unwrap();

    Downloader::new(4)
        .output_dir(dir.path())
        .download(&url(&server), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let mut ranges: Vec<String> = requests
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .filter_map(|r| r.headers.get("range"))
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    ranges.sort();

    let mut expected: Vec<String> = plan_ranges(body.len() as u64, 4)
        .iter()
        .map(|r| r.header_value())
        .collect();
    expected.sort();
    assert_eq!(ranges, expected);
}

#[tokio::test]
async fn download_with_more_parts_than_bytes_skips_empty_parts() {
    let body = b"abc".to_vec();
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), true).await;
    let dir = TempDir::new().unwrap();

    let result = Downloader::new(8)
        .output_dir(dir.path())
        .download(&url(&server), Some("abc.txt"))
        .await
        .unwrap();

    match result {
        DownloadResult::Parallel { parts, bytes, .. } => {
            assert_eq!(parts, 3, "只有非空分段会发请求");
            assert_eq!(bytes, 3);
        }
        other => panic!("预期 Parallel，得到 {other:?}"),
    }
    assert_eq!(fs::read(dir.path().join("abc.txt")).unwrap(), body);
}

#[tokio::test]
async fn download_single_part_fetches_whole_range() {
    let body = random_body(4096);
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), true).await;
    let dir = TempDir::new().unwrap();

    let result = Downloader::new(1)
        .output_dir(dir.path())
        .download(&url(&server), None)
        .await
        .unwrap();

    assert!(matches!(result, DownloadResult::Parallel { parts: 1, .. }));
    assert_eq!(fs::read(result.path()).unwrap(), body);
}

#[tokio::test]
async fn download_twice_is_idempotent_and_overwrites_stale_parts() {
    let body = random_body(50_000);
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), true).await;
    let dir = TempDir::new().unwrap();
    let downloader = Downloader::new(3).output_dir(dir.path()).buffer_size(512);

    let first = downloader.download(&url(&server), None).await.unwrap();
    let first_bytes = fs::read(first.path()).unwrap();

    // 模拟上次异常退出留下的临时目录和脏分段
    let stale_dir = dir.path().join("archive");
    fs::create_dir_all(&stale_dir).unwrap();
    fs::write(stale_dir.join("archive.tar.gz-0"), vec![0u8; 99_999]).unwrap();

    let second = downloader.download(&url(&server), None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(second.path()).unwrap(), first_bytes);
    assert_eq!(first_bytes, body);
    assert!(!stale_dir.exists());
}

// ═══════════════════════════ 零长度 ═══════════════════════════

#[tokio::test]
async fn download_zero_length_creates_empty_file_without_fetching() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(head_template(&[], true))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder::new(Vec::new()))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let result = Downloader::new(4)
        .output_dir(dir.path())
        .download(&url(&server), None)
        .await
        .unwrap();

    let dest = dir.path().join("archive.tar.gz");
    assert_eq!(result, DownloadResult::Empty { path: dest.clone() });
    assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    assert!(!dir.path().join("archive").exists());
}

// ═══════════════════════════ 单连接回退 ═══════════════════════════

/// 记录是否被调用，并确认调用时没有临时目录。
struct RecordingWholeFetch {
    called: Arc<AtomicBool>,
    temp_dir: std::path::PathBuf,
    payload: Vec<u8>,
}

#[async_trait]
impl WholeFetch for RecordingWholeFetch {
    async fn fetch_whole(
        &self,
        _url: &str,
        dest: &Path,
        progress: &ProgressCounter,
    ) -> Result<u64, DownloadError> {
        assert!(!self.temp_dir.exists(), "单连接下载不应创建临时目录");
        self.called.store(true, Ordering::SeqCst);
        fs::write(dest, &self.payload).map_err(DownloadError::CreateFile)?;
        progress.add(self.payload.len() as u64);
        Ok(self.payload.len() as u64)
    }
}

#[tokio::test]
async fn download_without_accept_ranges_uses_whole_fetch() {
    init_tracing();
    let body = random_body(2048);
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(head_template(&body, false))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder::new(body.clone()))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let called = Arc::new(AtomicBool::new(false));

    let downloader = Downloader::new(4)
        .output_dir(dir.path())
        .with_whole_fetch(RecordingWholeFetch {
            called: Arc::clone(&called),
            temp_dir: dir.path().join("archive"),
            payload: body.clone(),
        });
    let progress = downloader.progress();
    let result = downloader.download(&url(&server), None).await.unwrap();

    assert!(called.load(Ordering::SeqCst), "应调用单连接下载");
    assert_eq!(
        *progress.borrow(),
        DownloadProgress {
            bytes_done: 2048,
            total: Some(2048),
        }
    );
    assert!(matches!(result, DownloadResult::SingleStream { bytes: 2048, .. }));
    assert_eq!(fs::read(result.path()).unwrap(), body);
}

#[tokio::test]
async fn download_fallback_default_streams_whole_body() {
    let body = random_body(70_000);
    let server = mount_range_server(FILE, RangeResponder::new(body.clone()), false).await;
    let dir = TempDir::new().unwrap();

    let downloader = Downloader::new(4).output_dir(dir.path());
    let progress = downloader.progress();
    let result = downloader.download(&url(&server), None).await.unwrap();

    assert!(matches!(result, DownloadResult::SingleStream { .. }));
    assert_eq!(fs::read(result.path()).unwrap(), body);

    let p = progress.borrow().clone();
    assert_eq!(p.bytes_done, body.len() as u64, "单连接下载也应推送进度");
    assert_eq!(p.total, Some(body.len() as u64));

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .filter(|r| r.method.as_str() == "GET")
            .all(|r| r.headers.get("range").is_none()),
        "单连接下载不应带 Range 头"
    );
}

// ═══════════════════════════ 失败与取消 ═══════════════════════════

#[tokio::test]
async fn download_part_failure_reports_range_and_cleans_up() {
    let body = random_body(40_000);
    let ranges = plan_ranges(body.len() as u64, 4);
    let failing = ranges[2];
    let responder = RangeResponder {
        truncate_start: Some(failing.start),
        ..RangeResponder::new(body)
    };
    let server = mount_range_server(FILE, responder, true).await;
    let dir = TempDir::new().unwrap();

    let downloader = Downloader::new(4).output_dir(dir.path());
    let state = downloader.state();
    let err = downloader.download(&url(&server), None).await.unwrap_err();

    match &err {
        DownloadError::PartsFailed(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].index, 2);
            assert_eq!((failures[0].start, failures[0].end), (failing.start, failing.end));
            assert!(matches!(failures[0].error, PartError::LengthMismatch { .. }));
        }
        other => panic!("预期 PartsFailed，得到 {other}"),
    }
    assert!(err.to_string().contains("#2"), "错误信息应包含分段序号: {err}");
    assert!(!dir.path().join("archive.tar.gz").exists(), "失败时不应生成目标文件");
    assert!(!dir.path().join("archive").exists(), "失败时也应删除临时目录");
    assert_eq!(*state.borrow(), DownloadState::Failed);
}

#[tokio::test]
async fn download_part_failure_cancels_slow_siblings() {
    let body = random_body(8_000);
    let ranges = plan_ranges(body.len() as u64, 4);
    let responder = RangeResponder {
        fail_start: Some(ranges[0].start),
        delay: Some(Duration::from_secs(30)),
        ..RangeResponder::new(body)
    };
    let server = mount_range_server(FILE, responder, true).await;
    let dir = TempDir::new().unwrap();

    let started = Instant::now();
    let err = Downloader::new(4)
        .output_dir(dir.path())
        .download(&url(&server), None)
        .await
        .unwrap_err();

    assert!(
        started.elapsed() < Duration::from_secs(10),
        "其余分段应被取消而不是等待超时"
    );
    match err {
        DownloadError::PartsFailed(failures) => {
            let indexes: Vec<usize> = failures.iter().map(|f| f.index).collect();
            assert_eq!(indexes, vec![0], "被取消的分段不计为失败");
            assert!(matches!(failures[0].error, PartError::UnexpectedStatus(_)));
        }
        other => panic!("预期 PartsFailed，得到 {other}"),
    }
    assert!(!dir.path().join("archive").exists());
}

#[tokio::test]
async fn download_dropped_mid_fetch_removes_temp_dir() {
    let body = random_body(8_000);
    let responder = RangeResponder {
        delay: Some(Duration::from_secs(30)),
        ..RangeResponder::new(body)
    };
    let server = mount_range_server(FILE, responder, true).await;
    let dir = TempDir::new().unwrap();
    let temp_dir = dir.path().join("archive");

    let downloader = Downloader::new(4).output_dir(dir.path());
    let mut state = downloader.state();
    let download_url = url(&server);
    let mut download = Box::pin(downloader.download(&download_url, None));

    // 等到分段已派发、临时目录已创建
    tokio::select! {
        _ = &mut download => panic!("分段响应被延迟，下载不应提前结束"),
        waited = state.wait_for(|s| *s == DownloadState::Waiting) => {
            waited.unwrap();
        }
    }
    assert!(temp_dir.exists(), "派发后应已创建临时目录");

    drop(download);
    assert!(!temp_dir.exists(), "下载 future 被丢弃后也应删除临时目录");
}

#[tokio::test]
async fn download_probe_failure_is_surfaced() {
    let dir = TempDir::new().unwrap();
    let downloader = Downloader::new(2).output_dir(dir.path());
    let err = downloader
        .download("http://127.0.0.1:1/archive.tar.gz", None)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Probe(_)), "实际: {err}");
    assert_eq!(*downloader.state().borrow(), DownloadState::Failed);
}

#[test]
fn downloader_zero_concurrency_is_clamped() {
    assert_eq!(Downloader::new(0).config().concurrency, 1);
    assert_eq!(Downloader::default().config().concurrency, 4);
}
