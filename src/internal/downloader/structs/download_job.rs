//! 单次下载任务：URL、目标文件名、并发数，以及临时目录与分段文件的命名规则。

use std::path::{Component, Path, PathBuf};

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::Url;

use super::download_error::DownloadError;

/// 一次 `download()` 调用对应的任务，调用结束即丢弃。
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: Url,
    pub filename: String,
    /// 固定的并发数（>= 1）
    pub concurrency: usize,
    /// 目标文件与临时目录所在目录
    pub output_dir: PathBuf,
}

impl DownloadJob {
    /// 解析 URL；未指定文件名时取 URL 路径的最后一段（百分号解码后）。
    ///
    /// 文件名必须是单个普通路径分量：含 `/`、`\`、`..` 或绝对路径的一律拒绝，
    /// 目标文件与临时目录因此始终落在 `output_dir` 之内。
    pub fn new(
        url: &str,
        filename: Option<&str>,
        concurrency: usize,
        output_dir: &Path,
    ) -> Result<Self, DownloadError> {
        let parsed = Url::parse(url).map_err(|source| DownloadError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let filename = match filename.filter(|f| !f.is_empty()) {
            Some(f) if is_plain_file_name(f) => f.to_string(),
            Some(f) => return Err(DownloadError::InvalidFilename(f.to_string())),
            None => filename_from_url(&parsed)
                .ok_or_else(|| DownloadError::NoFilename(url.to_string()))?,
        };

        Ok(Self {
            url: parsed,
            filename,
            concurrency: concurrency.max(1),
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// 最终输出文件路径。
    pub fn dest_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }

    /// 临时目录：文件名截断到第一个 `.` 之前（`archive.tar.gz` → `archive`）。
    ///
    /// 截断结果为空（以 `.` 开头）或等于文件名本身（没有 `.`，会和目标文件同名）时，
    /// 改用 `.parts-<sha256(文件名) 前 16 位>`。
    /// 注意：`archive.tar.gz` 与 `archive.zip` 同时下载会共用同一个临时目录。
    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir.join(temp_dir_name(&self.filename))
    }

    /// 分段文件路径：`<temp_dir>/<filename>-<index>`。
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.temp_dir().join(format!("{}-{}", self.filename, index))
    }
}

fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let decoded = percent_decode_str(last).decode_utf8().ok()?;
    let name = decoded.trim();
    is_plain_file_name(name).then(|| name.to_string())
}

/// 只允许单个 `Normal` 分量；`%2F` 解码出的分隔符同样拒绝。
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

pub(crate) fn temp_dir_name(filename: &str) -> String {
    let stem = filename.split('.').next().unwrap_or_default();
    if stem.is_empty() || stem == filename {
        let digest = Sha256::digest(filename.as_bytes());
        let hex: String = digest
            .iter()
            .take(8)
            .map(|b| format!("{:02x}", b))
            .collect();
        return format!(".parts-{}", hex);
    }
    stem.to_string()
}
