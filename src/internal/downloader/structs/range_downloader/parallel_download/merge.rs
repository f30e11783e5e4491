//! 分段合并：按序号把分段文件拼接到目标文件，拷完一段删一段。

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::internal::downloader::structs::{DownloadError, DownloadJob};

/// 按 `0..concurrency` 顺序合并分段，返回目标文件字节数。
///
/// 不存在的分段文件（空分段）按空处理。任一分段读失败或目标写失败即中止，
/// 此时目标文件可能只写了一部分。
pub async fn merge_parts(job: &DownloadJob, buffer_size: usize) -> Result<u64, DownloadError> {
    let dest_path = job.dest_path();
    let mut dest = File::create(&dest_path)
        .await
        .map_err(|source| merge_error(&dest_path, source))?;

    // 所有分段共用一个缓冲区
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut written: u64 = 0;

    for index in 0..job.concurrency {
        let part_path = job.part_path(index);
        let mut part = match File::open(&part_path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(index, "分段文件不存在，按空分段处理");
                continue;
            }
            Err(source) => return Err(merge_error(&part_path, source)),
        };

        loop {
            let n = part
                .read(&mut buf)
                .await
                .map_err(|source| merge_error(&part_path, source))?;
            if n == 0 {
                break;
            }
            dest.write_all(&buf[..n])
                .await
                .map_err(|source| merge_error(&dest_path, source))?;
            written += n as u64;
        }
        drop(part);

        if let Err(e) = fs::remove_file(&part_path).await {
            warn!(path = %part_path.display(), error = %e, "删除分段文件失败");
        }
    }

    dest.flush()
        .await
        .map_err(|source| merge_error(&dest_path, source))?;

    Ok(written)
}

fn merge_error(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Merge {
        path: path.to_path_buf(),
        source,
    }
}
