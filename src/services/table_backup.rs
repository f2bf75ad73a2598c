// テーブルバックアップサービス
//
// 変更適用前の実テーブル定義（DDL）をタイムスタンプ付きファイルに保存し、
// 保持期間を過ぎたファイルを削除します。

use crate::core::config::BackupConfig;
use crate::core::error::IoError;
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// ファイル名のタイムスタンプ形式
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// テーブルバックアップサービス
#[derive(Debug, Clone)]
pub struct BackupService {
    config: BackupConfig,
}

impl BackupService {
    pub fn new(config: BackupConfig) -> Self {
        Self { config }
    }

    /// 実行前にバックアップを取るかどうか
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.backup_before_execution
    }

    /// 出力先ディレクトリ
    pub fn directory(&self) -> &Path {
        &self.config.backup_directory
    }

    /// テーブル定義のスナップショットを書き出す
    ///
    /// ファイル名は `<table>_<yyyyMMddHHmmss>.sql` です。
    /// 同じ秒に既存のファイルがある場合は `-1`, `-2` ... を付けて既存のファイルを残します。
    pub fn write_snapshot(
        &self,
        table: &str,
        statements: &[String],
        now: DateTime<Local>,
    ) -> Result<PathBuf, IoError> {
        let directory = self.directory();
        fs::create_dir_all(directory).map_err(|e| IoError::Directory {
            path: directory.display().to_string(),
            cause: e.to_string(),
        })?;

        let mut content = format!(
            "-- Snapshot of table {} taken at {}\n\n",
            table,
            now.to_rfc3339()
        );
        for statement in statements {
            content.push_str(statement.trim_end_matches(';'));
            content.push_str(";\n\n");
        }

        let stem = format!("{}_{}", sanitize(table), now.format(TIMESTAMP_FORMAT));
        let path = create_unique(directory, &stem, content.as_bytes())?;

        info!(table = %table, file = %path.display(), "Wrote table backup");
        Ok(path)
    }

    /// 保持期間を過ぎたバックアップを削除（保持日数0の場合は何もしない）
    ///
    /// # Returns
    ///
    /// 削除したファイル数
    pub fn purge_expired(&self, now: DateTime<Local>) -> Result<usize, IoError> {
        if self.config.retention_days == 0 {
            return Ok(0);
        }

        let directory = self.directory();
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(IoError::Directory {
                    path: directory.display().to_string(),
                    cause: e.to_string(),
                })
            }
        };

        let cutoff = now.naive_local() - Duration::days(i64::from(self.config.retention_days));
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(taken_at) = snapshot_time(&path) else {
                continue;
            };
            if taken_at >= cutoff {
                continue;
            }
            fs::remove_file(&path).map_err(|e| IoError::FileWrite {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?;
            debug!(file = %path.display(), "Purged expired backup");
            removed += 1;
        }

        Ok(removed)
    }
}

/// 既存のファイルを上書きせずに書き出す
fn create_unique(directory: &Path, stem: &str, content: &[u8]) -> Result<PathBuf, IoError> {
    let mut counter = 0u32;
    loop {
        let file_name = if counter == 0 {
            format!("{}.sql", stem)
        } else {
            format!("{}-{}.sql", stem, counter)
        };
        let path = directory.join(file_name);

        let written = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| file.write_all(content));
        match written {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(e) => {
                return Err(IoError::FileWrite {
                    path: path.display().to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }
}

/// ファイル名からスナップショット時刻を取得
fn snapshot_time(path: &Path) -> Option<NaiveDateTime> {
    if path.extension().and_then(|e| e.to_str()) != Some("sql") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (_, timestamp) = stem.rsplit_once('_')?;
    let timestamp = timestamp.split('-').next()?;
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}

/// ファイル名に使えない文字を置き換える
fn sanitize(table: &str) -> String {
    table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
