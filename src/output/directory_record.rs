// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/output/directory_record.rs - 按时间戳导出历史记录到目录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::{
  FromUrl, FromUrlWithScheme,
  history::HistoryEntry,
  output::{Render, csv_record},
  path_from_url,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("CSV 写入错误: {0}")]
  CsvError(#[from] csv::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 在目录下生成 `history_YYYYmmdd_HHMMSS.csv`
pub struct DirectoryRecordOutput {
  directory: PathBuf,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: path_from_url(uri),
    })
  }
}

impl DirectoryRecordOutput {
  pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn file_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    if !self.directory.as_os_str().is_empty() && !self.directory.exists() {
      std::fs::create_dir_all(&self.directory)?;
    }

    let now = Local::now();
    Ok(
      self
        .directory
        .join(format!("history_{}.csv", now.format("%Y%m%d_%H%M%S"))),
    )
  }
}

impl Render<[HistoryEntry]> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, result: &[HistoryEntry]) -> Result<PathBuf, Self::Error> {
    let path = self.file_path()?;
    csv_record::record(result, &path)?;
    info!("历史记录已写入目录: {}", path.display());
    Ok(path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{history::HistoryLog, model::Digit};

  #[test]
  fn file_name_embeds_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::new(dir.path().join("exports"));

    let mut log = HistoryLog::new();
    log.record(Digit::new(2).unwrap(), Digit::new(2).unwrap(), 88.0);
    let path = output.render_result(log.entries()).unwrap();

    assert_eq!(path.parent(), Some(output.directory()));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("history_"));
    assert!(name.ends_with(".csv"));
    // history_ + YYYYmmdd_HHMMSS + .csv
    assert_eq!(name.len(), "history_".len() + 15 + ".csv".len());
    assert!(path.exists());
  }

  #[test]
  fn folder_url_is_accepted() {
    let url = url::Url::parse("folder:///var/tmp/exports").unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.directory(), Path::new("/var/tmp/exports"));
  }
}
