// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/output/save_csv_file.rs - 保存历史记录到指定文件
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  history::HistoryEntry,
  output::{Render, csv_record},
  path_from_url,
};

pub struct SaveCsvFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveCsvFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("CSV 写入错误: {0}")]
  CsvError(#[from] csv::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveCsvFileOutput {
  const SCHEME: &'static str = "csv";
}

impl FromUrl for SaveCsvFileOutput {
  type Error = SaveCsvFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveCsvFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveCsvFileOutput {
      path: path_from_url(uri),
    })
  }
}

impl SaveCsvFileOutput {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self { path: path.into() }
  }
}

impl Render<[HistoryEntry]> for SaveCsvFileOutput {
  type Error = SaveCsvFileError;

  fn render_result(&self, result: &[HistoryEntry]) -> Result<PathBuf, Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    csv_record::record(result, &self.path)?;
    info!("保存历史记录到文件: {}", self.path.display());

    Ok(self.path.clone())
  }
}
