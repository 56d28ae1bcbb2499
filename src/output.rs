// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/output.rs - 输出定义
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

/// 将结果写到某处，返回实际写入的文件路径
pub trait Render<Output: ?Sized>: Sized {
  type Error;
  fn render_result(&self, result: &Output) -> Result<PathBuf, Self::Error>;
}

#[cfg(feature = "history_export")]
pub mod csv_record;

#[cfg(feature = "history_export")]
mod save_csv_file;
#[cfg(feature = "history_export")]
pub use self::save_csv_file::{SaveCsvFileError, SaveCsvFileOutput};

#[cfg(feature = "history_export")]
mod directory_record;
#[cfg(feature = "history_export")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[cfg(feature = "history_export")]
mod wrapper {
  use std::path::PathBuf;

  use thiserror::Error;
  use url::Url;

  use super::*;
  use crate::{FromUrl, FromUrlWithScheme, history::HistoryEntry};

  #[derive(Error, Debug)]
  pub enum OutputError {
    #[error("保存 CSV 文件错误: {0}")]
    SaveCsvFileError(#[from] SaveCsvFileError),
    #[error("目录记录输出错误: {0}")]
    DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
    #[error("URI 方案不匹配: {0}")]
    SchemeMismatch(String),
  }

  pub enum OutputWrapper {
    SaveCsvFileOutput(SaveCsvFileOutput),
    DirectoryRecordOutput(DirectoryRecordOutput),
  }

  impl FromUrl for OutputWrapper {
    type Error = OutputError;

    fn from_url(url: &Url) -> Result<Self, Self::Error> {
      match url.scheme() {
        SaveCsvFileOutput::SCHEME => {
          let output = SaveCsvFileOutput::from_url(url)?;
          Ok(OutputWrapper::SaveCsvFileOutput(output))
        }
        DirectoryRecordOutput::SCHEME => {
          let output = DirectoryRecordOutput::from_url(url)?;
          Ok(OutputWrapper::DirectoryRecordOutput(output))
        }
        other => Err(OutputError::SchemeMismatch(other.to_string())),
      }
    }
  }

  impl Render<[HistoryEntry]> for OutputWrapper {
    type Error = OutputError;

    fn render_result(&self, result: &[HistoryEntry]) -> Result<PathBuf, Self::Error> {
      match self {
        OutputWrapper::SaveCsvFileOutput(output) => output
          .render_result(result)
          .map_err(OutputError::from),
        OutputWrapper::DirectoryRecordOutput(output) => output
          .render_result(result)
          .map_err(OutputError::from),
      }
    }
  }

}

#[cfg(feature = "history_export")]
pub use self::wrapper::{OutputError, OutputWrapper};
