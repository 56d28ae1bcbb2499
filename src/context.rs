// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/context.rs - 运行配置
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

use std::path::{Path, PathBuf};

use tracing::warn;
use url::Url;

use crate::model::ClassifierConfig;

/// 默认训练数据文件名
pub const DATA_FILE_NAME: &str = "data.npz";

/// 启动时构造一次，之后以引用传递
#[derive(Debug, Clone)]
pub struct AppContext {
  pub base_dir: PathBuf,
  pub data_file: PathBuf,
  /// 未指定时使用内置语料
  pub corpus_file: Option<PathBuf>,
  /// 历史记录的默认导出目录
  pub export_dir: PathBuf,
  /// 指定时优先于导出目录
  pub export_url: Option<Url>,
  pub track_history: bool,
  pub classifier: ClassifierConfig,
}

impl AppContext {
  pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
    let base_dir = base_dir.into();
    AppContext {
      data_file: base_dir.join(DATA_FILE_NAME),
      corpus_file: None,
      export_dir: base_dir.clone(),
      export_url: None,
      track_history: true,
      classifier: ClassifierConfig::default(),
      base_dir,
    }
  }

  /// 以可执行文件所在目录为基准目录，取不到时退回当前目录
  pub fn from_executable_dir() -> Self {
    let base_dir = std::env::current_exe()
      .ok()
      .and_then(|exe| exe.parent().map(Path::to_path_buf))
      .unwrap_or_else(|| {
        warn!("无法确定可执行文件目录，使用当前目录");
        PathBuf::from(".")
      });
    Self::new(base_dir)
  }

  pub fn with_data_file<P: Into<PathBuf>>(mut self, data_file: P) -> Self {
    self.data_file = data_file.into();
    self
  }

  pub fn with_corpus_file<P: Into<PathBuf>>(mut self, corpus_file: P) -> Self {
    self.corpus_file = Some(corpus_file.into());
    self
  }

  pub fn with_export_dir<P: Into<PathBuf>>(mut self, export_dir: P) -> Self {
    self.export_dir = export_dir.into();
    self
  }

  pub fn with_export_url(mut self, export_url: Option<Url>) -> Self {
    self.export_url = export_url;
    self
  }

  pub fn with_track_history(mut self, track_history: bool) -> Self {
    self.track_history = track_history;
    self
  }

  pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
    self.classifier = classifier;
    self
  }
}
