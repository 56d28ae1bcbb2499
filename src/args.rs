// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/args.rs - 命令行公共参数
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

use clap::Args;
use url::Url;

use crate::{
  context::AppContext,
  model::{ClassifierConfig, DEFAULT_C, DEFAULT_GAMMA},
};

/// 各个程序共用的参数
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
  /// 基准目录，默认为可执行文件所在目录
  #[arg(long, value_name = "DIR")]
  pub base_dir: Option<PathBuf>,

  /// 训练数据文件（.npz），默认为 <基准目录>/data.npz
  #[arg(long, value_name = "FILE")]
  pub data_file: Option<PathBuf>,

  /// 基础语料（CSV，每行 64 个像素值加一个标签），默认使用内置语料
  #[arg(long, value_name = "FILE")]
  pub corpus: Option<PathBuf>,

  /// 历史记录导出位置
  /// 支持格式:
  /// - 目录: folder:///path/to/dir
  /// - 文件: csv:///path/to/history.csv
  #[arg(long, value_name = "URL")]
  pub export: Option<Url>,

  /// 不记录修正历史
  #[arg(long)]
  pub no_history: bool,

  /// SVM 惩罚系数 C
  #[arg(long, default_value_t = DEFAULT_C, value_name = "C")]
  pub c: f64,

  /// RBF 核系数 gamma
  #[arg(long, default_value_t = DEFAULT_GAMMA, value_name = "GAMMA")]
  pub gamma: f64,

  /// 以 JSON 格式输出结果
  #[arg(long)]
  pub json: bool,
}

impl ContextArgs {
  pub fn to_context(&self) -> AppContext {
    let mut context = match &self.base_dir {
      Some(dir) => AppContext::new(dir),
      None => AppContext::from_executable_dir(),
    };
    if let Some(data_file) = &self.data_file {
      context = context.with_data_file(data_file);
    }
    if let Some(corpus) = &self.corpus {
      context = context.with_corpus_file(corpus);
    }
    context
      .with_export_url(self.export.clone())
      .with_track_history(!self.no_history)
      .with_classifier(ClassifierConfig {
        c: self.c,
        gamma: self.gamma,
      })
  }
}
