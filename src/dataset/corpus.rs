// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/dataset/corpus.rs - 基础手写数字语料
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

use std::{io::Read, path::Path};

use ndarray::Array2;
use thiserror::Error;
use tracing::{error, info};

use crate::{
  dataset::{Dataset, DatasetError},
  feature::{FEATURE_LEN, MAX_LEVEL},
  model::{Digit, ScalingError, ScalingModel},
};

#[derive(Error, Debug)]
pub enum CorpusError {
  #[error("无法读取语料文件 {path}: {source}")]
  Open {
    path: String,
    #[source]
    source: csv::Error,
  },
  #[error("语料解析错误: {0}")]
  Csv(#[from] csv::Error),
  #[error("第 {line} 行: 期望 {expected} 列, 实际 {actual} 列")]
  Width {
    line: u64,
    expected: usize,
    actual: usize,
  },
  #[error("第 {line} 行第 {column} 列: 无效数值 {value:?}")]
  Value { line: u64, column: usize, value: String },
  #[error("第 {line} 行: 无效标签 {value:?}")]
  Label { line: u64, value: String },
  #[error("语料为空")]
  Empty,
  #[error("归一化失败: {0}")]
  Scaling(#[from] ScalingError),
}

/// 随程序一起发布的语料，与标准 digits 语料同规模（1797 条，10 类）
const EMBEDDED_CORPUS: &str = include_str!("../../data/digits.csv");

/// 基础语料：未归一化的 8x8 特征（0-16）与标签
///
/// 文件格式与标准 digits 语料一致：无表头，逗号分隔，
/// 每行 64 个特征后跟 1 个标签，数值可写作整数或浮点数。
#[derive(Debug, Clone)]
pub struct BaseCorpus {
  features: Array2<f64>,
  labels: Vec<Digit>,
}

impl BaseCorpus {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
    let path = path.as_ref();
    info!("加载基础语料: {}", path.display());
    let reader = csv::ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .trim(csv::Trim::All)
      .from_path(path)
      .map_err(|source| {
        error!("无法打开语料文件 {}: {}", path.display(), source);
        CorpusError::Open {
          path: path.display().to_string(),
          source,
        }
      })?;
    Self::parse(reader)
  }

  /// 读取内置语料
  pub fn embedded() -> Result<Self, CorpusError> {
    info!("加载内置基础语料");
    Self::from_reader(EMBEDDED_CORPUS.as_bytes())
  }

  /// 指定了文件就读文件，否则使用内置语料
  pub fn open(path: Option<&Path>) -> Result<Self, CorpusError> {
    match path {
      Some(path) => Self::load(path),
      None => Self::embedded(),
    }
  }

  pub fn from_reader<R: Read>(reader: R) -> Result<Self, CorpusError> {
    let reader = csv::ReaderBuilder::new()
      .has_headers(false)
      .flexible(true)
      .trim(csv::Trim::All)
      .from_reader(reader);
    Self::parse(reader)
  }

  fn parse<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, CorpusError> {
    let mut data = Vec::new();
    let mut labels = Vec::new();

    for (index, record) in reader.records().enumerate() {
      let record = record?;
      let line = record
        .position()
        .map(|p| p.line())
        .unwrap_or(index as u64 + 1);

      if record.iter().all(|cell| cell.is_empty()) {
        continue;
      }
      if record.len() != FEATURE_LEN + 1 {
        return Err(CorpusError::Width {
          line,
          expected: FEATURE_LEN + 1,
          actual: record.len(),
        });
      }

      for (column, cell) in record.iter().take(FEATURE_LEN).enumerate() {
        let value = cell
          .parse::<f64>()
          .ok()
          .filter(|v| (0.0..=MAX_LEVEL as f64).contains(v))
          .ok_or_else(|| CorpusError::Value {
            line,
            column: column + 1,
            value: cell.to_string(),
          })?;
        data.push(value);
      }

      let cell = &record[FEATURE_LEN];
      let label = cell
        .parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0)
        .and_then(|v| Digit::try_from(v as i64).ok())
        .ok_or_else(|| CorpusError::Label {
          line,
          value: cell.to_string(),
        })?;
      labels.push(label);
    }

    if labels.is_empty() {
      return Err(CorpusError::Empty);
    }

    let features = Array2::from_shape_vec((labels.len(), FEATURE_LEN), data)
      .map_err(|_| CorpusError::Empty)?;
    info!("基础语料加载完成: {} 条样本", labels.len());
    Ok(BaseCorpus { features, labels })
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn features(&self) -> &Array2<f64> {
    &self.features
  }

  pub fn labels(&self) -> &[Digit] {
    &self.labels
  }

  /// 在语料上拟合归一化模型
  pub fn fit_scaler(&self) -> Result<ScalingModel, CorpusError> {
    Ok(ScalingModel::fit(self.features.view())?)
  }

  /// 用给定归一化模型生成初始数据集
  pub fn to_dataset(&self, scaler: &ScalingModel) -> Result<Dataset, DatasetError> {
    let scaled = scaler
      .transform_matrix(self.features.view())
      .map_err(CorpusError::from)?;
    Dataset::new(scaled, self.labels.clone())
  }
}
