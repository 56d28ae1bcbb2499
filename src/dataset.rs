// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/dataset.rs - 训练数据集
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

use std::collections::BTreeSet;

use ndarray::{Array2, ArrayView1};
use thiserror::Error;

use crate::{
  feature::{FEATURE_LEN, FeatureVector},
  model::{Digit, LabelError},
};

mod corpus;
mod store;
pub use self::corpus::{BaseCorpus, CorpusError};
pub use self::store::DatasetStore;

#[derive(Error, Debug)]
pub enum DatasetError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("读取训练数据文件失败: {0}")]
  ReadArchive(#[from] ndarray_npy::ReadNpzError),
  #[error("写入训练数据文件失败: {0}")]
  WriteArchive(#[from] ndarray_npy::WriteNpzError),
  #[error("训练数据文件中缺少数组 {0:?}")]
  MissingArray(String),
  #[error("特征维度不匹配: 期望 {expected}, 实际 {actual}")]
  FeatureWidth { expected: usize, actual: usize },
  #[error("特征矩阵行数 {rows} 与标签数 {labels} 不一致")]
  LengthMismatch { rows: usize, labels: usize },
  #[error("数据集中的标签无效: {0}")]
  InvalidLabel(#[from] LabelError),
  #[error("数组形状错误: {0}")]
  Shape(#[from] ndarray::ShapeError),
  #[error("基础语料错误: {0}")]
  Corpus(#[from] CorpusError),
}

/// 一条带标签的样本，创建后不可修改
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledSample {
  features: FeatureVector,
  label: Digit,
}

impl LabeledSample {
  pub fn new(features: FeatureVector, label: Digit) -> Self {
    Self { features, label }
  }

  pub fn features(&self) -> &FeatureVector {
    &self.features
  }

  pub fn label(&self) -> Digit {
    self.label
  }
}

/// 只追加的样本集合，特征以行优先矩阵保存
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
  features: Array2<f64>,
  labels: Vec<Digit>,
}

impl Dataset {
  pub fn empty() -> Self {
    Dataset {
      features: Array2::zeros((0, FEATURE_LEN)),
      labels: Vec::new(),
    }
  }

  pub fn new(features: Array2<f64>, labels: Vec<Digit>) -> Result<Self, DatasetError> {
    if features.ncols() != FEATURE_LEN {
      return Err(DatasetError::FeatureWidth {
        expected: FEATURE_LEN,
        actual: features.ncols(),
      });
    }
    if features.nrows() != labels.len() {
      return Err(DatasetError::LengthMismatch {
        rows: features.nrows(),
        labels: labels.len(),
      });
    }
    Ok(Dataset { features, labels })
  }

  /// 从原始整数标签构造，逐个校验标签范围
  pub fn from_raw_labels(features: Array2<f64>, labels: &[i64]) -> Result<Self, DatasetError> {
    let labels = labels
      .iter()
      .map(|&l| Digit::try_from(l))
      .collect::<Result<Vec<_>, _>>()?;
    Dataset::new(features, labels)
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

  pub fn raw_labels(&self) -> Vec<i64> {
    self.labels.iter().map(|&l| i64::from(l)).collect()
  }

  pub fn distinct_labels(&self) -> BTreeSet<Digit> {
    self.labels.iter().copied().collect()
  }

  pub fn sample(&self, index: usize) -> Option<LabeledSample> {
    let label = *self.labels.get(index)?;
    let row = self.features.row(index).to_vec();
    let features = FeatureVector::try_from(row.as_slice()).ok()?;
    Some(LabeledSample::new(features, label))
  }

  pub fn last(&self) -> Option<LabeledSample> {
    self.len().checked_sub(1).and_then(|i| self.sample(i))
  }

  /// 追加一条样本，数据集恰好增长一行
  pub fn append(&mut self, sample: LabeledSample) -> Result<(), DatasetError> {
    self
      .features
      .push_row(ArrayView1::from(sample.features.as_slice()))?;
    self.labels.push(sample.label);
    Ok(())
  }

  /// 返回追加了样本的新数据集，自身不变
  pub fn with_sample(&self, sample: LabeledSample) -> Result<Self, DatasetError> {
    let mut candidate = self.clone();
    candidate.append(sample)?;
    Ok(candidate)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample(value: f64, label: u8) -> LabeledSample {
    LabeledSample::new(
      FeatureVector::from([value; FEATURE_LEN]),
      Digit::new(label).unwrap(),
    )
  }

  #[test]
  fn append_grows_by_one() {
    let mut dataset = Dataset::empty();
    dataset.append(sample(0.5, 3)).unwrap();
    dataset.append(sample(0.25, 8)).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.features().dim(), (2, FEATURE_LEN));
    assert_eq!(dataset.last(), Some(sample(0.25, 8)));
    assert_eq!(dataset.sample(0), Some(sample(0.5, 3)));
    assert_eq!(dataset.sample(2), None);
  }

  #[test]
  fn with_sample_leaves_original_untouched() {
    let dataset = Dataset::empty();
    let candidate = dataset.with_sample(sample(1.0, 1)).unwrap();
    assert!(dataset.is_empty());
    assert_eq!(candidate.len(), 1);
  }

  #[test]
  fn new_checks_shape() {
    let wrong_width = Array2::<f64>::zeros((2, 10));
    assert!(matches!(
      Dataset::new(wrong_width, vec![Digit::new(0).unwrap(); 2]),
      Err(DatasetError::FeatureWidth { actual: 10, .. })
    ));

    let features = Array2::<f64>::zeros((3, FEATURE_LEN));
    assert!(matches!(
      Dataset::new(features, vec![Digit::new(0).unwrap(); 2]),
      Err(DatasetError::LengthMismatch { rows: 3, labels: 2 })
    ));
  }

  #[test]
  fn raw_labels_are_validated() {
    let features = Array2::<f64>::zeros((2, FEATURE_LEN));
    assert!(matches!(
      Dataset::from_raw_labels(features.clone(), &[1, 12]),
      Err(DatasetError::InvalidLabel(LabelError::OutOfRange(12)))
    ));
    let dataset = Dataset::from_raw_labels(features, &[1, 9]).unwrap();
    assert_eq!(dataset.raw_labels(), vec![1, 9]);
    assert_eq!(dataset.distinct_labels().len(), 2);
  }
}
