// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/dataset/store.rs - 训练数据持久化
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

use std::{
  fs::File,
  io::{BufReader, BufWriter, Read, Seek, Write},
  path::{Path, PathBuf},
};

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, DatasetError};

/// 特征矩阵在归档中的名字
const FEATURES_ARRAY: &str = "X";
/// 标签向量在归档中的名字
const LABELS_ARRAY: &str = "y";

/// 训练数据存储
///
/// 数据保存为 NumPy `.npz` 归档，包含特征矩阵 `X`（float64，已归一化）
/// 与标签向量 `y`（写入 int64，读取时也接受 int32）。文件不存在时使用基础语料。
#[derive(Debug, Clone)]
pub struct DatasetStore {
  data_file: PathBuf,
  base: Dataset,
}

impl DatasetStore {
  pub fn new<P: Into<PathBuf>>(data_file: P, base: Dataset) -> Self {
    Self {
      data_file: data_file.into(),
      base,
    }
  }

  pub fn data_file(&self) -> &Path {
    &self.data_file
  }

  pub fn base(&self) -> &Dataset {
    &self.base
  }

  pub fn base_len(&self) -> usize {
    self.base.len()
  }

  pub fn has_persisted(&self) -> bool {
    self.data_file.exists()
  }

  pub fn load(&self) -> Result<Dataset, DatasetError> {
    if !self.has_persisted() {
      info!("未找到训练数据文件，使用基础语料: {} 条样本", self.base.len());
      return Ok(self.base.clone());
    }

    let file = File::open(&self.data_file)?;
    let mut npz = NpzReader::new(BufReader::new(file))?;
    let names = npz.names()?;

    let features: Array2<f64> = npz.by_name(&member_name(&names, FEATURES_ARRAY)?)?;
    let labels = read_labels(&mut npz, &member_name(&names, LABELS_ARRAY)?)?;
    let dataset = Dataset::from_raw_labels(features, &labels)?;

    info!(
      "已读取训练数据 {}: {} 条样本",
      self.data_file.display(),
      dataset.len()
    );
    Ok(dataset)
  }

  /// 整体覆盖写入当前数据集
  pub fn persist(&self, dataset: &Dataset) -> Result<(), DatasetError> {
    if let Some(parent) = self.data_file.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let labels = Array1::from_vec(dataset.raw_labels());
    let file = File::create(&self.data_file)?;
    let mut npz = NpzWriter::new(BufWriter::new(file));
    npz.add_array(FEATURES_ARRAY, dataset.features())?;
    npz.add_array(LABELS_ARRAY, &labels)?;
    npz.finish()?.flush()?;

    info!(
      "已保存训练数据 {}: {} 条样本",
      self.data_file.display(),
      dataset.len()
    );
    Ok(())
  }

  /// 删除持久化文件，恢复基础语料
  pub fn reset(&self) -> Result<Dataset, DatasetError> {
    if self.has_persisted() {
      std::fs::remove_file(&self.data_file)?;
      warn!("已删除训练数据文件: {}", self.data_file.display());
    }
    Ok(self.base.clone())
  }
}

/// 标签按 int64 读取，不是 int64 时再按 int32 读取
fn read_labels<R: Read + Seek>(
  npz: &mut NpzReader<R>,
  name: &str,
) -> Result<Vec<i64>, DatasetError> {
  let wide: Result<Array1<i64>, ReadNpzError> = npz.by_name(name);
  match wide {
    Ok(labels) => Ok(labels.to_vec()),
    Err(err) => {
      let narrow: Array1<i32> = npz.by_name(name).map_err(|_| err)?;
      debug!("标签为 int32，按 int64 使用");
      Ok(narrow.iter().map(|&label| label as i64).collect())
    }
  }
}

/// 兼容带或不带 `.npy` 后缀的成员名
fn member_name(names: &[String], array: &str) -> Result<String, DatasetError> {
  let with_suffix = format!("{}.npy", array);
  names
    .iter()
    .find(|name| name.as_str() == array || *name == &with_suffix)
    .cloned()
    .ok_or_else(|| DatasetError::MissingArray(array.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    dataset::LabeledSample,
    feature::{FEATURE_LEN, FeatureVector},
    model::Digit,
  };

  fn base() -> Dataset {
    let mut dataset = Dataset::empty();
    for label in 0..3u8 {
      let features = FeatureVector::from([label as f64 / 2.0; FEATURE_LEN]);
      dataset
        .append(LabeledSample::new(features, Digit::new(label).unwrap()))
        .unwrap();
    }
    dataset
  }

  #[test]
  fn load_without_file_returns_base() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("data.npz"), base());
    assert!(!store.has_persisted());
    assert_eq!(store.load().unwrap(), base());
  }

  #[test]
  fn persist_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("nested").join("data.npz"), base());

    let mut dataset = store.load().unwrap();
    let mut features = FeatureVector::default();
    features.as_mut()[10] = 1.5;
    let appended = LabeledSample::new(features, Digit::new(7).unwrap());
    dataset.append(appended).unwrap();
    store.persist(&dataset).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), base().len() + 1);
    assert_eq!(reloaded.last(), Some(appended));
    assert_eq!(reloaded, dataset);
  }

  #[test]
  fn reset_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("data.npz"), base());
    let mut dataset = base();
    dataset
      .append(LabeledSample::new(FeatureVector::default(), Digit::new(1).unwrap()))
      .unwrap();
    store.persist(&dataset).unwrap();
    assert!(store.has_persisted());

    let restored = store.reset().unwrap();
    assert!(!store.has_persisted());
    assert_eq!(restored.len(), store.base_len());
    // 再次重置不报错
    assert!(store.reset().is_ok());
  }

  #[test]
  fn corrupted_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.npz");
    std::fs::write(&path, b"definitely not a zip archive").unwrap();
    let store = DatasetStore::new(path, base());
    assert!(store.load().is_err());
  }

  #[test]
  fn int32_labels_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.npz");
    let mut features = Array2::<f64>::zeros((2, FEATURE_LEN));
    features[[1, 3]] = 0.25;
    let labels = Array1::from_vec(vec![4i32, 9]);

    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("X", &features).unwrap();
    npz.add_array("y", &labels).unwrap();
    npz.finish().unwrap();

    let store = DatasetStore::new(path, base());
    let dataset = store.load().unwrap();
    assert_eq!(dataset.raw_labels(), vec![4, 9]);
    assert_eq!(dataset.features()[[1, 3]], 0.25);
  }

  #[test]
  fn float_labels_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.npz");
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("X", &Array2::<f64>::zeros((1, FEATURE_LEN))).unwrap();
    npz.add_array("y", &Array1::from_vec(vec![1.0f64])).unwrap();
    npz.finish().unwrap();

    let store = DatasetStore::new(path, base());
    assert!(matches!(store.load(), Err(DatasetError::ReadArchive(_))));
  }

  #[test]
  fn member_names_accept_npy_suffix() {
    let names = vec!["X.npy".to_string(), "y".to_string()];
    assert_eq!(member_name(&names, "X").unwrap(), "X.npy");
    assert_eq!(member_name(&names, "y").unwrap(), "y");
    assert!(matches!(
      member_name(&names, "z"),
      Err(DatasetError::MissingArray(_))
    ));
  }
}
