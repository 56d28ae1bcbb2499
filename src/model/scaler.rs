// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/model/scaler.rs - 最小最大值归一化
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

use ndarray::{Array2, ArrayView2, Axis, Zip};
use thiserror::Error;
use tracing::debug;

use crate::feature::{FEATURE_LEN, FeatureVector};

#[derive(Error, Debug, PartialEq)]
pub enum ScalingError {
  #[error("无法在空数据上拟合归一化模型")]
  EmptyData,
  #[error("特征维度不匹配: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch { expected: usize, actual: usize },
}

/// 按特征的最小最大值归一化
///
/// 只在基础语料上拟合一次，之后数据集增长也不再重新拟合，
/// 因此新样本变换后的取值可能超出 [0, 1]。
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingModel {
  data_min: [f64; FEATURE_LEN],
  scale: [f64; FEATURE_LEN],
}

impl ScalingModel {
  pub fn fit(features: ArrayView2<f64>) -> Result<Self, ScalingError> {
    let (rows, cols) = features.dim();
    if cols != FEATURE_LEN {
      return Err(ScalingError::ShapeMismatch {
        expected: FEATURE_LEN,
        actual: cols,
      });
    }
    if rows == 0 {
      return Err(ScalingError::EmptyData);
    }

    let mut data_min = [0.0; FEATURE_LEN];
    let mut scale = [1.0; FEATURE_LEN];
    for (i, column) in features.axis_iter(Axis(1)).enumerate() {
      let min = column.iter().copied().fold(f64::INFINITY, f64::min);
      let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
      let range = max - min;
      data_min[i] = min;
      // 常数列不缩放
      scale[i] = if range > 0.0 { 1.0 / range } else { 1.0 };
    }

    debug!("归一化模型拟合完成，样本数: {}", rows);
    Ok(ScalingModel { data_min, scale })
  }

  pub fn data_min(&self) -> &[f64] {
    &self.data_min
  }

  pub fn scale(&self) -> &[f64] {
    &self.scale
  }

  pub fn transform(&self, feature: &FeatureVector) -> FeatureVector {
    let mut scaled = *feature;
    for ((value, min), scale) in scaled
      .as_mut()
      .iter_mut()
      .zip(self.data_min.iter())
      .zip(self.scale.iter())
    {
      *value = (*value - min) * scale;
    }
    scaled
  }

  pub fn transform_matrix(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, ScalingError> {
    if features.ncols() != FEATURE_LEN {
      return Err(ScalingError::ShapeMismatch {
        expected: FEATURE_LEN,
        actual: features.ncols(),
      });
    }

    let mut scaled = features.to_owned();
    for mut row in scaled.axis_iter_mut(Axis(0)) {
      Zip::from(&mut row)
        .and(&self.data_min[..])
        .and(&self.scale[..])
        .for_each(|value, min, scale| *value = (*value - min) * scale);
    }
    Ok(scaled)
  }
}
