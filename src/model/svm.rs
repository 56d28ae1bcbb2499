// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/model/svm.rs - 支持向量机数字分类器
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

use linfa::{dataset::Pr, prelude::*};
use linfa_svm::{Svm, SvmError};
use ndarray::{Array1, Array2};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  dataset::Dataset,
  feature::{FEATURE_LEN, FeatureVector},
  model::{CLASS_NUM, Digit, Model, PredictionResult},
};

/// 惩罚系数
pub const DEFAULT_C: f64 = 10.0;
/// RBF 核系数 gamma，核函数为 exp(-gamma * |x - y|^2)
pub const DEFAULT_GAMMA: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
  pub c: f64,
  pub gamma: f64,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      c: DEFAULT_C,
      gamma: DEFAULT_GAMMA,
    }
  }
}

impl ClassifierConfig {
  /// linfa 的高斯核写作 exp(-|x - y|^2 / eps)
  fn kernel_eps(&self) -> f64 {
    1.0 / self.gamma
  }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("训练集为空")]
  EmptyDataset,
  #[error("训练集只包含 {0} 个类别，至少需要 2 个")]
  TooFewClasses(usize),
  #[error("分类器参数无效: C={c}, gamma={gamma}")]
  InvalidConfig { c: f64, gamma: f64 },
  #[error("数字 {label} 的 SVM 训练失败: {source}")]
  Svm {
    label: Digit,
    #[source]
    source: SvmError,
  },
}

/// 一对其余的二分类器
struct OneVsRest {
  label: Digit,
  svm: Svm<f64, Pr>,
}

/// 多分类 SVM：每个出现过的数字训练一个带 Platt 概率校准的二分类器
pub struct DigitSvm {
  config: ClassifierConfig,
  members: Vec<OneVsRest>,
  trained_on: usize,
}

impl std::fmt::Debug for DigitSvm {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DigitSvm")
      .field("config", &self.config)
      .field(
        "classes",
        &self.members.iter().map(|m| m.label).collect::<Vec<_>>(),
      )
      .field("trained_on", &self.trained_on)
      .finish()
  }
}

impl DigitSvm {
  /// 在整个数据集上从头训练
  pub fn train(dataset: &Dataset, config: ClassifierConfig) -> Result<Self, ClassifierError> {
    if !(config.c > 0.0 && config.gamma > 0.0) {
      return Err(ClassifierError::InvalidConfig {
        c: config.c,
        gamma: config.gamma,
      });
    }
    if dataset.is_empty() {
      error!("训练集为空，无法训练");
      return Err(ClassifierError::EmptyDataset);
    }

    let classes = dataset.distinct_labels();
    if classes.len() < 2 {
      error!("训练集只包含 {} 个类别", classes.len());
      return Err(ClassifierError::TooFewClasses(classes.len()));
    }

    info!(
      "开始训练 SVM: 样本数 {}, 类别数 {}, C={}, gamma={}",
      dataset.len(),
      classes.len(),
      config.c,
      config.gamma
    );
    let now = std::time::Instant::now();

    let mut members = Vec::with_capacity(classes.len());
    for label in classes {
      let targets: Array1<bool> = dataset.labels().iter().map(|l| *l == label).collect();
      let binary = linfa::Dataset::new(dataset.features().clone(), targets);

      let svm = Svm::<f64, Pr>::params()
        .pos_neg_weights(config.c, config.c)
        .gaussian_kernel(config.kernel_eps())
        .fit(&binary)
        .map_err(|source| {
          error!("数字 {} 的 SVM 训练失败: {}", label, source);
          ClassifierError::Svm { label, source }
        })?;
      debug!("数字 {} 的分类器训练完成", label);

      members.push(OneVsRest { label, svm });
    }

    info!("SVM 训练完成，耗时: {:.2?}", now.elapsed());
    Ok(DigitSvm {
      config,
      members,
      trained_on: dataset.len(),
    })
  }

  pub fn config(&self) -> ClassifierConfig {
    self.config
  }

  /// 训练时的样本数
  pub fn trained_on(&self) -> usize {
    self.trained_on
  }

  pub fn classes(&self) -> Vec<Digit> {
    self.members.iter().map(|m| m.label).collect()
  }

  /// 计算已归一化特征在 10 个数字上的概率分布，未参与训练的数字概率为 0
  pub fn probabilities(&self, scaled: &FeatureVector) -> [f64; CLASS_NUM] {
    let mut records = Array2::<f64>::zeros((1, FEATURE_LEN));
    for (slot, value) in records.iter_mut().zip(scaled.iter()) {
      *slot = *value;
    }

    let mut raw = [0.0f64; CLASS_NUM];
    for member in &self.members {
      let output: Array1<Pr> = member.svm.predict(&records);
      let p = output.get(0).map(|p| **p as f64).unwrap_or(0.0);
      raw[member.label.index()] = if p.is_finite() { p.max(0.0) } else { 0.0 };
    }

    let total: f64 = raw.iter().sum();
    if total > 0.0 {
      raw.iter_mut().for_each(|p| *p /= total);
    } else {
      // 所有二分类器都给出 0 时退化为已知类别上的均匀分布
      let share = 1.0 / self.members.len() as f64;
      for member in &self.members {
        raw[member.label.index()] = share;
      }
    }
    raw
  }
}

impl Model for DigitSvm {
  /// 已归一化的特征
  type Input = FeatureVector;
  type Output = PredictionResult;
  type Error = ClassifierError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let result = PredictionResult::from_probabilities(self.probabilities(input));
    debug!(
      "识别结果: {} (置信度: {:.1}%)",
      result.label, result.confidence
    );
    Ok(result)
  }
}
