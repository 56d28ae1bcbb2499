// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/feedback.rs - 识别、修正与重新训练的闭环
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
  path::PathBuf,
  sync::{Mutex, PoisonError},
};

use image::DynamicImage;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl,
  context::AppContext,
  dataset::{BaseCorpus, CorpusError, Dataset, DatasetError, DatasetStore, LabeledSample},
  feature::{FeatureVector, extract},
  history::{ExportOutcome, HistoryEntry, HistoryLog},
  input::{InputError, InputWrapper},
  model::{
    ClassifierConfig, ClassifierError, Digit, DigitSvm, LabelError, Model, PredictionResult,
    ScalingError, ScalingModel,
  },
  output::Render,
};

#[cfg(feature = "history_export")]
use crate::output::{DirectoryRecordOutput, OutputError, OutputWrapper};

#[derive(Error, Debug)]
pub enum FeedbackError {
  #[error("标签无效: {0}")]
  Validation(#[from] LabelError),
  #[error("当前没有待修正的识别结果")]
  NoPendingPrediction,
  #[error("输入中没有图像")]
  NoImage,
  #[error("命令无效: {0}")]
  Command(String),
  #[error("模型训练失败: {0}")]
  Model(#[from] ClassifierError),
  #[error("归一化失败: {0}")]
  Scaling(#[from] ScalingError),
  #[error("训练数据错误: {0}")]
  Dataset(#[from] DatasetError),
  #[error("基础语料错误: {0}")]
  Corpus(#[from] CorpusError),
  #[error("训练数据未能保存（内存中已有 {sample_count} 条样本）: {source}")]
  PersistFailed {
    sample_count: usize,
    #[source]
    source: DatasetError,
  },
  #[error("输入错误: {0}")]
  Input(#[from] InputError),
  #[cfg(feature = "history_export")]
  #[error("导出错误: {0}")]
  Output(#[from] OutputError),
}

/// 交给界面的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// 用户输入不合法，状态未改变
  Validation,
  /// 文件读写失败
  Io,
  /// 训练失败，原有模型保持不变
  Model,
  /// 调用顺序不对
  Usage,
}

impl FeedbackError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      FeedbackError::Validation(_) => ErrorKind::Validation,
      FeedbackError::NoPendingPrediction | FeedbackError::NoImage | FeedbackError::Command(_) => {
        ErrorKind::Usage
      }
      FeedbackError::Model(_) | FeedbackError::Scaling(_) => ErrorKind::Model,
      FeedbackError::Dataset(_) | FeedbackError::Corpus(_) | FeedbackError::PersistFailed { .. } => {
        ErrorKind::Io
      }
      FeedbackError::Input(InputError::SchemeMismatch(_)) => ErrorKind::Usage,
      FeedbackError::Input(_) => ErrorKind::Io,
      #[cfg(feature = "history_export")]
      FeedbackError::Output(OutputError::SchemeMismatch(_)) => ErrorKind::Usage,
      #[cfg(feature = "history_export")]
      FeedbackError::Output(_) => ErrorKind::Io,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
  Idle,
  Predicted,
}

/// 等待用户确认的识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
  /// 已归一化的特征，修正时直接加入数据集
  pub scaled: FeatureVector,
  pub result: PredictionResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionOutcome {
  pub label: Digit,
  pub was_correct: bool,
  pub sample_count: usize,
  /// 未记录历史时为 None
  pub history_sequence: Option<u32>,
}

pub struct FeedbackLoop {
  store: DatasetStore,
  scaler: ScalingModel,
  dataset: Dataset,
  model: DigitSvm,
  config: ClassifierConfig,
  history: HistoryLog,
  track_history: bool,
  export_dir: PathBuf,
  export_url: Option<Url>,
  pending: Option<PendingPrediction>,
  unsynced: bool,
}

impl FeedbackLoop {
  /// 读取基础语料并拟合归一化，再加载已保存的训练数据并训练
  pub fn open(context: &AppContext) -> Result<Self, FeedbackError> {
    let (store, scaler) = Self::base_store(context)?;
    let mut feedback = Self::with_parts(store, scaler, context.classifier)?;
    feedback.track_history = context.track_history;
    feedback.export_dir = context.export_dir.clone();
    feedback.export_url = context.export_url.clone();
    Ok(feedback)
  }

  /// 不读取也不训练，直接删除已保存的训练数据
  ///
  /// 数据文件损坏而无法打开闭环时也能恢复，返回基础语料的样本数。
  pub fn reset_stored(context: &AppContext) -> Result<usize, FeedbackError> {
    let (store, _) = Self::base_store(context)?;
    let base = store.reset()?;
    warn!("训练数据已重置: {} 条样本", base.len());
    Ok(base.len())
  }

  fn base_store(context: &AppContext) -> Result<(DatasetStore, ScalingModel), FeedbackError> {
    let corpus = BaseCorpus::open(context.corpus_file.as_deref())?;
    let scaler = corpus.fit_scaler()?;
    let base = corpus.to_dataset(&scaler)?;
    Ok((DatasetStore::new(&context.data_file, base), scaler))
  }

  pub fn with_parts(
    store: DatasetStore,
    scaler: ScalingModel,
    config: ClassifierConfig,
  ) -> Result<Self, FeedbackError> {
    let dataset = store.load()?;
    let model = DigitSvm::train(&dataset, config)?;
    info!("识别器就绪: {} 条样本", dataset.len());

    Ok(FeedbackLoop {
      store,
      scaler,
      dataset,
      model,
      config,
      history: HistoryLog::new(),
      track_history: true,
      export_dir: PathBuf::from("."),
      export_url: None,
      pending: None,
      unsynced: false,
    })
  }

  pub fn sample_count(&self) -> usize {
    self.dataset.len()
  }

  pub fn dataset(&self) -> &Dataset {
    &self.dataset
  }

  pub fn model(&self) -> &DigitSvm {
    &self.model
  }

  pub fn pending(&self) -> Option<&PendingPrediction> {
    self.pending.as_ref()
  }

  pub fn state(&self) -> CycleState {
    match self.pending {
      Some(_) => CycleState::Predicted,
      None => CycleState::Idle,
    }
  }

  pub fn history(&self) -> &HistoryLog {
    &self.history
  }

  /// 内存中的数据是否领先于磁盘
  pub fn is_unsynced(&self) -> bool {
    self.unsynced
  }

  /// 识别原始特征，结果成为待修正的识别结果（覆盖之前的）
  pub fn predict(&mut self, feature: &FeatureVector) -> Result<PredictionResult, FeedbackError> {
    let scaled = self.scaler.transform(feature);
    let result = self.model.infer(&scaled)?;
    info!("识别结果: {} (置信度: {:.1}%)", result.label, result.confidence);

    if self.pending.is_some() {
      debug!("覆盖尚未修正的识别结果");
    }
    self.pending = Some(PendingPrediction {
      scaled,
      result: result.clone(),
    });
    Ok(result)
  }

  /// 以用户给出的正确标签修正最近一次识别，并重新训练和保存
  pub fn apply_correction(&mut self, label_text: &str) -> Result<CorrectionOutcome, FeedbackError> {
    let label: Digit = label_text.parse().inspect_err(|err| {
      warn!("拒绝修正标签 {:?}: {}", label_text, err);
    })?;
    let pending = self
      .pending
      .as_ref()
      .ok_or(FeedbackError::NoPendingPrediction)?;

    let sample = LabeledSample::new(pending.scaled, label);
    let candidate = self.dataset.with_sample(sample)?;
    let model = DigitSvm::train(&candidate, self.config)?;

    // 训练成功后才提交
    let predicted = pending.result.label;
    let confidence = pending.result.confidence;
    self.dataset = candidate;
    self.model = model;
    self.pending = None;

    let history_sequence = if self.track_history {
      Some(self.history.record(predicted, label, confidence).sequence)
    } else {
      None
    };
    info!(
      "已学习: 识别 {} → 正确 {}，共 {} 条样本",
      predicted,
      label,
      self.dataset.len()
    );

    self.persist()?;

    Ok(CorrectionOutcome {
      label,
      was_correct: predicted == label,
      sample_count: self.dataset.len(),
      history_sequence,
    })
  }

  /// 模型落后于数据集时重新训练，返回是否训练过
  pub fn retrain_if_stale(&mut self) -> Result<bool, FeedbackError> {
    if self.model.trained_on() == self.dataset.len() {
      debug!("模型已是最新，跳过训练");
      return Ok(false);
    }
    self.model = DigitSvm::train(&self.dataset, self.config)?;
    Ok(true)
  }

  /// 重试保存尚未写入磁盘的数据
  pub fn flush(&mut self) -> Result<(), FeedbackError> {
    if self.unsynced {
      self.persist()?;
    }
    Ok(())
  }

  /// 删除已保存的训练数据，回到基础语料，历史记录保留
  pub fn reset(&mut self) -> Result<usize, FeedbackError> {
    let model = DigitSvm::train(self.store.base(), self.config)?;
    self.dataset = self.store.reset()?;
    self.model = model;
    self.pending = None;
    self.unsynced = false;
    warn!("训练数据已重置: {} 条样本", self.dataset.len());
    Ok(self.dataset.len())
  }

  pub fn export_history_with<O>(&self, output: &O) -> Result<ExportOutcome, O::Error>
  where
    O: Render<[HistoryEntry]>,
  {
    self.history.export(output)
  }

  fn persist(&mut self) -> Result<(), FeedbackError> {
    match self.store.persist(&self.dataset) {
      Ok(()) => {
        self.unsynced = false;
        Ok(())
      }
      Err(source) => {
        self.unsynced = true;
        warn!("训练数据保存失败，内存中的数据领先于磁盘: {}", source);
        Err(FeedbackError::PersistFailed {
          sample_count: self.dataset.len(),
          source,
        })
      }
    }
  }
}

/// 界面调用的入口
impl FeedbackLoop {
  pub fn on_draw_complete(&mut self, image: &DynamicImage) -> Result<PredictionResult, FeedbackError> {
    let feature = extract(image);
    self.predict(&feature)
  }

  pub fn on_image_file(&mut self, url: &Url) -> Result<PredictionResult, FeedbackError> {
    let feature = InputWrapper::from_url(url)?
      .into_features()
      .next()
      .ok_or(FeedbackError::NoImage)?;
    self.predict(&feature)
  }

  pub fn on_correction_submitted(
    &mut self,
    label_text: &str,
  ) -> Result<CorrectionOutcome, FeedbackError> {
    self.apply_correction(label_text)
  }

  pub fn on_reset_requested(&mut self) -> Result<usize, FeedbackError> {
    self.reset()
  }

  /// 未指定位置时导出到配置的位置
  #[cfg(feature = "history_export")]
  pub fn on_export_requested(
    &self,
    destination: Option<&Url>,
  ) -> Result<ExportOutcome, FeedbackError> {
    let output = match destination.or(self.export_url.as_ref()) {
      Some(url) => OutputWrapper::from_url(url)?,
      None => OutputWrapper::DirectoryRecordOutput(DirectoryRecordOutput::new(&self.export_dir)),
    };
    Ok(self.export_history_with(&output)?)
  }
}

/// 多个调用方共享同一个闭环时使用，一次修正全程持有锁
pub struct SharedFeedbackLoop(pub Mutex<FeedbackLoop>);

impl SharedFeedbackLoop {
  pub fn new(feedback: FeedbackLoop) -> Self {
    SharedFeedbackLoop(Mutex::new(feedback))
  }

  pub fn with<R>(&self, f: impl FnOnce(&mut FeedbackLoop) -> R) -> R {
    let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feature::FEATURE_LEN;

  /// 每个数字占用 6 个互不重叠的像素
  fn prototype(digit: u8, level: f64) -> FeatureVector {
    let mut values = [0.0; FEATURE_LEN];
    let start = digit as usize * 6;
    values[start..start + 6].iter_mut().for_each(|v| *v = level);
    FeatureVector::from(values)
  }

  fn corpus(digits: &[u8]) -> BaseCorpus {
    let mut text = String::new();
    for &digit in digits {
      for level in [12.0, 14.0, 16.0] {
        let row: Vec<String> = prototype(digit, level)
          .iter()
          .map(|v| format!("{}", *v as u8))
          .collect();
        text.push_str(&format!("{},{}\n", row.join(","), digit));
      }
    }
    BaseCorpus::from_reader(text.as_bytes()).unwrap()
  }

  fn sharp() -> ClassifierConfig {
    ClassifierConfig { c: 10.0, gamma: 0.5 }
  }

  fn feedback_in(dir: &std::path::Path, digits: &[u8]) -> FeedbackLoop {
    let corpus = corpus(digits);
    let scaler = corpus.fit_scaler().unwrap();
    let base = corpus.to_dataset(&scaler).unwrap();
    let store = DatasetStore::new(dir.join("data.npz"), base);
    FeedbackLoop::with_parts(store, scaler, sharp()).unwrap()
  }

  #[test]
  fn correction_requires_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1, 2]);
    assert_eq!(feedback.state(), CycleState::Idle);

    let err = feedback.apply_correction("1").unwrap_err();
    assert!(matches!(err, FeedbackError::NoPendingPrediction));
    assert_eq!(err.kind(), ErrorKind::Usage);
    assert_eq!(feedback.sample_count(), 9);
  }

  #[test]
  fn invalid_label_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1, 2]);
    feedback.predict(&prototype(1, 15.0)).unwrap();

    for text in ["x", "", "10", "-1"] {
      let err = feedback.apply_correction(text).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::Validation, "label {:?}", text);
    }
    assert_eq!(feedback.sample_count(), 9);
    assert_eq!(feedback.state(), CycleState::Predicted);
    assert!(feedback.history().is_empty());
    assert!(!dir.path().join("data.npz").exists());
  }

  #[test]
  fn correction_appends_retrains_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1, 2]);
    let result = feedback.predict(&prototype(2, 15.0)).unwrap();
    assert_eq!(result.label, Digit::new(2).unwrap());

    let outcome = feedback.apply_correction("2").unwrap();
    assert!(outcome.was_correct);
    assert_eq!(outcome.sample_count, 10);
    assert_eq!(outcome.history_sequence, Some(1));
    assert_eq!(feedback.state(), CycleState::Idle);
    assert_eq!(feedback.model().trained_on(), 10);
    assert!(!feedback.is_unsynced());
    assert!(dir.path().join("data.npz").exists());

    let last = feedback.dataset().last().unwrap();
    assert_eq!(last.label(), Digit::new(2).unwrap());
  }

  #[test]
  fn repredict_overwrites_pending() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1, 2]);
    feedback.predict(&prototype(0, 15.0)).unwrap();
    let second = feedback.predict(&prototype(1, 15.0)).unwrap();
    assert_eq!(feedback.pending().map(|p| &p.result), Some(&second));

    let outcome = feedback.apply_correction("1").unwrap();
    assert_eq!(feedback.history().entries()[0].predicted, second.label);
    assert_eq!(outcome.history_sequence, Some(1));
  }

  #[test]
  fn history_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1]);
    feedback.track_history = false;
    feedback.predict(&prototype(0, 15.0)).unwrap();
    let outcome = feedback.apply_correction("1").unwrap();
    assert!(!outcome.was_correct);
    assert_eq!(outcome.history_sequence, None);
    assert!(feedback.history().is_empty());
  }

  #[test]
  fn reset_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1, 2]);
    feedback.predict(&prototype(0, 15.0)).unwrap();
    feedback.apply_correction("0").unwrap();
    feedback.predict(&prototype(1, 15.0)).unwrap();

    assert_eq!(feedback.reset().unwrap(), 9);
    assert_eq!(feedback.state(), CycleState::Idle);
    assert_eq!(feedback.history().len(), 1);
    assert!(!dir.path().join("data.npz").exists());
  }

  #[test]
  fn corrections_leave_model_current() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1]);
    assert!(!feedback.retrain_if_stale().unwrap());

    feedback.predict(&prototype(0, 13.0)).unwrap();
    feedback.apply_correction("0").unwrap();
    assert_eq!(feedback.model().trained_on(), 7);
    assert!(!feedback.retrain_if_stale().unwrap());
  }

  #[test]
  fn stale_model_is_retrained_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut feedback = feedback_in(dir.path(), &[0, 1]);

    // 只改数据不训练，模拟落后的模型
    let scaled = feedback.scaler.transform(&prototype(0, 13.0));
    let sample = LabeledSample::new(scaled, Digit::new(0).unwrap());
    feedback.dataset = feedback.dataset.with_sample(sample).unwrap();
    assert_eq!(feedback.model().trained_on(), 6);

    assert!(feedback.retrain_if_stale().unwrap());
    assert_eq!(feedback.model().trained_on(), 7);
    assert!(!feedback.retrain_if_stale().unwrap());
  }

  #[test]
  fn single_class_base_is_model_error() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = corpus(&[3]);
    let scaler = corpus.fit_scaler().unwrap();
    let base = corpus.to_dataset(&scaler).unwrap();
    let store = DatasetStore::new(dir.path().join("data.npz"), base);
    let err = FeedbackLoop::with_parts(store, scaler, sharp()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Model);
  }

  #[test]
  fn shared_loop_serializes_access() {
    let dir = tempfile::tempdir().unwrap();
    let shared = SharedFeedbackLoop::new(feedback_in(dir.path(), &[0, 1, 2]));
    let count = shared.with(|feedback| {
      feedback.predict(&prototype(2, 15.0)).unwrap();
      feedback.apply_correction("2").unwrap().sample_count
    });
    assert_eq!(count, 10);
    assert_eq!(shared.with(|feedback| feedback.sample_count()), 10);
  }

  #[test]
  fn empty_dataset_matrix_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = corpus(&[0, 1]);
    let scaler = corpus.fit_scaler().unwrap();
    let store = DatasetStore::new(dir.path().join("data.npz"), Dataset::empty());
    let err = FeedbackLoop::with_parts(store, scaler, sharp()).err().unwrap();
    assert!(matches!(err, FeedbackError::Model(ClassifierError::EmptyDataset)));
  }
}
