// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/task.rs - 运行任务与结果呈现
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

use std::io::Write;

use serde_json::json;
use tracing::info;

use crate::{
  feature::FeatureVector,
  feedback::{CorrectionOutcome, FeedbackError, FeedbackLoop},
  history::ExportOutcome,
  model::PredictionResult,
};

#[cfg(feature = "history_export")]
mod session;
#[cfg(feature = "history_export")]
pub use self::session::{ContinuousTask, SessionCommand, SessionCommandError, SessionFlow};

pub trait Task<I, P>: Sized {
  type Error;
  fn run_task(self, input: I, feedback: &mut FeedbackLoop, presenter: P) -> Result<(), Self::Error>;
}

/// 把各操作的结果交给用户
pub trait Presenter {
  fn prediction(&mut self, result: &PredictionResult) -> std::io::Result<()>;
  fn correction(&mut self, outcome: &CorrectionOutcome) -> std::io::Result<()>;
  fn reset(&mut self, sample_count: usize) -> std::io::Result<()>;
  fn export(&mut self, outcome: &ExportOutcome) -> std::io::Result<()>;
  fn count(&mut self, sample_count: usize) -> std::io::Result<()>;
  fn error(&mut self, error: &FeedbackError) -> std::io::Result<()>;
}

/// 文本或 JSON 行输出
pub struct ConsolePresenter<W: Write> {
  writer: W,
  json: bool,
}

impl<W: Write> ConsolePresenter<W> {
  pub fn new(writer: W, json: bool) -> Self {
    Self { writer, json }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }

  fn emit(&mut self, text: String, value: serde_json::Value) -> std::io::Result<()> {
    if self.json {
      writeln!(self.writer, "{}", value)?;
    } else {
      writeln!(self.writer, "{}", text)?;
    }
    self.writer.flush()
  }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
  fn prediction(&mut self, result: &PredictionResult) -> std::io::Result<()> {
    self.emit(
      format!("识别结果: {} (置信度: {:.1}%)", result.label, result.confidence),
      json!({
        "label": result.label.value(),
        "confidence": result.confidence,
        "probabilities": result.probabilities.to_vec(),
      }),
    )
  }

  fn correction(&mut self, outcome: &CorrectionOutcome) -> std::io::Result<()> {
    let verdict = if outcome.was_correct {
      "识别正确"
    } else {
      "识别错误"
    };
    self.emit(
      format!(
        "已学习数字 {} ({})，共 {} 条样本",
        outcome.label, verdict, outcome.sample_count
      ),
      json!({
        "label": outcome.label.value(),
        "was_correct": outcome.was_correct,
        "sample_count": outcome.sample_count,
        "history_sequence": outcome.history_sequence,
      }),
    )
  }

  fn reset(&mut self, sample_count: usize) -> std::io::Result<()> {
    self.emit(
      format!("训练数据已重置，共 {} 条样本", sample_count),
      json!({ "reset": true, "sample_count": sample_count }),
    )
  }

  fn export(&mut self, outcome: &ExportOutcome) -> std::io::Result<()> {
    match outcome {
      ExportOutcome::NothingToExport => self.emit(
        "没有可导出的历史记录".to_string(),
        json!({ "exported": false }),
      ),
      ExportOutcome::Written(path) => self.emit(
        format!("历史记录已导出: {}", path.display()),
        json!({ "exported": true, "path": path.display().to_string() }),
      ),
    }
  }

  fn count(&mut self, sample_count: usize) -> std::io::Result<()> {
    self.emit(
      format!("当前共 {} 条样本", sample_count),
      json!({ "sample_count": sample_count }),
    )
  }

  fn error(&mut self, error: &FeedbackError) -> std::io::Result<()> {
    self.emit(
      format!("错误: {}", error),
      json!({
        "error": format!("{:?}", error.kind()),
        "message": error.to_string(),
      }),
    )
  }
}

/// 识别一张图像，给出标签时再完成一次修正
#[derive(Default, Debug)]
pub struct OneShotTask {
  label: Option<String>,
}

impl OneShotTask {
  pub fn with_label(mut self, label: Option<String>) -> Self {
    self.label = label;
    self
  }
}

impl<I: Iterator<Item = FeatureVector>, P: Presenter> Task<I, P> for OneShotTask {
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, feedback: &mut FeedbackLoop, mut presenter: P) -> Result<(), Self::Error> {
    info!("开始任务...");
    let feature = input.next().ok_or(FeedbackError::NoImage)?;
    let now = std::time::Instant::now();
    let result = feedback.predict(&feature)?;
    info!("识别完成，耗时: {:.2?}", now.elapsed());
    presenter.prediction(&result)?;

    if let Some(label) = self.label {
      let now = std::time::Instant::now();
      let outcome = feedback.apply_correction(&label)?;
      info!("修正完成，耗时: {:.2?}", now.elapsed());
      presenter.correction(&outcome)?;
    }

    Ok(())
  }
}
