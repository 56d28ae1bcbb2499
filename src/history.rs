// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/history.rs - 识别与修正历史记录
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

use chrono::{DateTime, Local};
use tracing::info;

use crate::{model::Digit, output::Render};

/// 一次修正事件
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
  /// 从 1 开始的序号
  pub sequence: u32,
  pub timestamp: DateTime<Local>,
  pub predicted: Digit,
  pub correct: Digit,
  /// 识别时的置信度（%）
  pub confidence: f64,
  pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
  /// 没有历史记录，未生成文件
  NothingToExport,
  Written(PathBuf),
}

/// 只追加的历史记录，仅在进程内有效
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
  entries: Vec<HistoryEntry>,
}

impl HistoryLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> &[HistoryEntry] {
    &self.entries
  }

  pub fn next_sequence(&self) -> u32 {
    self.entries.last().map(|e| e.sequence + 1).unwrap_or(1)
  }

  pub fn append(&mut self, entry: HistoryEntry) {
    self.entries.push(entry);
  }

  /// 按当前时间记录一次修正，返回新条目
  pub fn record(&mut self, predicted: Digit, correct: Digit, confidence: f64) -> &HistoryEntry {
    let entry = HistoryEntry {
      sequence: self.next_sequence(),
      timestamp: Local::now(),
      predicted,
      correct,
      confidence,
      is_correct: predicted == correct,
    };
    self.entries.push(entry);
    &self.entries[self.entries.len() - 1]
  }

  pub fn export<O>(&self, output: &O) -> Result<ExportOutcome, O::Error>
  where
    O: Render<[HistoryEntry]>,
  {
    if self.entries.is_empty() {
      info!("没有可导出的历史记录");
      return Ok(ExportOutcome::NothingToExport);
    }
    let path = output.render_result(&self.entries)?;
    info!("历史记录已导出: {}", path.display());
    Ok(ExportOutcome::Written(path))
  }
}
