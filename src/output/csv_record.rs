// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/output/csv_record.rs - 历史记录 CSV 格式
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
  io::{BufWriter, Write},
  path::Path,
};

use crate::history::HistoryEntry;

/// 表头，列顺序固定
pub const HISTORY_HEADER: [&str; 6] = [
  "No",
  "datetime",
  "predicted",
  "correct",
  "confidence(%)",
  "is_correct(1/0)",
];

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// UTF-8 BOM，方便表格软件识别编码
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn history_row(entry: &HistoryEntry) -> [String; 6] {
  [
    entry.sequence.to_string(),
    entry.timestamp.format(DATETIME_FORMAT).to_string(),
    entry.predicted.to_string(),
    entry.correct.to_string(),
    format!("{:.1}", entry.confidence),
    if entry.is_correct { "1" } else { "0" }.to_string(),
  ]
}

pub fn write_history<W: Write>(writer: W, entries: &[HistoryEntry]) -> Result<(), csv::Error> {
  let mut writer = csv::WriterBuilder::new()
    .terminator(csv::Terminator::CRLF)
    .from_writer(writer);
  writer.write_record(HISTORY_HEADER)?;
  for entry in entries {
    writer.write_record(history_row(entry))?;
  }
  writer.flush()?;
  Ok(())
}

/// 覆盖写入历史记录文件
pub fn record(entries: &[HistoryEntry], path: &Path) -> Result<(), csv::Error> {
  let mut file = BufWriter::new(File::create(path)?);
  file.write_all(UTF8_BOM)?;
  write_history(&mut file, entries)?;
  file.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Digit;
  use chrono::{Local, TimeZone};

  fn entry(sequence: u32, predicted: u8, correct: u8, confidence: f64) -> HistoryEntry {
    HistoryEntry {
      sequence,
      timestamp: Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
      predicted: Digit::new(predicted).unwrap(),
      correct: Digit::new(correct).unwrap(),
      confidence,
      is_correct: predicted == correct,
    }
  }

  #[test]
  fn rows_follow_header_order() {
    let mut buffer = Vec::new();
    write_history(&mut buffer, &[entry(1, 3, 3, 97.26), entry(2, 1, 7, 41.04)]).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
      lines,
      vec![
        "No,datetime,predicted,correct,confidence(%),is_correct(1/0)",
        "1,2026-03-14 09:26:53,3,3,97.3,1",
        "2,2026-03-14 09:26:53,1,7,41.0,0",
      ]
    );
  }

  #[test]
  fn file_starts_with_bom() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.csv");
    record(&[entry(1, 0, 0, 100.0)], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
    let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
    assert!(text.starts_with("No,datetime"));
    assert_eq!(text.lines().count(), 2);
  }
}
