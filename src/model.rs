// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/model.rs - 模型
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

use std::{fmt, str::FromStr};

use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;
  fn from_label_id(id: u32) -> Option<Self>;
}

/// 类别数量（数字 0-9）
pub const CLASS_NUM: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
  #[error("请输入 0 到 9 之间的数字，实际输入: {0:?}")]
  NotADigit(String),
  #[error("标签超出范围 0-9: {0}")]
  OutOfRange(i64),
}

/// 经过校验的数字标签，取值恒为 0-9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digit(u8);

impl Digit {
  pub const ALL: [Digit; CLASS_NUM] = [
    Digit(0),
    Digit(1),
    Digit(2),
    Digit(3),
    Digit(4),
    Digit(5),
    Digit(6),
    Digit(7),
    Digit(8),
    Digit(9),
  ];

  pub fn new(value: u8) -> Result<Self, LabelError> {
    if (value as usize) < CLASS_NUM {
      Ok(Digit(value))
    } else {
      Err(LabelError::OutOfRange(value as i64))
    }
  }

  pub fn value(self) -> u8 {
    self.0
  }

  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl FromStr for Digit {
  type Err = LabelError;

  /// 仅接受纯 ASCII 数字（允许首尾空白），且数值不大于 9
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
      return Err(LabelError::NotADigit(s.to_string()));
    }
    let value: i64 = text
      .parse()
      .map_err(|_| LabelError::NotADigit(s.to_string()))?;
    Digit::try_from(value)
  }
}

impl TryFrom<i64> for Digit {
  type Error = LabelError;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    if (0..CLASS_NUM as i64).contains(&value) {
      Ok(Digit(value as u8))
    } else {
      Err(LabelError::OutOfRange(value))
    }
  }
}

impl From<Digit> for i64 {
  fn from(digit: Digit) -> Self {
    digit.0 as i64
  }
}

impl fmt::Display for Digit {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl WithLabel for Digit {
  fn to_label_str(&self) -> String {
    self.to_string()
  }

  fn to_label_id(&self) -> u32 {
    self.0 as u32
  }

  fn from_label_id(id: u32) -> Option<Self> {
    Digit::try_from(id as i64).ok()
  }
}

/// 单次识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
  pub label: Digit,
  /// 置信度，百分比 0-100
  pub confidence: f64,
  /// 各数字的概率分布，下标即数字
  pub probabilities: [f64; CLASS_NUM],
}

impl PredictionResult {
  /// 由概率分布构造识别结果，取概率最大者（并列时取较小的数字）
  pub fn from_probabilities(probabilities: [f64; CLASS_NUM]) -> Self {
    let (index, max) = probabilities
      .iter()
      .copied()
      .enumerate()
      .fold((0usize, f64::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    PredictionResult {
      label: Digit(index as u8),
      confidence: (max * 100.0).clamp(0.0, 100.0),
      probabilities,
    }
  }
}

mod scaler;
mod svm;
pub use self::scaler::{ScalingError, ScalingModel};
pub use self::svm::{ClassifierConfig, ClassifierError, DEFAULT_C, DEFAULT_GAMMA, DigitSvm};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_single_digits() {
    for value in 0..=9u8 {
      let digit: Digit = value.to_string().parse().unwrap();
      assert_eq!(digit.value(), value);
    }
    assert_eq!(" 7\n".parse::<Digit>().unwrap(), Digit::new(7).unwrap());
    assert_eq!("07".parse::<Digit>().unwrap(), Digit::new(7).unwrap());
  }

  #[test]
  fn reject_non_digits() {
    for text in ["x", "", "  ", "-1", "+3", "3.0", "１", "4a"] {
      assert!(
        matches!(text.parse::<Digit>(), Err(LabelError::NotADigit(_))),
        "{text:?} should be rejected"
      );
    }
  }

  #[test]
  fn reject_out_of_range() {
    assert_eq!("10".parse::<Digit>(), Err(LabelError::OutOfRange(10)));
    assert!(matches!(
      "99999999999999999999999".parse::<Digit>(),
      Err(LabelError::NotADigit(_))
    ));
    assert!(Digit::new(10).is_err());
    assert!(Digit::try_from(-1i64).is_err());
  }

  #[test]
  fn label_ids_round_trip() {
    for digit in Digit::ALL {
      assert_eq!(Digit::from_label_id(digit.to_label_id()), Some(digit));
    }
    assert_eq!(Digit::from_label_id(10), None);
  }

  #[test]
  fn prediction_takes_argmax() {
    let mut probabilities = [0.05; CLASS_NUM];
    probabilities[3] = 0.55;
    let result = PredictionResult::from_probabilities(probabilities);
    assert_eq!(result.label, Digit::new(3).unwrap());
    assert!((result.confidence - 55.0).abs() < 1e-9);
  }
}
