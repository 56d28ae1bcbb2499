// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// tests/common/mod.rs - 集成测试公用工具
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

#![allow(dead_code)]

use std::path::Path;

use digit_learner::{
  context::AppContext,
  feature::{FEATURE_LEN, FeatureVector},
  model::ClassifierConfig,
};

/// 每个数字在语料中的样本数
pub const SAMPLES_PER_DIGIT: usize = 3;

/// 每个数字点亮 6 个互不重叠的像素
pub fn prototype(digit: u8, level: f64) -> FeatureVector {
  let mut values = [0.0; FEATURE_LEN];
  let start = digit as usize * 6;
  values[start..start + 6].iter_mut().for_each(|v| *v = level);
  FeatureVector::from(values)
}

pub fn write_corpus(path: &Path, digits: &[u8]) {
  let mut text = String::new();
  for &digit in digits {
    for level in [12u8, 14, 16].iter().take(SAMPLES_PER_DIGIT) {
      let row: Vec<String> = prototype(digit, *level as f64)
        .iter()
        .map(|v| format!("{}", *v as u8))
        .collect();
      text.push_str(&format!("{},{}\n", row.join(","), digit));
    }
  }
  std::fs::write(path, text).unwrap();
}

/// 在临时目录中准备好语料的运行配置
pub fn context_in(dir: &Path, digits: &[u8]) -> AppContext {
  let corpus = dir.join("digits.csv");
  write_corpus(&corpus, digits);
  AppContext::new(dir)
    .with_corpus_file(corpus)
    .with_classifier(ClassifierConfig { c: 10.0, gamma: 0.5 })
}

/// 与所有原型距离都很远的特征
pub fn uniform(level: f64) -> FeatureVector {
  let mut values = [0.0; FEATURE_LEN];
  values[..60].iter_mut().for_each(|v| *v = level);
  FeatureVector::from(values)
}

pub fn all_digits() -> Vec<u8> {
  (0..=9).collect()
}
