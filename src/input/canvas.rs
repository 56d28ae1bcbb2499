// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/input/canvas.rs - 手写画布输入
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

use image::DynamicImage;
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  feature::{FeatureVector, ToFeatureVector, blank_canvas},
};

#[derive(Error, Debug)]
pub enum CanvasInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Unknown canvas: {0}")]
  UnknownCanvas(String),
}

/// 由界面交来的位图，或 `canvas:blank` 表示的空白画布
pub struct CanvasInput {
  image: Option<DynamicImage>,
}

impl FromUrlWithScheme for CanvasInput {
  const SCHEME: &'static str = "canvas";
}

impl FromUrl for CanvasInput {
  type Error = CanvasInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(CanvasInputError::SchemaMismatch);
    }

    match url.path().trim_matches('/') {
      "blank" => Ok(CanvasInput::blank()),
      other => Err(CanvasInputError::UnknownCanvas(other.to_string())),
    }
  }
}

impl From<DynamicImage> for CanvasInput {
  fn from(image: DynamicImage) -> Self {
    CanvasInput { image: Some(image) }
  }
}

impl CanvasInput {
  pub fn blank() -> Self {
    DynamicImage::ImageLuma8(blank_canvas()).into()
  }

  pub fn image(&self) -> Option<&DynamicImage> {
    self.image.as_ref()
  }

  pub fn into_features(self) -> CanvasFeatures {
    CanvasFeatures { inner: self }
  }
}

pub struct CanvasFeatures {
  inner: CanvasInput,
}

impl Iterator for CanvasFeatures {
  type Item = FeatureVector;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.image.take().map(|image| image.to_feature_vector())
  }
}
