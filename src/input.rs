// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/input.rs - 图像输入
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

use crate::{FromUrl, feature::FeatureVector};

mod canvas;
pub use self::canvas::{CanvasInput, CanvasInputError};

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("Canvas input error: {0}")]
  CanvasInputError(#[from] CanvasInputError),
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  Canvas(CanvasInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
    }
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == CanvasInput::SCHEME {
        let input = CanvasInput::from_url(url)?;
        return Ok(InputWrapper::Canvas(input));
      }
    }
    Err(InputError::SchemeMismatch(url.scheme().to_string()))
  }
}

impl InputWrapper {
  pub fn image(&self) -> Option<&DynamicImage> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.image(),
      InputWrapper::Canvas(input) => input.image(),
    }
  }

  pub fn into_features(self) -> InputWrapperFeatureIter {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => {
        InputWrapperFeatureIter::ReadImageFile(input.into_features())
      }
      InputWrapper::Canvas(input) => InputWrapperFeatureIter::Canvas(input.into_features()),
    }
  }
}

pub enum InputWrapperFeatureIter {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(self::read_image_file::ImageFileFeatures),
  Canvas(self::canvas::CanvasFeatures),
}

impl Iterator for InputWrapperFeatureIter {
  type Item = FeatureVector;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapperFeatureIter::ReadImageFile(input) => input.next(),
      InputWrapperFeatureIter::Canvas(input) => input.next(),
    }
  }
}
