// 该文件是 DigitLearner （数字学徒） 项目的一部分。
// src/feature.rs - 8x8 数字特征提取
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

use image::{DynamicImage, GrayImage, Luma, RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

/// 特征图边长
pub const FEATURE_SIDE: u32 = 8;
/// 特征向量长度
pub const FEATURE_LEN: usize = (FEATURE_SIDE * FEATURE_SIDE) as usize;
/// 单个特征的最大灰度等级
pub const MAX_LEVEL: u8 = 16;
/// 手写画布边长（与界面一致）
pub const CANVAS_SIDE: u32 = 280;

#[derive(Error, Debug, PartialEq)]
pub enum FeatureError {
  #[error("特征长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 64 维特征向量，按行优先展开的 8x8 灰度等级
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl Default for FeatureVector {
  fn default() -> Self {
    Self([0.0; FEATURE_LEN])
  }
}

impl From<[f64; FEATURE_LEN]> for FeatureVector {
  fn from(data: [f64; FEATURE_LEN]) -> Self {
    Self(data)
  }
}

impl TryFrom<&[f64]> for FeatureVector {
  type Error = FeatureError;

  fn try_from(data: &[f64]) -> Result<Self, Self::Error> {
    let data: [f64; FEATURE_LEN] =
      data
        .try_into()
        .map_err(|_| FeatureError::LengthMismatch {
          expected: FEATURE_LEN,
          actual: data.len(),
        })?;
    Ok(Self(data))
  }
}

impl AsRef<[f64]> for FeatureVector {
  fn as_ref(&self) -> &[f64] {
    &self.0
  }
}

impl AsMut<[f64]> for FeatureVector {
  fn as_mut(&mut self) -> &mut [f64] {
    &mut self.0
  }
}

impl FeatureVector {
  pub fn as_slice(&self) -> &[f64] {
    &self.0
  }

  pub fn len(&self) -> usize {
    FEATURE_LEN
  }

  pub fn is_empty(&self) -> bool {
    false
  }

  pub fn iter(&self) -> impl Iterator<Item = &f64> {
    self.0.iter()
  }
}

/// 将 0-255 的亮度映射为 0-16 的灰度等级，越暗数值越大
pub fn intensity_level(intensity: u8) -> u8 {
  MAX_LEVEL - ((17 * intensity as u32) / 256) as u8
}

pub trait ToFeatureVector {
  fn to_feature_vector(&self) -> FeatureVector;
}

impl ToFeatureVector for GrayImage {
  fn to_feature_vector(&self) -> FeatureVector {
    let (width, height) = self.dimensions();
    if width == 0 || height == 0 {
      debug!("空图像，返回全零特征");
      return FeatureVector::default();
    }

    let small = image::imageops::resize(self, FEATURE_SIDE, FEATURE_SIDE, FilterType::Lanczos3);
    debug!("图像 {}x{} 已缩放为 {}x{}", width, height, FEATURE_SIDE, FEATURE_SIDE);

    let mut feature = FeatureVector::default();
    for (slot, pixel) in feature.as_mut().iter_mut().zip(small.pixels()) {
      *slot = intensity_level(pixel[0]) as f64;
    }
    feature
  }
}

/// ITU-R 601-2 亮度（299/587/114），定点计算并四舍五入
pub fn luma_601(r: u8, g: u8, b: u8) -> u8 {
  ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// 彩色转灰度，透明通道直接丢弃
fn rgb_to_gray(image: &RgbImage) -> GrayImage {
  GrayImage::from_fn(image.width(), image.height(), |x, y| {
    let [r, g, b] = image.get_pixel(x, y).0;
    Luma([luma_601(r, g, b)])
  })
}

impl ToFeatureVector for RgbImage {
  fn to_feature_vector(&self) -> FeatureVector {
    rgb_to_gray(self).to_feature_vector()
  }
}

impl ToFeatureVector for DynamicImage {
  fn to_feature_vector(&self) -> FeatureVector {
    match self {
      DynamicImage::ImageLuma8(gray) => gray.to_feature_vector(),
      other => rgb_to_gray(&other.to_rgb8()).to_feature_vector(),
    }
  }
}

/// 对任意尺寸、任意通道的图像提取特征
pub fn extract<I: ToFeatureVector + ?Sized>(image: &I) -> FeatureVector {
  image.to_feature_vector()
}

/// 新建一张空白（全白）手写画布
pub fn blank_canvas() -> GrayImage {
  GrayImage::from_pixel(CANVAS_SIDE, CANVAS_SIDE, Luma([255u8]))
}
