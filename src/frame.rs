// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/frame.rs - RGBA/灰度图像帧定义
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

use image::{GrayImage, RgbaImage};
use thiserror::Error;
use tracing::debug;

const RGBA_CHANNELS: usize = 4;
const GRAY_CHANNELS: usize = 1;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("图像解码失败: {0}")]
  Malformed(#[from] image::ImageError),
  #[error("图像尺寸无效: {0}x{1}")]
  InvalidDimensions(u32, u32),
}

/// 解码后的彩色图像帧，像素按 RGBA 连续存储。
#[derive(Debug, Clone)]
pub struct RgbaFrame {
  image: RgbaImage,
}

impl RgbaFrame {
  /// 从原始字节解码图像（格式由文件头自动识别）。
  pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    if image.width() == 0 || image.height() == 0 {
      return Err(DecodeError::InvalidDimensions(image.width(), image.height()));
    }
    debug!("图像解码完成: {}x{}", image.width(), image.height());
    Ok(RgbaFrame { image })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn channels(&self) -> usize {
    RGBA_CHANNELS
  }

  pub fn as_image(&self) -> &RgbaImage {
    &self.image
  }

  pub fn as_image_mut(&mut self) -> &mut RgbaImage {
    &mut self.image
  }

  pub fn as_raw(&self) -> &[u8] {
    self.image.as_raw()
  }

  pub fn into_image(self) -> RgbaImage {
    self.image
  }
}

impl From<RgbaImage> for RgbaFrame {
  fn from(image: RgbaImage) -> Self {
    if image.width() == 0 || image.height() == 0 {
      panic!("图像尺寸无效: {}x{}", image.width(), image.height());
    }
    RgbaFrame { image }
  }
}

/// 单通道灰度帧，检测与边缘阶段的输入。
#[derive(Debug, Clone)]
pub struct GrayFrame {
  image: GrayImage,
}

impl GrayFrame {
  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn channels(&self) -> usize {
    GRAY_CHANNELS
  }

  pub fn as_image(&self) -> &GrayImage {
    &self.image
  }

  pub fn as_raw(&self) -> &[u8] {
    self.image.as_raw()
  }

  pub fn into_image(self) -> GrayImage {
    self.image
  }
}

impl From<GrayImage> for GrayFrame {
  fn from(image: GrayImage) -> Self {
    if image.width() == 0 || image.height() == 0 {
      panic!("图像尺寸无效: {}x{}", image.width(), image.height());
    }
    GrayFrame { image }
  }
}
