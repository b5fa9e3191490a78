// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/engine.rs - 视觉引擎能力边界定义
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

use crate::frame::{GrayFrame, RgbaFrame};

/// RGBA 颜色
pub type Color = [u8; 4];

const CANNY_LOW_DEFAULT: f32 = 50.0;
const CANNY_HIGH_DEFAULT: f32 = 150.0;

/// 检测到的矩形区域，图像坐标系，左上角为原点。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

/// Canny 边缘检测的双阈值。
///
/// 底层实现固定使用 3x3 Sobel 核与 L1 梯度，因此孔径与梯度模式不作为参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
  pub low: f32,
  pub high: f32,
}

impl Default for CannyParams {
  fn default() -> Self {
    CannyParams {
      low: CANNY_LOW_DEFAULT,
      high: CANNY_HIGH_DEFAULT,
    }
  }
}

/// 模型注册结果。同名重复注册按成功处理，返回 `AlreadyPresent`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
  Fresh,
  AlreadyPresent,
}

/// 级联分类器。多尺度检测返回的区域顺序不做约定，按原样向上传递。
pub trait Classifier {
  type Error: std::error::Error + Send + Sync + 'static;

  fn detect_multi_scale(
    &mut self,
    gray: &GrayFrame,
    scale_factor: f32,
    min_neighbors: u32,
  ) -> Result<Vec<Region>, Self::Error>;
}

/// 外部视觉库的能力边界。
///
/// 灰度转换、边缘检测、矩形绘制与模型命名空间都由引擎提供，
/// 本库只负责围绕这些能力的编排。
pub trait VisionEngine {
  type Classifier: Classifier;
  type Error: std::error::Error + Send + Sync + 'static;

  fn to_grayscale(&self, frame: &RgbaFrame) -> GrayFrame;

  fn canny_edges(&self, gray: &GrayFrame, params: &CannyParams) -> GrayFrame;

  /// 将命名模型字节注册进引擎的进程级命名空间。
  fn register_model(&self, name: &str, bytes: &[u8]) -> Result<Registered, Self::Error>;

  /// 绑定命名模型并构造分类器。模型必须已注册。
  fn load_classifier(&self, name: &str) -> Result<Self::Classifier, Self::Error>;

  /// 在彩色帧上就地绘制一个空心矩形，超出图像的部分被裁剪。
  fn draw_rect(&self, frame: &mut RgbaFrame, region: &Region, color: Color, stroke: u32);
}

#[cfg(feature = "proc_engine")]
mod proc;
#[cfg(feature = "proc_engine")]
pub use self::proc::{ClassifierBackend, ProcEngine, ProcEngineError};
