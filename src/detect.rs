// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/detect.rs - 单检测器的检测与标注流水线
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

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{Classifier, Color, Region, VisionEngine};
use crate::frame::RgbaFrame;

const RECT_STROKE: u32 = 2;

const SCALE_FACTOR_DEFAULT: f32 = 1.1;
const MIN_NEIGHBORS_DEFAULT: u32 = 3;

// 误检率较高的检测器（如笑脸）使用的严格组合
const SCALE_FACTOR_STRICT: f32 = 1.7;
const MIN_NEIGHBORS_STRICT: u32 = 22;

/// 多尺度检测参数。
///
/// `scale_factor` 为搜索窗口的缩放步长，必须大于 1.0；`min_neighbors`
/// 为候选框合并阈值，越大误检越少、召回越低。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
  pub scale_factor: f32,
  pub min_neighbors: u32,
}

impl Default for DetectParams {
  fn default() -> Self {
    DetectParams {
      scale_factor: SCALE_FACTOR_DEFAULT,
      min_neighbors: MIN_NEIGHBORS_DEFAULT,
    }
  }
}

impl DetectParams {
  pub fn strict() -> Self {
    DetectParams {
      scale_factor: SCALE_FACTOR_STRICT,
      min_neighbors: MIN_NEIGHBORS_STRICT,
    }
  }
}

#[derive(Error, Debug)]
pub enum DetectError {
  #[error("缩放步长无效: {0} (必须大于 1.0)")]
  InvalidScaleFactor(f32),
  #[error("分类器加载失败: {0}")]
  ClassifierLoadFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("检测执行失败: {0}")]
  DetectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 一次检测的产物：画好检测框的彩色副本与对应区域。
///
/// 区域顺序与分类器返回顺序一致，不做重排。
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
  pub frame: RgbaFrame,
  pub regions: Vec<Region>,
  pub color: Color,
}

/// 对一帧彩色图像运行命名检测器并绘制检测框。
///
/// 调用方必须先通过 `AssetStore::ensure_loaded` 注册模型；本函数不做
/// 隐式加载。失败时所有中间缓冲随作用域释放，不返回画了一半的图像。
pub fn detect<E: VisionEngine>(
  engine: &E,
  frame: &RgbaFrame,
  model_name: &str,
  params: &DetectParams,
  color: Color,
) -> Result<AnnotatedFrame, DetectError> {
  if params.scale_factor <= 1.0 {
    return Err(DetectError::InvalidScaleFactor(params.scale_factor));
  }

  debug!(
    "检测开始: 模型 '{}', 缩放步长 {}, 最小邻居 {}",
    model_name, params.scale_factor, params.min_neighbors
  );
  let now = Instant::now();

  // 检测只在灰度图上进行
  let gray = engine.to_grayscale(frame);

  let mut classifier = engine
    .load_classifier(model_name)
    .map_err(|e| DetectError::ClassifierLoadFailed(Box::new(e)))?;

  let regions = classifier
    .detect_multi_scale(&gray, params.scale_factor, params.min_neighbors)
    .map_err(|e| DetectError::DetectionFailed(Box::new(e)))?;

  info!(
    "检测完成: 模型 '{}', {} 个区域, 耗时 {:.2?}",
    model_name,
    regions.len(),
    now.elapsed()
  );

  // 在原彩色图的副本上按返回顺序绘制检测框
  let mut annotated = frame.clone();
  for region in &regions {
    engine.draw_rect(&mut annotated, region, color, RECT_STROKE);
  }

  Ok(AnnotatedFrame {
    frame: annotated,
    regions,
    color,
  })
}
