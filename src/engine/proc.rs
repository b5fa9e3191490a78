// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/engine/proc.rs - 基于 image/imageproc 的内置引擎
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

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::edges::canny;
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::{CannyParams, Classifier, Color, Region, Registered, VisionEngine};
use crate::frame::{GrayFrame, RgbaFrame};

/// 级联匹配后端。
///
/// 级联匹配算法本身不在本库实现，由后端从模型字节构造分类器，
/// 例如绑定到某个本地视觉库；测试中用桩后端代替。
pub trait ClassifierBackend {
  type Classifier: Classifier;
  type Error: std::error::Error + Send + Sync + 'static;

  fn build(&self, name: &str, bytes: &[u8]) -> Result<Self::Classifier, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ProcEngineError<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  #[error("模型 '{0}' 未注册")]
  ModelNotRegistered(String),
  #[error("分类器构建失败: {0}")]
  ClassifierBuild(#[source] E),
}

/// 内置引擎：像素级能力由 image/imageproc 提供，级联匹配交给后端。
///
/// 模型命名空间为进程级可变状态，生命周期内不清理。
pub struct ProcEngine<B> {
  backend: B,
  models: Mutex<HashMap<String, Arc<[u8]>>>,
}

impl<B> ProcEngine<B> {
  pub fn new(backend: B) -> Self {
    ProcEngine {
      backend,
      models: Mutex::new(HashMap::new()),
    }
  }
}

impl<B: ClassifierBackend> VisionEngine for ProcEngine<B> {
  type Classifier = B::Classifier;
  type Error = ProcEngineError<B::Error>;

  fn to_grayscale(&self, frame: &RgbaFrame) -> GrayFrame {
    GrayFrame::from(image::imageops::grayscale(frame.as_image()))
  }

  fn canny_edges(&self, gray: &GrayFrame, params: &CannyParams) -> GrayFrame {
    GrayFrame::from(canny(gray.as_image(), params.low, params.high))
  }

  fn register_model(&self, name: &str, bytes: &[u8]) -> Result<Registered, Self::Error> {
    let mut models = self.models.lock().unwrap();
    if models.contains_key(name) {
      debug!("模型 '{}' 已在命名空间中，跳过注册", name);
      return Ok(Registered::AlreadyPresent);
    }

    models.insert(name.to_string(), Arc::from(bytes));
    info!("模型 '{}' 注册完成: {} 字节", name, bytes.len());
    Ok(Registered::Fresh)
  }

  fn load_classifier(&self, name: &str) -> Result<Self::Classifier, Self::Error> {
    let bytes = {
      let models = self.models.lock().unwrap();
      models.get(name).cloned()
    };
    let bytes = bytes.ok_or_else(|| ProcEngineError::ModelNotRegistered(name.to_string()))?;

    self
      .backend
      .build(name, &bytes)
      .map_err(ProcEngineError::ClassifierBuild)
  }

  fn draw_rect(&self, frame: &mut RgbaFrame, region: &Region, color: Color, stroke: u32) {
    let (fw, fh) = (frame.width(), frame.height());
    if region.x >= fw || region.y >= fh {
      return;
    }

    // 裁剪到图像边界
    let width = region.width.min(fw - region.x);
    let height = region.height.min(fh - region.y);
    if width == 0 || height == 0 {
      return;
    }

    // 逐层向内收缩，画出 stroke 像素宽的边框
    let image = frame.as_image_mut();
    for t in 0..stroke {
      let w = width.saturating_sub(2 * t);
      let h = height.saturating_sub(2 * t);
      if w == 0 || h == 0 {
        break;
      }

      let rect = Rect::at((region.x + t) as i32, (region.y + t) as i32).of_size(w, h);
      draw_hollow_rect_mut(image, rect, Rgba(color));
    }
  }
}
