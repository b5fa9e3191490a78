// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/task.rs - 多检测器编排任务
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
use tracing::{debug, info, warn};

use crate::assets::{AssetStore, FetchAsset, LoadError};
use crate::detect::{self, AnnotatedFrame, DetectError, DetectParams};
use crate::engine::{CannyParams, Color, VisionEngine};
use crate::frame::{DecodeError, GrayFrame, RgbaFrame};

// 各检测器的固定框色，保证输出可以一眼区分
const FACE_COLOR: Color = [255, 0, 0, 255];
const EYE_COLOR: Color = [0, 255, 0, 255];
const SMILE_COLOR: Color = [0, 0, 255, 255];

/// 一个已配置检测器：模型名、检测参数与框色。
#[derive(Debug, Clone)]
pub struct DetectorSpec {
  pub name: String,
  pub params: DetectParams,
  pub color: Color,
}

impl DetectorSpec {
  pub fn new(name: impl Into<String>, params: DetectParams, color: Color) -> Self {
    DetectorSpec {
      name: name.into(),
      params,
      color,
    }
  }

  pub fn face() -> Self {
    DetectorSpec::new("face", DetectParams::default(), FACE_COLOR)
  }

  pub fn eye() -> Self {
    DetectorSpec::new("eye", DetectParams::default(), EYE_COLOR)
  }

  pub fn smile() -> Self {
    DetectorSpec::new("smile", DetectParams::strict(), SMILE_COLOR)
  }
}

#[derive(Error, Debug)]
pub enum StageError {
  #[error("模型加载错误: {0}")]
  Load(#[from] LoadError),
  #[error("检测错误: {0}")]
  Detect(#[from] DetectError),
}

/// 单个检测器的阶段状态机：
/// Pending → Loading → Detecting → {Succeeded, Failed}。
///
/// 没有重试：一次编排中失败的检测器保持 Failed，下一张图像从
/// Pending 重新开始。
#[derive(Debug)]
pub enum StageState {
  Pending,
  Loading,
  Detecting,
  Succeeded(AnnotatedFrame),
  Failed(StageError),
}

impl StageState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, StageState::Succeeded(_) | StageState::Failed(_))
  }

  pub fn is_succeeded(&self) -> bool {
    matches!(self, StageState::Succeeded(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, StageState::Failed(_))
  }

  pub fn annotated(&self) -> Option<&AnnotatedFrame> {
    match self {
      StageState::Succeeded(annotated) => Some(annotated),
      _ => None,
    }
  }
}

#[derive(Debug)]
pub struct DetectorOutcome {
  pub name: String,
  pub state: StageState,
}

/// 一次编排的完整产物：灰度图、边缘图与每个检测器的独立结果。
#[derive(Debug)]
pub struct PipelineReport {
  pub gray: GrayFrame,
  pub edges: GrayFrame,
  pub detectors: Vec<DetectorOutcome>,
}

impl PipelineReport {
  pub fn outcome(&self, name: &str) -> Option<&StageState> {
    self
      .detectors
      .iter()
      .find(|outcome| outcome.name == name)
      .map(|outcome| &outcome.state)
  }

  pub fn succeeded(&self) -> usize {
    self
      .detectors
      .iter()
      .filter(|outcome| outcome.state.is_succeeded())
      .count()
  }

  pub fn failed(&self) -> usize {
    self
      .detectors
      .iter()
      .filter(|outcome| outcome.state.is_failed())
      .count()
  }
}

/// 对一张输入图像顺序执行灰度、边缘与全部已配置检测器。
///
/// 检测器严格串行，单个失败不影响其余检测器，也不影响灰度与
/// 边缘阶段。
pub struct Orchestrator<E, F> {
  engine: E,
  assets: AssetStore<F>,
  canny: CannyParams,
  detectors: Vec<DetectorSpec>,
}

impl<E: VisionEngine, F: FetchAsset> Orchestrator<E, F> {
  pub fn new(engine: E, assets: AssetStore<F>) -> Self {
    Orchestrator {
      engine,
      assets,
      canny: CannyParams::default(),
      detectors: Vec::new(),
    }
  }

  pub fn with_canny(mut self, params: CannyParams) -> Self {
    self.canny = params;
    self
  }

  pub fn with_detector(mut self, spec: DetectorSpec) -> Self {
    self.detectors.push(spec);
    self
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  /// 解码原始字节并编排。解码失败终止整次编排，不进入任何阶段。
  pub fn process(&self, bytes: &[u8]) -> Result<PipelineReport, DecodeError> {
    let frame = RgbaFrame::decode(bytes)?;
    Ok(self.process_frame(&frame))
  }

  /// 对已解码的帧编排。每个新帧都是一次全新的编排，缓冲互不共享。
  pub fn process_frame(&self, frame: &RgbaFrame) -> PipelineReport {
    info!(
      "开始编排: {}x{}, {} 个检测器",
      frame.width(),
      frame.height(),
      self.detectors.len()
    );
    let now = Instant::now();

    // 灰度图只生成一次，边缘检测复用它
    let gray = self.engine.to_grayscale(frame);
    let edges = self.engine.canny_edges(&gray, &self.canny);
    debug!("灰度与边缘阶段完成, 耗时 {:.2?}", now.elapsed());

    let mut outcomes: Vec<DetectorOutcome> = self
      .detectors
      .iter()
      .map(|spec| DetectorOutcome {
        name: spec.name.clone(),
        state: StageState::Pending,
      })
      .collect();

    for (spec, outcome) in self.detectors.iter().zip(outcomes.iter_mut()) {
      self.run_detector(frame, spec, &mut outcome.state);
    }

    info!(
      "编排完成: {} 成功, {} 失败, 耗时 {:.2?}",
      outcomes
        .iter()
        .filter(|outcome| outcome.state.is_succeeded())
        .count(),
      outcomes
        .iter()
        .filter(|outcome| outcome.state.is_failed())
        .count(),
      now.elapsed()
    );

    PipelineReport {
      gray,
      edges,
      detectors: outcomes,
    }
  }

  // 推进单个检测器的状态机直至终态
  fn run_detector(&self, frame: &RgbaFrame, spec: &DetectorSpec, state: &mut StageState) {
    let now = Instant::now();

    *state = StageState::Loading;
    debug!("检测器 '{}': Pending → Loading", spec.name);
    if let Err(e) = self.assets.ensure_loaded(&self.engine, &spec.name) {
      warn!("检测器 '{}' 模型加载失败: {}", spec.name, e);
      *state = StageState::Failed(StageError::Load(e));
      return;
    }

    *state = StageState::Detecting;
    debug!("检测器 '{}': Loading → Detecting", spec.name);
    match detect::detect(&self.engine, frame, &spec.name, &spec.params, spec.color) {
      Ok(annotated) => {
        info!(
          "检测器 '{}' 完成: {} 个区域, 耗时 {:.2?}",
          spec.name,
          annotated.regions.len(),
          now.elapsed()
        );
        *state = StageState::Succeeded(annotated);
      }
      Err(e) => {
        warn!("检测器 '{}' 检测失败: {}", spec.name, e);
        *state = StageState::Failed(StageError::Detect(e));
      }
    }
  }
}
