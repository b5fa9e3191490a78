// 该文件是 Lianpu （脸谱） 项目的一部分。
// tests/common/stub.rs - 级联后端与资源获取的测试桩
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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use lianpu::assets::FetchAsset;
use lianpu::engine::{Classifier, ClassifierBackend, Region};
use lianpu::frame::GrayFrame;

#[derive(Debug, Error)]
pub enum StubError {
  #[error("分类器构建被拒绝: {0}")]
  Build(String),
  #[error("检测运行时故障")]
  Detect,
}

/// 桩分类器的行为配置。
#[derive(Debug, Clone)]
pub enum StubBehavior {
  /// 固定返回这些区域
  Regions(Vec<Region>),
  /// 检测调用失败
  FailDetect,
  /// 误检数量与 min_neighbors 成反比: base / (min_neighbors + 1)
  FalsePositives(u32),
}

pub struct StubClassifier {
  behavior: StubBehavior,
}

impl Classifier for StubClassifier {
  type Error = StubError;

  fn detect_multi_scale(
    &mut self,
    _gray: &GrayFrame,
    _scale_factor: f32,
    min_neighbors: u32,
  ) -> Result<Vec<Region>, Self::Error> {
    match &self.behavior {
      StubBehavior::Regions(regions) => Ok(regions.clone()),
      StubBehavior::FailDetect => Err(StubError::Detect),
      StubBehavior::FalsePositives(base) => {
        let count = base / (min_neighbors + 1);
        Ok(
          (0..count)
            .map(|i| Region {
              x: 2 * i,
              y: 2 * i,
              width: 5,
              height: 5,
            })
            .collect(),
        )
      }
    }
  }
}

/// 按模型名配置行为的级联后端桩。未配置的名称构造空结果分类器。
#[derive(Default)]
pub struct StubBackend {
  behaviors: HashMap<String, StubBehavior>,
  fail_build: HashSet<String>,
}

impl StubBackend {
  pub fn new() -> Self {
    StubBackend::default()
  }

  pub fn with_regions(mut self, name: &str, regions: Vec<Region>) -> Self {
    self
      .behaviors
      .insert(name.to_string(), StubBehavior::Regions(regions));
    self
  }

  pub fn with_false_positives(mut self, name: &str, base: u32) -> Self {
    self
      .behaviors
      .insert(name.to_string(), StubBehavior::FalsePositives(base));
    self
  }

  pub fn with_fail_detect(mut self, name: &str) -> Self {
    self
      .behaviors
      .insert(name.to_string(), StubBehavior::FailDetect);
    self
  }

  pub fn with_fail_build(mut self, name: &str) -> Self {
    self.fail_build.insert(name.to_string());
    self
  }
}

impl ClassifierBackend for StubBackend {
  type Classifier = StubClassifier;
  type Error = StubError;

  fn build(&self, name: &str, _bytes: &[u8]) -> Result<Self::Classifier, Self::Error> {
    if self.fail_build.contains(name) {
      return Err(StubError::Build(name.to_string()));
    }

    let behavior = self
      .behaviors
      .get(name)
      .cloned()
      .unwrap_or(StubBehavior::Regions(Vec::new()));
    Ok(StubClassifier { behavior })
  }
}

#[derive(Debug, Error)]
#[error("资源 '{0}' 不可用")]
pub struct FetchRefused(pub String);

/// 内存中的模型资源桩，统计获取次数。
#[derive(Default)]
pub struct MemoryFetcher {
  assets: HashMap<String, Vec<u8>>,
  refuse: HashSet<String>,
  fetches: Arc<AtomicUsize>,
}

impl MemoryFetcher {
  pub fn new() -> Self {
    MemoryFetcher::default()
  }

  pub fn with_asset(mut self, name: &str) -> Self {
    self.assets.insert(name.to_string(), b"<cascade/>".to_vec());
    self
  }

  pub fn with_refused(mut self, name: &str) -> Self {
    self.refuse.insert(name.to_string());
    self
  }

  /// 获取计数器句柄，fetcher 移交给 AssetStore 之后仍可观察。
  pub fn counter(&self) -> Arc<AtomicUsize> {
    self.fetches.clone()
  }
}

impl FetchAsset for MemoryFetcher {
  type Error = FetchRefused;

  fn fetch(&self, name: &str) -> Result<Vec<u8>, Self::Error> {
    self.fetches.fetch_add(1, Ordering::SeqCst);

    if self.refuse.contains(name) {
      return Err(FetchRefused(name.to_string()));
    }
    self
      .assets
      .get(name)
      .cloned()
      .ok_or_else(|| FetchRefused(name.to_string()))
  }
}
