// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/assets.rs - 模型资源获取与进程级缓存
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

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::engine::{Registered, VisionEngine};
use crate::{FromUrl, FromUrlWithScheme};

/// 模型资源获取方式，可注入以便测试替换。
pub trait FetchAsset {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch(&self, name: &str) -> Result<Vec<u8>, Self::Error>;
}

#[derive(Error, Debug)]
pub enum LoadError {
  #[error("模型资源获取失败: {0}")]
  FetchFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("模型注册失败: {0}")]
  RegistrationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

const FILE_FETCHER_SCHEME: &str = "model";
const MODEL_FILE_PREFIX: &str = "haar_";
const MODEL_FILE_EXT: &str = "xml";

#[derive(Error, Debug)]
pub enum FileFetchError {
  #[error("URI 方案不匹配: 期望 '{0}', 实际 '{1}'")]
  SchemeMismatch(String, String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 从本地目录按名称读取级联模型文件。
///
/// 名称到文件名的映射固定为 `haar_<name>.xml`，例如 "face" 对应
/// `haar_face.xml`。
pub struct FileFetcher {
  dir: PathBuf,
}

impl FileFetcher {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    FileFetcher { dir: dir.into() }
  }

  fn model_path(&self, name: &str) -> PathBuf {
    self
      .dir
      .join(format!("{}{}.{}", MODEL_FILE_PREFIX, name, MODEL_FILE_EXT))
  }
}

impl FromUrlWithScheme for FileFetcher {
  const SCHEME: &'static str = FILE_FETCHER_SCHEME;
}

impl FromUrl for FileFetcher {
  type Error = FileFetchError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FileFetchError::SchemeMismatch(
        Self::SCHEME.to_string(),
        url.scheme().to_string(),
      ));
    }

    Ok(FileFetcher::new(url.path()))
  }
}

impl FetchAsset for FileFetcher {
  type Error = FileFetchError;

  fn fetch(&self, name: &str) -> Result<Vec<u8>, Self::Error> {
    let path = self.model_path(name);
    debug!("读取模型文件: {}", path.display());
    Ok(std::fs::read(&path)?)
  }
}

/// 命名模型资源的进程级缓存。
///
/// 同一名称最多成功获取一次；之后的 `ensure_loaded` 直接返回，不做 I/O。
/// 缓存没有显式清理，随进程存活。
pub struct AssetStore<F> {
  fetcher: F,
  loaded: Mutex<HashSet<String>>,
}

impl<F: FetchAsset> AssetStore<F> {
  pub fn new(fetcher: F) -> Self {
    AssetStore {
      fetcher,
      loaded: Mutex::new(HashSet::new()),
    }
  }

  pub fn is_loaded(&self, name: &str) -> bool {
    self.loaded.lock().unwrap().contains(name)
  }

  /// 确保命名模型已获取并注册到引擎命名空间。
  ///
  /// 获取或注册失败时不记录该名称，下次调用会重新尝试。
  pub fn ensure_loaded<E: VisionEngine>(&self, engine: &E, name: &str) -> Result<(), LoadError> {
    if self.is_loaded(name) {
      debug!("模型 '{}' 已加载，跳过获取", name);
      return Ok(());
    }

    info!("获取模型资源: {}", name);
    let bytes = self
      .fetcher
      .fetch(name)
      .map_err(|e| LoadError::FetchFailed(Box::new(e)))?;
    debug!("模型 '{}' 获取完成: {} 字节", name, bytes.len());

    let registered = engine
      .register_model(name, &bytes)
      .map_err(|e| LoadError::RegistrationFailed(Box::new(e)))?;
    match registered {
      Registered::Fresh => info!("模型 '{}' 注册完成", name),
      // 重复注册按成功处理
      Registered::AlreadyPresent => debug!("模型 '{}' 已存在于引擎命名空间", name),
    }

    self.loaded.lock().unwrap().insert(name.to_string());
    Ok(())
  }
}
