// 该文件是 Lianpu （脸谱） 项目的一部分。
// tests/common/synthetic.rs - 合成测试图像
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

use std::io::Cursor;

use image::{Rgba, RgbaImage};

pub const CANVAS_DARK: [u8; 4] = [15, 15, 20, 255];
pub const SQUARE_BRIGHT: [u8; 4] = [235, 235, 235, 255];

/// 深色背景上带一个亮方块的合成图像。
pub fn bright_square_rgba(width: u32, height: u32, sx: u32, sy: u32, size: u32) -> RgbaImage {
  assert!(width > 0 && height > 0, "图像尺寸必须为正");

  RgbaImage::from_fn(width, height, |x, y| {
    if x >= sx && x < sx + size && y >= sy && y < sy + size {
      Rgba(SQUARE_BRIGHT)
    } else {
      Rgba(CANVAS_DARK)
    }
  })
}

/// PNG 编码，作为编排入口的原始字节输入。
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
  let mut buf = Cursor::new(Vec::new());
  image
    .write_to(&mut buf, image::ImageFormat::Png)
    .expect("PNG 编码失败");
  buf.into_inner()
}
