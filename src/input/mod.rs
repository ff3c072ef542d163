// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频输入系统 (Frame Input)
///
/// - ImageSequence: 按文件名顺序读取目录中的图片帧
/// - video (feature `video`): ffmpeg 把视频解码为图片序列
#[cfg(feature = "video")]
pub mod video;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::info;

#[cfg(feature = "video")]
pub use video::extract_frames;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// 帧来源, 在独立的加载线程中被调用
pub trait FrameSource: Send {
    /// 读取下一帧, 没有更多帧时返回 `Ok(None)`
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// 图片序列 (目录)
pub struct ImageSequence {
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            bail!("Input is not a directory: {}", dir.display());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read dir: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        files.sort();
        info!("📂 输入: {} ({} 帧)", dir.display(), files.len());
        Ok(Self { files, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let img = image::open(path)
            .with_context(|| format!("Failed to decode frame: {}", path.display()))?;
        Ok(Some(img.to_rgb8()))
    }
}

/// 内存中的帧序列
pub struct MemorySource {
    frames: std::vec::IntoIter<RgbImage>,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.next())
    }
}

/// 创建帧目录, 并删除上一次运行留下的 *.png
///
/// 其它文件保持不动, 返回删除的帧数
pub fn prepare_frame_dir(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create dir: {}", dir.display()))?;
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale frame: {}", path.display()))?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!("🧹 清理旧帧: {} 张 ({})", removed, dir.display());
    }
    Ok(removed)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sequence_order() {
        let dir = std::env::temp_dir().join(format!("sentinel-seq-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, shade) in [("000002.png", 2u8), ("000001.png", 1), ("000003.png", 3)] {
            RgbImage::from_pixel(4, 4, image::Rgb([shade, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let mut seq = ImageSequence::open(&dir).unwrap();
        assert_eq!(seq.len(), 3);
        let mut shades = Vec::new();
        while let Some(frame) = seq.next_frame().unwrap() {
            shades.push(frame.get_pixel(0, 0).0[0]);
        }
        assert_eq!(shades, vec![1, 2, 3]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prepare_frame_dir_removes_stale_png() {
        let dir = std::env::temp_dir().join(format!("sentinel-stale-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["000001.png", "000002.PNG", "000003.png"] {
            RgbImage::new(2, 2).save_with_format(dir.join(name), image::ImageFormat::Png).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "keep").unwrap();

        assert_eq!(prepare_frame_dir(&dir).unwrap(), 3);
        assert!(ImageSequence::open(&dir).unwrap().is_empty());
        assert!(dir.join("notes.txt").exists());
        assert_eq!(prepare_frame_dir(&dir).unwrap(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(prepare_frame_dir(&dir).unwrap(), 0);
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_dir() {
        assert!(ImageSequence::open(Path::new("/definitely/not/here")).is_err());
    }
}
