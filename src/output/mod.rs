// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 结果输出 (Frame Output)
///
/// - ImageSequenceWriter: 标注帧写为 000001.png ...
/// - ReportWriter: 每帧一行 JSON
/// - video (feature `video`): 图片序列编码为 MP4
#[cfg(feature = "video")]
pub mod video;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use tracing::info;

use crate::input::prepare_frame_dir;
use crate::pipeline::FrameAnalysis;

#[cfg(feature = "video")]
pub use video::encode_frames;

/// 帧输出端
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage, analysis: &FrameAnalysis) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct ImageSequenceWriter {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceWriter {
    /// 创建输出目录并清掉旧的 *.png 帧
    pub fn create(dir: &Path) -> Result<Self> {
        prepare_frame_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// 帧序号从 1 开始, 与 ffmpeg 的 %06d 序列一致
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{:06}.png", index + 1))
    }
}

impl FrameSink for ImageSequenceWriter {
    fn write_frame(&mut self, frame: &RgbImage, analysis: &FrameAnalysis) -> Result<()> {
        let path = self.frame_path(analysis.index);
        frame
            .save(&path)
            .with_context(|| format!("Failed to save frame: {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!("💾 已写入 {} 帧 → {}", self.written, self.dir.display());
        Ok(())
    }
}

/// JSON Lines 报告
pub struct ReportWriter<W: Write> {
    writer: W,
}

impl ReportWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create report: {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for ReportWriter<W> {
    fn write_frame(&mut self, _frame: &RgbImage, analysis: &FrameAnalysis) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &analysis.record())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proximity::ProximityReport;

    fn analysis(index: u64) -> FrameAnalysis {
        FrameAnalysis {
            index,
            persons: Vec::new(),
            report: ProximityReport::default(),
        }
    }

    #[test]
    fn test_frame_path_one_based() {
        let dir = std::env::temp_dir().join(format!("sentinel-out-{}", std::process::id()));
        let writer = ImageSequenceWriter::create(&dir).unwrap();
        assert_eq!(writer.frame_path(0), dir.join("000001.png"));
        assert_eq!(writer.frame_path(41), dir.join("000042.png"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_clears_previous_run() {
        let dir = std::env::temp_dir().join(format!("sentinel-rerun-{}", std::process::id()));
        let frame = RgbImage::new(2, 2);

        let mut first = ImageSequenceWriter::create(&dir).unwrap();
        for i in 0..5 {
            first.write_frame(&frame, &analysis(i)).unwrap();
        }
        let mut second = ImageSequenceWriter::create(&dir).unwrap();
        for i in 0..2 {
            second.write_frame(&frame, &analysis(i)).unwrap();
        }

        assert!(dir.join("000002.png").exists());
        assert!(!dir.join("000003.png").exists());
        assert_eq!(crate::input::ImageSequence::open(&dir).unwrap().len(), 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_report_writer_json_lines() {
        let mut writer = ReportWriter::new(Vec::new());
        let frame = RgbImage::new(2, 2);
        writer.write_frame(&frame, &analysis(0)).unwrap();
        writer.write_frame(&frame, &analysis(1)).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["frame"], 1);
        assert_eq!(lines[0]["alert_active"], false);
        assert_eq!(lines[0]["alert_level"], 0);
    }
}
