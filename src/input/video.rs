// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频解码: 视频文件 → PNG 图片序列 (000001.png, 000002.png ...)
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use ez_ffmpeg::{FfmpegContext, Input, Output};
use tracing::info;

pub fn extract_frames(video: &Path, dir: &Path) -> Result<usize> {
    if !video.is_file() {
        bail!("Video not found: {}", video.display());
    }
    super::prepare_frame_dir(dir)?;

    let pattern = dir.join("%06d.png").to_string_lossy().to_string();
    info!("🎬 解码视频: {} → {}", video.display(), pattern);

    let ctx = FfmpegContext::builder()
        .input(Input::from(video.to_string_lossy().to_string()))
        .output(Output::from(pattern))
        .build()
        .map_err(|e| anyhow!("构建失败: {}", e))?;
    ctx.start()
        .map_err(|e| anyhow!("启动失败: {}", e))?
        .wait()
        .map_err(|e| anyhow!("解码失败: {}", e))?;

    let frames = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
        .count();
    info!("✅ 解码完成: {} 帧", frames);
    Ok(frames)
}
