// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 视频编码: 标注后的 PNG 图片序列 → MP4
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ez_ffmpeg::{FfmpegContext, Input, Output};
use tracing::info;

pub fn encode_frames(dir: &Path, fps: f64, output: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Frame dir not found: {}", dir.display());
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir: {}", parent.display()))?;
    }

    let pattern = dir.join("%06d.png").to_string_lossy().to_string();
    info!("🎞️ 编码视频: {} @ {}fps → {}", pattern, fps, output.display());

    let input =
        Input::from(pattern).set_input_opts([("framerate".to_string(), fps.to_string())].into());
    let ctx = FfmpegContext::builder()
        .input(input)
        .filter_descs(["format=yuv420p"].into())
        .output(Output::from(output.to_string_lossy().to_string()))
        .build()
        .map_err(|e| anyhow!("构建失败: {}", e))?;
    ctx.start()
        .map_err(|e| anyhow!("启动失败: {}", e))?
        .wait()
        .map_err(|e| anyhow!("编码失败: {}", e))?;

    info!("✅ 视频已保存: {}", output.display());
    Ok(())
}
