// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 人员间距告警 (Proximity Sentinel)
///
/// 处理流程:
/// 1. 加载线程: 读取图片序列 (视频先解码为图片序列)
/// 2. 主线程:   人员检测 → 性别分类 → 间距评估 → 标注 → 写出
/// 3. 可选:     标注帧编码为 MP4
///
/// 运行: cargo run --release --bin sentinel -- --input frames/
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::{info, warn};

use threat_sentinel::annotate::Annotator;
use threat_sentinel::detection::{GenderClassifier, GenderClassify, PersonDetector};
use threat_sentinel::input::ImageSequence;
use threat_sentinel::models::ensure_model;
use threat_sentinel::output::{FrameSink, ImageSequenceWriter, ReportWriter};
use threat_sentinel::{
    gen_time_string, logging, Args, ProximityEvaluator, SentinelConfig, ThreatPipeline,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = logging::init(&args.log_dir)?;

    let mut config = SentinelConfig::load(&args.config);
    config.apply_args(&args);
    config.validate()?;
    config.print_summary();

    if args.download {
        for spec in config.downloads() {
            ensure_model(&spec.source(), &config.model_dir())?;
        }
    }

    let detector = PersonDetector::new(config.detector_config())?;
    let classifier: Option<Box<dyn GenderClassify>> = if config.use_classifier {
        Some(Box::new(GenderClassifier::new(config.classifier_config())?))
    } else {
        None
    };
    let evaluator = ProximityEvaluator::new(config.distance_threshold)?;
    let annotator = Annotator::new(config.font_path.as_deref().map(Path::new));
    let mut pipeline = ThreatPipeline::new(Box::new(detector), classifier, evaluator, annotator);

    let (frames_dir, from_video) = prepare_input(&args.input, &config)?;
    let source = ImageSequence::open(&frames_dir)?;
    if source.is_empty() {
        warn!("⚠️ 输入中没有图片帧: {}", frames_dir.display());
    }

    let output_dir = PathBuf::from(&config.output_dir);
    if same_dir(&frames_dir, &output_dir) {
        bail!(
            "Output dir must differ from the input frames: {}",
            output_dir.display()
        );
    }
    let mut writer = ImageSequenceWriter::create(&output_dir)?;
    let mut report = match &config.report_path {
        Some(p) => Some(ReportWriter::create(Path::new(p))?),
        None => None,
    };
    let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
    sinks.push(&mut writer);
    if let Some(r) = report.as_mut() {
        sinks.push(r);
    }

    let summary = pipeline.run(source, &mut sinks)?;

    if from_video || args.video_out.is_some() {
        encode_output(&output_dir, &config)?;
    }

    let summary_path = output_dir
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("summary_{}.json", gen_time_string("")));
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    info!("📊 统计已保存: {}", summary_path.display());
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// 返回图片帧目录, 以及输入是否为视频
fn prepare_input(input: &Path, config: &SentinelConfig) -> Result<(PathBuf, bool)> {
    if input.is_dir() {
        return Ok((input.to_path_buf(), false));
    }
    if !input.is_file() {
        bail!("Input not found: {}", input.display());
    }
    decode_video(input, config)
}

#[cfg(feature = "video")]
fn decode_video(input: &Path, config: &SentinelConfig) -> Result<(PathBuf, bool)> {
    let dir = PathBuf::from(&config.output_dir).with_file_name("input_frames");
    threat_sentinel::input::extract_frames(input, &dir)?;
    Ok((dir, true))
}

#[cfg(not(feature = "video"))]
fn decode_video(input: &Path, _config: &SentinelConfig) -> Result<(PathBuf, bool)> {
    bail!(
        "Video input requires the `video` feature: {}",
        input.display()
    )
}

#[cfg(feature = "video")]
fn encode_output(frames_dir: &Path, config: &SentinelConfig) -> Result<()> {
    threat_sentinel::output::encode_frames(
        frames_dir,
        config.video_fps,
        Path::new(&config.output_video),
    )
}

#[cfg(not(feature = "video"))]
fn encode_output(frames_dir: &Path, _config: &SentinelConfig) -> Result<()> {
    warn!(
        "⚠️ 未启用 `video` feature, 跳过视频编码, 标注帧位于 {}",
        frames_dir.display()
    );
    Ok(())
}
