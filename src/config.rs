// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 运行配置 - 命令行参数 + JSON 配置文件

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::hub::default_model_dir;
use crate::models::{ModelSource, YOLOv8Config};
use crate::OrtEP;

/// 人员间距告警 (命令行)
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "人员检测 + 间距告警", long_about = None)]
pub struct Args {
    /// 输入: 图片目录, 或视频文件 (需要 `video` feature)
    #[arg(short, long)]
    pub input: PathBuf,

    /// 标注帧输出目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 输出视频路径 (需要 `video` feature)
    #[arg(long)]
    pub video_out: Option<PathBuf>,

    /// 每帧 JSON Lines 报告
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 距离阈值 (像素)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// 关闭性别分类
    #[arg(long)]
    pub no_classifier: bool,

    /// 检测模型路径
    #[arg(long)]
    pub detector_model: Option<String>,

    /// 分类模型路径
    #[arg(long)]
    pub classifier_model: Option<String>,

    /// 输出视频帧率
    #[arg(long)]
    pub fps: Option<f64>,

    /// 配置文件
    #[arg(short, long, default_value = "sentinel.json")]
    pub config: PathBuf,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// 模型缺失时自动下载
    #[arg(long)]
    pub download: bool,

    /// using CUDA EP
    #[arg(long)]
    pub cuda: bool,

    /// using TensorRT EP
    #[arg(long)]
    pub trt: bool,

    /// device id
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,
}

/// 单个模型的配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub repo_id: String,  // Hugging Face 仓库
    pub filename: String, // 仓库中的文件名
    #[serde(default)]
    pub path: Option<String>, // 本地路径 (优先)
    pub conf: f32,
    pub iou: f32,
    pub inference_size: u32,
}

impl ModelSpec {
    pub fn source(&self) -> ModelSource {
        ModelSource::new(self.repo_id.clone(), self.filename.clone())
    }

    /// 本地路径, 未配置时为 model_dir/filename
    pub fn resolve_path(&self, model_dir: &Path) -> PathBuf {
        match &self.path {
            Some(p) => PathBuf::from(p),
            None => model_dir.join(&self.filename),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub distance_threshold: f64, // 告警距离阈值 (像素)
    pub use_classifier: bool,    // 是否做性别分类
    pub detector: ModelSpec,
    pub classifier: ModelSpec,
    pub model_dir: String,
    pub intra_threads: usize,
    pub output_dir: String,
    pub output_video: String,
    #[serde(default)]
    pub report_path: Option<String>,
    pub video_fps: f64,
    #[serde(default)]
    pub font_path: Option<String>,
    #[serde(skip)]
    pub ep: OrtEP,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 300.0,
            use_classifier: true,
            detector: ModelSpec {
                repo_id: "PIA-SPACE-LAB/PersonDet_v3.2.0".to_string(),
                filename: "PersonDet_v3.2.0.onnx".to_string(),
                path: None,
                conf: 0.25,
                iou: 0.7,
                inference_size: 640,
            },
            classifier: ModelSpec {
                repo_id: "PIA-SPACE-LAB/PersonGenderCls_v3.2.0".to_string(),
                filename: "PersonGenderCls_v3.2.0.onnx".to_string(),
                path: None,
                conf: 0.0,
                iou: 0.0,
                inference_size: 224,
            },
            model_dir: default_model_dir().to_string_lossy().to_string(),
            intra_threads: 4,
            output_dir: "output/frames".to_string(),
            output_video: "output/result.mp4".to_string(),
            report_path: None,
            video_fps: 30.0,
            font_path: Some("assets/font/msyh.ttc".to_string()),
            ep: OrtEP::CPU,
        }
    }
}

impl SentinelConfig {
    /// 从JSON文件加载配置; 文件不存在时写入默认配置
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    info!("✅ 配置已从 {} 加载", path.display());
                    config
                }
                Err(e) => {
                    warn!("⚠️ 配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("📝 配置文件不存在, 创建默认配置...");
                let config = Self::default();
                if let Err(e) = config.save(path) {
                    warn!("❌ 保存配置失败: {}", e);
                }
                config
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 命令行参数覆盖配置文件
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(t) = args.threshold {
            self.distance_threshold = t;
        }
        if args.no_classifier {
            self.use_classifier = false;
        }
        if let Some(p) = &args.detector_model {
            self.detector.path = Some(p.clone());
        }
        if let Some(p) = &args.classifier_model {
            self.classifier.path = Some(p.clone());
        }
        if let Some(dir) = &args.output {
            self.output_dir = dir.to_string_lossy().to_string();
        }
        if let Some(v) = &args.video_out {
            self.output_video = v.to_string_lossy().to_string();
        }
        if let Some(r) = &args.report {
            self.report_path = Some(r.to_string_lossy().to_string());
        }
        if let Some(fps) = args.fps {
            self.video_fps = fps;
        }
        self.ep = if args.trt {
            OrtEP::Trt(args.device_id)
        } else if args.cuda {
            OrtEP::CUDA(args.device_id)
        } else {
            OrtEP::CPU
        };
    }

    pub fn validate(&self) -> Result<()> {
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            bail!(
                "distance_threshold must be a non-negative number, got {}",
                self.distance_threshold
            );
        }
        if !(self.video_fps.is_finite() && self.video_fps > 0.0) {
            bail!("video_fps must be positive, got {}", self.video_fps);
        }
        for spec in [&self.detector, &self.classifier] {
            if spec.inference_size == 0 {
                bail!("inference_size of {} must be positive", spec.filename);
            }
        }
        Ok(())
    }

    pub fn model_dir(&self) -> PathBuf {
        PathBuf::from(&self.model_dir)
    }

    /// 需要从 Hugging Face 下载的模型; 已配置本地路径的不下载
    pub fn downloads(&self) -> Vec<&ModelSpec> {
        let mut specs = vec![&self.detector];
        if self.use_classifier {
            specs.push(&self.classifier);
        }
        specs.retain(|spec| spec.path.is_none());
        specs
    }

    pub fn detector_config(&self) -> YOLOv8Config {
        let path = self.detector.resolve_path(&self.model_dir());
        let mut config = YOLOv8Config::detect(path.to_string_lossy(), self.detector.inference_size);
        config.conf = self.detector.conf;
        config.iou = self.detector.iou;
        config.ep = self.ep;
        config.intra_threads = self.intra_threads;
        config
    }

    pub fn classifier_config(&self) -> YOLOv8Config {
        let path = self.classifier.resolve_path(&self.model_dir());
        let mut config =
            YOLOv8Config::classify(path.to_string_lossy(), self.classifier.inference_size);
        config.ep = self.ep;
        config.intra_threads = self.intra_threads;
        config
    }

    pub fn print_summary(&self) {
        info!("🎛️ 当前配置:");
        info!("  距离阈值: {}px", self.distance_threshold);
        info!(
            "  性别分类: {}",
            if self.use_classifier { "开启" } else { "关闭" }
        );
        info!("  检测模型: {}", self.detector.resolve_path(&self.model_dir()).display());
        if self.use_classifier {
            info!(
                "  分类模型: {}",
                self.classifier.resolve_path(&self.model_dir()).display()
            );
        }
        info!("  执行设备: {:?}", self.ep);
    }
}
