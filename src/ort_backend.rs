// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理引擎封装

use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{Array, IxDyn};
use ort::execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 模型任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum YOLOTask {
    /// 目标检测, 输出 [batch, 4 + nc, anchors]
    Detect,
    /// 图像分类, 输出 [batch, nc]
    Classify,
}

/// 执行设备 (Execution Provider)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrtEP {
    #[default]
    CPU,
    CUDA(i32),
    Trt(i32),
}

#[derive(Debug, Clone, Copy)]
pub struct Batch {
    pub opt: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for Batch {
    fn default() -> Self {
        Self {
            opt: 1,
            min: 1,
            max: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: String,
    pub task: YOLOTask,
    pub ep: OrtEP,
    pub batch: Batch,
    /// (height, width)
    pub image_size: (u32, u32),
    pub intra_threads: usize,
}

pub struct OrtBackend {
    session: Session,
    task: YOLOTask,
    ep: OrtEP,
    batch: Batch,
    height: u32,
    width: u32,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let path = Path::new(&config.f);
        if !path.exists() {
            bail!("Model file does not exist: {}", path.display());
        }

        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        // CUDA / TensorRT 不可用时 ort 自动回退到CPU
        let builder = match config.ep {
            OrtEP::CPU => builder,
            OrtEP::CUDA(device_id) => builder.with_execution_providers([
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
            OrtEP::Trt(device_id) => builder.with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
        };

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model: {}", path.display()))?;
        info!("✅ 模型加载成功: {} ({:?}, {:?})", path.display(), config.task, config.ep);

        Ok(Self {
            session,
            task: config.task,
            ep: config.ep,
            batch: config.batch,
            height: config.image_size.0,
            width: config.image_size.1,
        })
    }

    /// 执行一次前向推理, 返回全部输出张量
    pub fn run(&mut self, xs: Array<f32, IxDyn>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let t = std::time::Instant::now();
        let input = Tensor::from_array(xs)?;
        let outputs = self.session.run(ort::inputs![input])?;

        let mut ys = Vec::new();
        for value in outputs.values() {
            let y = value.try_extract_array::<f32>()?;
            ys.push(y.into_owned());
        }
        if profile {
            debug!("[ORT Inference]: {:?}", t.elapsed());
        }
        if ys.is_empty() {
            bail!("Model produced no outputs");
        }
        Ok(ys)
    }

    pub fn task(&self) -> YOLOTask {
        self.task
    }

    pub fn ep(&self) -> &OrtEP {
        &self.ep
    }

    pub fn batch(&self) -> u32 {
        self.batch.opt
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}
