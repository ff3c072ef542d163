// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 模型实现
// 包含: 模型加载、预处理、推理、后处理 (Detect / Classify)

use anyhow::{bail, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, ArrayView, Axis, IxDyn};
use tracing::info;

use crate::detection::{Bbox, DetectionResult, Embedding};
use crate::{non_max_suppression, Batch, OrtBackend, OrtConfig, OrtEP, YOLOTask};

/// 模型加载参数
#[derive(Debug, Clone)]
pub struct YOLOv8Config {
    pub model: String,
    pub task: YOLOTask,
    pub width: u32,
    pub height: u32,
    pub conf: f32,
    pub iou: f32,
    pub ep: OrtEP,
    pub intra_threads: usize,
    pub profile: bool,
}

impl YOLOv8Config {
    /// 检测模型默认参数
    pub fn detect(model: impl Into<String>, inf_size: u32) -> Self {
        Self {
            model: model.into(),
            task: YOLOTask::Detect,
            width: inf_size,
            height: inf_size,
            conf: 0.25,
            iou: 0.7,
            ep: OrtEP::CPU,
            intra_threads: 4,
            profile: false,
        }
    }

    /// 分类模型默认参数
    pub fn classify(model: impl Into<String>, inf_size: u32) -> Self {
        Self {
            task: YOLOTask::Classify,
            ..Self::detect(model, inf_size)
        }
    }
}

/// 解码检测输出 `[B, 4 + nc, A]` → 原图坐标下的框
///
/// 四个角分别裁剪到原图范围, 再按置信度过滤并逐类 NMS
pub fn decode_detections(
    preds: ArrayView<f32, IxDyn>,
    sizes: &[(u32, u32)],
    input_size: (u32, u32),
    conf: f32,
    iou: f32,
) -> Result<Vec<Vec<Bbox>>> {
    if preds.ndim() != 3 || preds.shape()[1] < 5 {
        bail!("Unexpected detection output shape {:?}", preds.shape());
    }
    if preds.shape()[0] < sizes.len() {
        bail!(
            "Detection batch {} smaller than {} input images",
            preds.shape()[0],
            sizes.len()
        );
    }

    let (w_in, h_in) = (input_size.0 as f32, input_size.1 as f32);
    let mut ys = Vec::with_capacity(sizes.len());
    for (idx, anchors) in preds.axis_iter(Axis(0)).enumerate().take(sizes.len()) {
        let (w0, h0) = (sizes[idx].0 as f32, sizes[idx].1 as f32);
        let ratio = (w_in / w0).min(h_in / h0);

        let mut data = Vec::new();
        // [4 + nc, A] → 每个 anchor 一列
        for pred in anchors.axis_iter(Axis(1)) {
            let clss = pred.slice(s![4..]);
            let (id, &confidence) = clss
                .iter()
                .enumerate()
                .reduce(|max, x| if x.1 > max.1 { x } else { max })
                .ok_or_else(|| anyhow::anyhow!("Detection output has no classes"))?;
            if confidence < conf {
                continue;
            }

            let (cx, cy) = (pred[0] / ratio, pred[1] / ratio);
            let (w, h) = (pred[2] / ratio, pred[3] / ratio);
            let x1 = (cx - w / 2.).clamp(0.0, w0);
            let y1 = (cy - h / 2.).clamp(0.0, h0);
            let x2 = (cx + w / 2.).clamp(0.0, w0);
            let y2 = (cy + h / 2.).clamp(0.0, h0);
            data.push(Bbox::new(x1, y1, x2 - x1, y2 - y1, id, confidence));
        }

        non_max_suppression(&mut data, iou);
        ys.push(data);
    }
    Ok(ys)
}

/// YOLOv8 完整模型结构
pub struct YOLOv8 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    task: YOLOTask,
    conf: f32,
    iou: f32,
    profile: bool,
}

impl YOLOv8 {
    pub fn new(config: YOLOv8Config) -> Result<Self> {
        let ort_args = OrtConfig {
            f: config.model,
            task: config.task,
            ep: config.ep,
            batch: Batch::default(),
            image_size: (config.height, config.width),
            intra_threads: config.intra_threads,
        };
        let engine = OrtBackend::build(ort_args)?;

        Ok(Self {
            height: engine.height(),
            width: engine.width(),
            task: engine.task(),
            engine,
            conf: config.conf,
            iou: config.iou,
            profile: config.profile,
        })
    }

    /// 等比缩放系数及缩放后尺寸
    pub(crate) fn scale_wh(w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
        let r = (w1 / w0).min(h1 / h0);
        (r, (w0 * r).round(), (h0 * r).round())
    }

    /// 图片 → NCHW 张量
    ///
    /// Detect: 等比缩放贴在左上角, 其余填充 144/255
    /// Classify: 直接拉伸到模型尺寸
    pub fn preprocess(&self, xs: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        let mut ys =
            Array::ones((xs.len(), 3, self.height as usize, self.width as usize)).into_dyn();
        ys.fill(144.0 / 255.0);
        for (idx, x) in xs.iter().enumerate() {
            let img = match self.task {
                YOLOTask::Classify => x.resize_exact(
                    self.width,
                    self.height,
                    image::imageops::FilterType::Triangle,
                ),
                YOLOTask::Detect => {
                    let (w0, h0) = x.dimensions();
                    let (_, w_new, h_new) = Self::scale_wh(
                        w0 as f32,
                        h0 as f32,
                        self.width as f32,
                        self.height as f32,
                    );
                    x.resize_exact(
                        w_new as u32,
                        h_new as u32,
                        image::imageops::FilterType::Triangle,
                    )
                }
            };

            for (x, y, rgb) in img.pixels() {
                let x = x as usize;
                let y = y as usize;
                let [r, g, b, _] = rgb.0;
                ys[[idx, 0, y, x]] = (r as f32) / 255.0;
                ys[[idx, 1, y, x]] = (g as f32) / 255.0;
                ys[[idx, 2, y, x]] = (b as f32) / 255.0;
            }
        }

        Ok(ys)
    }

    pub fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<DetectionResult>> {
        let Some(preds) = xs.first() else {
            bail!("Empty model output");
        };

        if let YOLOTask::Classify = self.task {
            let ys = preds
                .axis_iter(Axis(0))
                .map(|batch| DetectionResult::new(Some(Embedding::new(batch.into_owned())), None))
                .collect();
            return Ok(ys);
        }

        let sizes: Vec<(u32, u32)> = xs0.iter().map(|x| x.dimensions()).collect();
        let ys = decode_detections(
            preds.view(),
            &sizes,
            (self.width, self.height),
            self.conf,
            self.iou,
        )?
        .into_iter()
        .map(|data| DetectionResult::new(None, if data.is_empty() { None } else { Some(data) }))
        .collect();
        Ok(ys)
    }

    pub fn summary(&self) {
        info!(
            "📦 Summary: Task: {:?} | EP: {:?} | Batch: {} | Height: {} | Width: {} | conf: {} | iou: {}",
            self.task,
            self.engine.ep(),
            self.engine.batch(),
            self.height,
            self.width,
            self.conf,
            self.iou,
        );
    }
}

// 实现统一的 Model trait
impl super::Model for YOLOv8 {
    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Vec<Array<f32, IxDyn>>> {
        Ok(vec![YOLOv8::preprocess(self, images)?])
    }

    fn run(&mut self, xs: Vec<Array<f32, IxDyn>>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>> {
        let Some(x) = xs.into_iter().next() else {
            bail!("Empty model input");
        };
        self.engine.run(x, profile || self.profile)
    }

    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<DetectionResult>> {
        YOLOv8::postprocess(self, xs, xs0)
    }

    fn summary(&self) {
        YOLOv8::summary(self)
    }
}
