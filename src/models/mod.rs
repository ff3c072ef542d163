// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 模型统一接口与实现
///
/// # 架构说明
///
/// - **YOLOv8**: 完整模型 (加载 → 预处理 → 推理 → 后处理)
///   - Detect: 人员检测
///   - Classify: 性别分类
/// - **hub**: 从 HuggingFace 下载模型权重
///
/// ## 使用示例
/// ```ignore
/// use threat_sentinel::models::{Model, YOLOv8, YOLOv8Config};
///
/// let mut model = YOLOv8::new(YOLOv8Config::detect("models/PersonDet.onnx", 640))?;
/// let results = model.forward(&images)?;
/// ```
use anyhow::Result;
use image::DynamicImage;
use ndarray::{Array, IxDyn};

use crate::detection::DetectionResult;

/// 统一的深度学习模型接口
///
/// ## 核心流程
/// ```text
/// 原始图片 → preprocess → ndarray张量
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 → postprocess → 检测结果
/// ```
pub trait Model: Send {
    /// 预处理: 图片 → NCHW 张量
    fn preprocess(&mut self, images: &[DynamicImage]) -> Result<Vec<Array<f32, IxDyn>>>;

    /// 推理: 执行模型前向传播, 返回原始输出(未解码)
    fn run(&mut self, xs: Vec<Array<f32, IxDyn>>, profile: bool) -> Result<Vec<Array<f32, IxDyn>>>;

    /// 后处理: 原始输出 → 检测结果
    ///
    /// # Arguments
    /// * `xs` - 模型原始输出
    /// * `xs0` - 原始图片(用于坐标还原)
    fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<DetectionResult>>;

    /// 完整的推理流程: preprocess → run → postprocess
    fn forward(&mut self, images: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
        let xs = self.preprocess(images)?;
        let ys = self.run(xs, false)?;
        self.postprocess(ys, images)
    }

    /// 打印模型信息
    fn summary(&self);
}

pub mod hub;
pub mod yolov8;

pub use hub::{ensure_model, ModelSource};
pub use yolov8::{decode_detections, YOLOv8, YOLOv8Config};
