// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 性别分类器 (Gender Classifier)
//! 职责: 人员裁剪图 → YOLO分类 → argmax → Gender

use anyhow::{bail, Result};
use image::{imageops, DynamicImage, RgbImage};

use super::types::{Gender, PixelBox};
use crate::models::{Model, YOLOv8, YOLOv8Config};

pub trait GenderClassify: Send {
    fn classify(&mut self, crop: &RgbImage) -> Result<Gender>;
}

pub struct GenderClassifier {
    model: Box<dyn Model>,
}

impl GenderClassifier {
    pub fn new(config: YOLOv8Config) -> Result<Self> {
        let model = YOLOv8::new(config)?;
        model.summary();
        Ok(Self::with_model(Box::new(model)))
    }

    pub fn with_model(model: Box<dyn Model>) -> Self {
        Self { model }
    }
}

impl GenderClassify for GenderClassifier {
    fn classify(&mut self, crop: &RgbImage) -> Result<Gender> {
        let images = [DynamicImage::ImageRgb8(crop.clone())];
        let results = self.model.forward(&images)?;
        let Some((id, _)) = results
            .first()
            .and_then(|r| r.probs())
            .and_then(|p| p.top1())
        else {
            bail!("Classifier returned no scores");
        };
        Ok(Gender::from_class_id(id))
    }
}

/// 按像素框裁剪 (框会被限制在帧内)
///
/// 裁剪区域为空时返回错误
pub fn crop_person(frame: &RgbImage, bbox: &PixelBox) -> Result<RgbImage> {
    let (w, h) = frame.dimensions();
    let x1 = bbox.x1.clamp(0, w as i32) as u32;
    let y1 = bbox.y1.clamp(0, h as i32) as u32;
    let x2 = bbox.x2.clamp(0, w as i32) as u32;
    let y2 = bbox.y2.clamp(0, h as i32) as u32;
    if x2 <= x1 || y2 <= y1 {
        bail!("Empty crop for box {:?} in {}x{} frame", bbox, w, h);
    }
    Ok(imageops::crop_imm(frame, x1, y1, x2 - x1, y2 - y1).to_image())
}
