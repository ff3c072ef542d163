// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 人员检测器 (Person Detector)
//! 职责: RGB帧 → YOLO检测 → 只保留 person(class=0) → 整数像素框 + 中心点

use std::time::Instant;

use anyhow::Result;
use image::{DynamicImage, RgbImage};
use tracing::debug;

use super::types::{PixelBox, Person};
use crate::models::{Model, YOLOv8, YOLOv8Config};

/// COCO 类别 0 = person
pub const PERSON_CLASS_ID: usize = 0;

/// 人员检测接口, 便于替换模型或在测试中注入
pub trait PersonDetect: Send {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Person>>;
}

pub struct PersonDetector {
    model: Box<dyn Model>,
    count: u64,
}

impl PersonDetector {
    pub fn new(config: YOLOv8Config) -> Result<Self> {
        let model = YOLOv8::new(config)?;
        model.summary();
        Ok(Self::with_model(Box::new(model)))
    }

    pub fn with_model(model: Box<dyn Model>) -> Self {
        Self { model, count: 0 }
    }
}

impl PersonDetect for PersonDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<Person>> {
        let start = Instant::now();
        let images = [DynamicImage::ImageRgb8(frame.clone())];
        let results = self.model.forward(&images)?;

        let persons: Vec<Person> = results
            .iter()
            .filter_map(|r| r.bboxes())
            .flatten()
            .filter(|bbox| bbox.id() == PERSON_CLASS_ID)
            .map(|bbox| Person::new(PixelBox::from_bbox(bbox), bbox.confidence()))
            .collect();

        self.count += 1;
        if self.count % 30 == 0 {
            debug!(
                "🎯 检测: {}人 | {:.1}ms/帧",
                persons.len(),
                start.elapsed().as_secs_f64() * 1000.0
            );
        }
        Ok(persons)
    }
}
