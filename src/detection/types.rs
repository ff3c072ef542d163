// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use ndarray::{Array, IxDyn};
use serde::Serialize;

use crate::proximity::Point2;

/// 模型输出 (单张图片)
#[derive(Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub probs: Option<Embedding>,
    pub bboxes: Option<Vec<Bbox>>,
}

impl std::fmt::Debug for DetectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionResult")
            .field(
                "Probs(top5)",
                &format_args!("{:?}", self.probs().map(|probs| probs.topk(5))),
            )
            .field("Bboxes", &self.bboxes)
            .finish()
    }
}

impl DetectionResult {
    pub fn new(probs: Option<Embedding>, bboxes: Option<Vec<Bbox>>) -> Self {
        Self { probs, bboxes }
    }

    pub fn probs(&self) -> Option<&Embedding> {
        self.probs.as_ref()
    }

    pub fn bboxes(&self) -> Option<&Vec<Bbox>> {
        self.bboxes.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Embedding {
    // An float32 n-dims tensor
    data: Array<f32, IxDyn>,
}

impl Embedding {
    pub fn new(data: Array<f32, IxDyn>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array<f32, IxDyn> {
        &self.data
    }

    /// 分数最高的 k 个 (类别, 分数)
    pub fn topk(&self, k: usize) -> Vec<(usize, f32)> {
        let mut probs = self
            .data
            .iter()
            .enumerate()
            .map(|(a, b)| (a, *b))
            .collect::<Vec<_>>();
        probs.sort_by(|a, b| b.1.total_cmp(&a.1));
        probs.truncate(k);
        probs
    }

    pub fn top1(&self) -> Option<(usize, f32)> {
        self.topk(1).first().copied()
    }
}

/// 检测框 (xmin, ymin, width, height)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Bbox {
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            xmin: x1,
            ymin: y1,
            width: x2 - x1,
            height: y2 - y1,
            ..Default::default()
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn cxcy(&self) -> Point2 {
        Point2::new(self.xmin + self.width / 2., self.ymin + self.height / 2.)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = (self.xmin + self.width).min(another.xmin + another.width);
        let t = self.ymin.max(another.ymin);
        let b = (self.ymin + self.height).min(another.ymin + another.height);
        (r - l + 1.).max(0.) * (b - t + 1.).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        self.intersection_area(another) / self.union(another)
    }
}

/// 整数像素框 (x1, y1, x2, y2), 检测框坐标截断取整
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn from_bbox(bbox: &Bbox) -> Self {
        Self {
            x1: bbox.xmin() as i32,
            y1: bbox.ymin() as i32,
            x2: bbox.xmax() as i32,
            y2: bbox.ymax() as i32,
        }
    }

    /// 中心点: 整数除法 (x1 + x2) / 2
    pub fn center(&self) -> Point2 {
        Point2::from((
            (self.x1 + self.x2).div_euclid(2),
            (self.y1 + self.y2).div_euclid(2),
        ))
    }

    pub fn width(&self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }
}

/// 性别标签 (分类模型输出 0 = Female, 其余 = Male)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn from_class_id(id: usize) -> Self {
        if id == 0 {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

/// 单个检测到的人
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub bbox: PixelBox,
    pub confidence: f32,
    pub gender: Option<Gender>,
}

impl Person {
    pub fn new(bbox: PixelBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence,
            gender: None,
        }
    }

    pub fn center(&self) -> Point2 {
        self.bbox.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_pixel_box_center_truncates() {
        let bbox = Bbox::new(10.7, 20.2, 31.0, 11.5, 0, 0.9);
        let pb = PixelBox::from_bbox(&bbox);
        assert_eq!(
            pb,
            PixelBox {
                x1: 10,
                y1: 20,
                x2: 41,
                y2: 31
            }
        );
        // (10 + 41) / 2 = 25, (20 + 31) / 2 = 25
        assert_eq!(pb.center(), Point2::new(25.0, 25.0));
    }

    #[test]
    fn test_iou() {
        let a = Bbox::from_xyxy(0.0, 0.0, 9.0, 9.0);
        assert!(a.iou(&a) > 0.5);
        let b = Bbox::from_xyxy(100.0, 100.0, 109.0, 109.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_embedding_top1() {
        let e = Embedding::new(arr1(&[0.1f32, 0.7, 0.2]).into_dyn());
        assert_eq!(e.top1(), Some((1, 0.7)));
        assert_eq!(e.topk(2), vec![(1, 0.7), (2, 0.2)]);
    }

    #[test]
    fn test_gender_from_class_id() {
        assert_eq!(Gender::from_class_id(0), Gender::Female);
        assert_eq!(Gender::from_class_id(1), Gender::Male);
        assert_eq!(Gender::Male.label(), "Male");
    }
}
