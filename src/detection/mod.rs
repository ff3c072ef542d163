// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测系统 (Detection System)
///
/// - Detector:   人员检测 (YOLOv8 Detect)
/// - Classifier: 性别分类 (YOLOv8 Classify, 可选)
pub mod classifier;
pub mod detector;
pub mod types;

pub use classifier::{crop_person, GenderClassifier, GenderClassify};
pub use detector::{PersonDetect, PersonDetector, PERSON_CLASS_ID};
pub use types::{Bbox, DetectionResult, Embedding, Gender, Person, PixelBox};
