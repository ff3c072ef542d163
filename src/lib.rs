#![allow(clippy::type_complexity)]
// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod annotate; // 结果标注
pub mod config; // 运行配置参数
pub mod detection; // 人员检测 + 性别分类
pub mod input; // 帧输入
pub mod logging; // 日志
pub mod models; // 模型接口与具体实现
pub mod ort_backend;
pub mod output; // 帧输出
pub mod pipeline; // 处理流水线
pub mod proximity; // 人员间距告警

pub use crate::config::{Args, SentinelConfig};
pub use crate::detection::{Bbox, Person};
pub use crate::models::{Model, YOLOv8, YOLOv8Config};
pub use crate::ort_backend::{Batch, OrtBackend, OrtConfig, OrtEP, YOLOTask};
pub use crate::pipeline::{FrameAnalysis, RunSummary, ThreatPipeline};
pub use crate::proximity::{
    euclidean_distance, pairwise_distances, Point2, ProximityError, ProximityEvaluator,
    ProximityReport, ViolatingPair,
};

/// 逐类 NMS, 不同类别的框互不抑制
pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if xs[prev_index].id() != xs[index].id() {
                continue;
            }
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
