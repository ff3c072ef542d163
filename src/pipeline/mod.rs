// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 处理流水线 (Processing Pipeline)
///
/// 双线程架构, 通过 crossbeam 有界队列通信:
/// - Loader:   读取帧 (独立线程)
/// - Analyzer: 检测 → 分类 → 间距评估 → 标注 → 输出 (调用线程)
pub mod monitor;

use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::bounded;
use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info};

use crate::annotate::Annotator;
use crate::detection::{crop_person, Gender, GenderClassify, Person, PersonDetect};
use crate::input::FrameSource;
use crate::output::FrameSink;
use crate::proximity::{Point2, ProximityEvaluator, ProximityReport, ViolatingPair};

pub use monitor::{AlertMonitor, AlertTransition, RunSummary, STATUS_NORMAL, STATUS_TOO_CLOSE};

/// 帧队列容量
const FRAME_QUEUE: usize = 8;

/// 单帧分析结果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub index: u64,
    pub persons: Vec<Person>,
    pub report: ProximityReport,
}

impl FrameAnalysis {
    pub fn centers(&self) -> Vec<Point2> {
        self.persons.iter().map(|p| p.center()).collect()
    }

    pub fn record(&self) -> FrameRecord<'_> {
        FrameRecord {
            frame: self.index,
            person_count: self.persons.len(),
            persons: self
                .persons
                .iter()
                .map(|p| {
                    let c = p.center();
                    PersonRecord {
                        bbox: [p.bbox.x1, p.bbox.y1, p.bbox.x2, p.bbox.y2],
                        center: [c.x(), c.y()],
                        confidence: p.confidence,
                        gender: p.gender,
                    }
                })
                .collect(),
            pairs: self.report.pairs(),
            alert_active: self.report.alert_active(),
            alert_level: self.report.alert_level(),
            min_distance: self.report.min_distance(),
        }
    }
}

/// 每帧 JSON 记录
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub frame: u64,
    pub person_count: usize,
    pub persons: Vec<PersonRecord>,
    pub pairs: &'a [ViolatingPair],
    pub alert_active: bool,
    pub alert_level: u8,
    pub min_distance: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PersonRecord {
    pub bbox: [i32; 4],
    pub center: [f32; 2],
    pub confidence: f32,
    pub gender: Option<Gender>,
}

pub struct ThreatPipeline {
    detector: Box<dyn PersonDetect>,
    classifier: Option<Box<dyn GenderClassify>>,
    evaluator: ProximityEvaluator,
    annotator: Annotator,
    monitor: AlertMonitor,
    next_index: u64,
}

impl ThreatPipeline {
    pub fn new(
        detector: Box<dyn PersonDetect>,
        classifier: Option<Box<dyn GenderClassify>>,
        evaluator: ProximityEvaluator,
        annotator: Annotator,
    ) -> Self {
        info!(
            "🛠️ 流水线: 阈值 {}px | 性别分类 {}",
            evaluator.threshold(),
            if classifier.is_some() { "开启" } else { "关闭" }
        );
        Self {
            detector,
            classifier,
            evaluator,
            annotator,
            monitor: AlertMonitor::new(),
            next_index: 0,
        }
    }

    pub fn evaluator(&self) -> &ProximityEvaluator {
        &self.evaluator
    }

    pub fn monitor(&self) -> &AlertMonitor {
        &self.monitor
    }

    /// 检测 → 分类 → 间距评估
    pub fn analyze(&mut self, frame: &RgbImage) -> Result<FrameAnalysis> {
        let index = self.next_index;
        self.next_index += 1;

        let mut persons = self.detector.detect(frame)?;
        if let Some(classifier) = self.classifier.as_mut() {
            for person in persons.iter_mut() {
                match crop_person(frame, &person.bbox) {
                    Ok(crop) => person.gender = Some(classifier.classify(&crop)?),
                    Err(e) => debug!("⏭️ 帧 {}: 跳过分类 ({})", index, e),
                }
            }
        }

        let centers: Vec<Point2> = persons.iter().map(|p| p.center()).collect();
        let report = self.evaluator.evaluate(&centers)?;
        Ok(FrameAnalysis {
            index,
            persons,
            report,
        })
    }

    /// 分析并在帧上绘制结果
    pub fn process_frame(&mut self, frame: &mut RgbImage) -> Result<FrameAnalysis> {
        let analysis = self.analyze(frame)?;
        self.annotator
            .annotate(frame, &analysis.persons, &analysis.report);
        Ok(analysis)
    }

    /// 处理整个帧序列, 每帧依次交给所有输出端
    pub fn run<S>(&mut self, source: S, sinks: &mut [&mut dyn FrameSink]) -> Result<RunSummary>
    where
        S: FrameSource + 'static,
    {
        let (tx, rx) = bounded::<Result<RgbImage>>(FRAME_QUEUE);
        let loader = std::thread::spawn(move || {
            let mut source = source;
            loop {
                match source.next_frame() {
                    Ok(Some(frame)) => {
                        if tx.send(Ok(frame)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });

        let start = Instant::now();
        let mut summary = RunSummary::default();
        let result = (|| -> Result<()> {
            for item in rx.iter() {
                let mut frame = item?;
                let analysis = self.process_frame(&mut frame)?;
                let transition = self.monitor.observe(&analysis);
                summary.record(&analysis, transition);
                for sink in sinks.iter_mut() {
                    sink.write_frame(&frame, &analysis)?;
                }
                if summary.frames % 100 == 0 {
                    info!(
                        "⏱️ 已处理 {} 帧 | {:.1} fps",
                        summary.frames,
                        summary.frames as f64 / start.elapsed().as_secs_f64()
                    );
                }
            }
            Ok(())
        })();

        // 关闭接收端, 让加载线程退出
        drop(rx);
        loader
            .join()
            .map_err(|_| anyhow!("Frame loader thread panicked"))?;
        result?;

        for sink in sinks.iter_mut() {
            sink.finish()?;
        }
        info!(
            "🏁 完成: {} 帧 | 告警帧 {} | 告警次数 {} | 最多 {} 人 | {:.1}s",
            summary.frames,
            summary.frames_with_alert,
            summary.alert_events,
            summary.max_persons,
            start.elapsed().as_secs_f64()
        );
        Ok(summary)
    }
}
