// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::collections::VecDeque;

use anyhow::{bail, Result};
use image::RgbImage;

use threat_sentinel::annotate::{Annotator, COLOR_VIOLATION};
use threat_sentinel::detection::{Gender, GenderClassify, Person, PersonDetect, PixelBox};
use threat_sentinel::input::{FrameSource, MemorySource};
use threat_sentinel::output::{FrameSink, ReportWriter};
use threat_sentinel::{FrameAnalysis, ProximityEvaluator, RunSummary, ThreatPipeline};

/// 按顺序返回预设的人员列表
struct ScriptedDetector {
    frames: VecDeque<Vec<Person>>,
}

impl PersonDetect for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Person>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

/// 窄框判为女性, 宽框判为男性
struct WidthClassifier;

impl GenderClassify for WidthClassifier {
    fn classify(&mut self, crop: &RgbImage) -> Result<Gender> {
        Ok(if crop.width() > 40 {
            Gender::Male
        } else {
            Gender::Female
        })
    }
}

struct FailingDetector;

impl PersonDetect for FailingDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<Person>> {
        bail!("model exploded")
    }
}

struct BrokenSource {
    remaining: usize,
}

impl FrameSource for BrokenSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            bail!("corrupt frame");
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::new(64, 64)))
    }
}

#[derive(Default)]
struct CollectSink {
    frames: Vec<(RgbImage, FrameAnalysis)>,
    finished: bool,
}

impl FrameSink for CollectSink {
    fn write_frame(&mut self, frame: &RgbImage, analysis: &FrameAnalysis) -> Result<()> {
        self.frames.push((frame.clone(), analysis.clone()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

fn person(x1: i32, y1: i32, x2: i32, y2: i32) -> Person {
    Person::new(PixelBox { x1, y1, x2, y2 }, 0.9)
}

fn scripted() -> ScriptedDetector {
    ScriptedDetector {
        frames: VecDeque::from(vec![
            // 中心 (125,150) 与 (225,150), 相距 100
            vec![person(100, 100, 150, 200), person(200, 100, 250, 200)],
            // 相距 460
            vec![person(100, 100, 150, 200), person(560, 100, 610, 200)],
            // 前两人相距 110, 第三人很远
            vec![
                person(0, 0, 30, 100),
                person(100, 0, 150, 100),
                person(500, 300, 560, 400),
            ],
        ]),
    }
}

fn blank_frames(n: usize) -> MemorySource {
    MemorySource::new((0..n).map(|_| RgbImage::new(640, 480)).collect())
}

fn pipeline(
    detector: Box<dyn PersonDetect>,
    classifier: Option<Box<dyn GenderClassify>>,
) -> ThreatPipeline {
    ThreatPipeline::new(
        detector,
        classifier,
        ProximityEvaluator::new(300.0).unwrap(),
        Annotator::without_text(),
    )
}

#[test]
fn run_reports_alerts_per_frame() {
    let mut pipeline = pipeline(Box::new(scripted()), Some(Box::new(WidthClassifier)));
    let mut collect = CollectSink::default();
    let mut report = ReportWriter::new(Vec::new());

    let summary = {
        let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
        sinks.push(&mut collect);
        sinks.push(&mut report);
        pipeline.run(blank_frames(3), &mut sinks).unwrap()
    };

    assert_eq!(
        summary,
        RunSummary {
            frames: 3,
            frames_with_alert: 2,
            max_persons: 3,
            alert_events: 2,
        }
    );
    assert!(collect.finished);

    let analyses: Vec<&FrameAnalysis> = collect.frames.iter().map(|(_, a)| a).collect();
    assert_eq!(
        analyses.iter().map(|a| a.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(analyses[0].report.alert_level(), 100);
    assert_eq!(analyses[1].report.alert_level(), 0);
    assert_eq!(analyses[2].report.pairs().len(), 1);
    assert_eq!(
        (analyses[2].report.pairs()[0].i, analyses[2].report.pairs()[0].j),
        (0, 1)
    );
    assert_eq!(analyses[2].persons[0].gender, Some(Gender::Female));
    assert_eq!(analyses[2].persons[1].gender, Some(Gender::Male));

    // 第一帧两中心点之间画了红线
    let (frame0, _) = &collect.frames[0];
    assert_eq!(frame0.get_pixel(175, 150), &COLOR_VIOLATION);
    let (frame1, _) = &collect.frames[1];
    assert_ne!(frame1.get_pixel(300, 150), &COLOR_VIOLATION);

    let text = String::from_utf8(report.into_inner()).unwrap();
    let levels: Vec<u64> = text
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["alert_level"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(levels, vec![100, 0, 100]);
}

#[test]
fn without_classifier_genders_stay_empty() {
    let mut pipeline = pipeline(Box::new(scripted()), None);
    let analysis = pipeline.analyze(&RgbImage::new(640, 480)).unwrap();
    assert_eq!(analysis.persons.len(), 2);
    assert!(analysis.persons.iter().all(|p| p.gender.is_none()));
    assert!(analysis.report.alert_active());
}

#[test]
fn empty_frame_has_no_alert() {
    let detector = ScriptedDetector {
        frames: VecDeque::new(),
    };
    let mut pipeline = pipeline(Box::new(detector), Some(Box::new(WidthClassifier)));
    let mut frame = RgbImage::new(64, 64);
    let analysis = pipeline.process_frame(&mut frame).unwrap();
    assert!(analysis.persons.is_empty());
    assert!(!analysis.report.alert_active());
    assert_eq!(analysis.report.min_distance(), None);
}

#[test]
fn detector_error_stops_run() {
    let mut pipeline = pipeline(Box::new(FailingDetector), None);
    let mut collect = CollectSink::default();
    let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
    sinks.push(&mut collect);
    let err = pipeline.run(blank_frames(5), &mut sinks).unwrap_err();
    assert!(err.to_string().contains("model exploded"));
}

#[test]
fn source_error_is_propagated() {
    let mut pipeline = pipeline(Box::new(scripted()), None);
    let mut collect = CollectSink::default();
    let result = {
        let mut sinks: Vec<&mut dyn FrameSink> = Vec::new();
        sinks.push(&mut collect);
        pipeline.run(BrokenSource { remaining: 2 }, &mut sinks)
    };
    assert!(result.is_err());
    assert_eq!(collect.frames.len(), 2);
    assert!(!collect.finished);
}
