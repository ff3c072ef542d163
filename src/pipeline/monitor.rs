// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 告警监视 (Alert Monitor)
//! 记录告警状态切换, 汇总整段运行的统计

use serde::Serialize;
use tracing::{info, warn};

use super::FrameAnalysis;

pub const STATUS_TOO_CLOSE: &str = "too close";
pub const STATUS_NORMAL: &str = "normal";

/// 告警状态切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    Raised,
    Cleared,
}

#[derive(Debug, Default)]
pub struct AlertMonitor {
    active: bool,
    since: u64,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status(&self) -> &'static str {
        if self.active {
            STATUS_TOO_CLOSE
        } else {
            STATUS_NORMAL
        }
    }

    /// 只在状态切换时返回 Some 并打日志
    pub fn observe(&mut self, analysis: &FrameAnalysis) -> Option<AlertTransition> {
        let active = analysis.report.alert_active();
        if active == self.active {
            return None;
        }
        self.active = active;
        if active {
            self.since = analysis.index;
            warn!(
                "🚨 帧 {}: {} ({} 对, 最近 {:.0}px)",
                analysis.index,
                STATUS_TOO_CLOSE,
                analysis.report.pairs().len(),
                analysis.report.min_distance().unwrap_or_default()
            );
            Some(AlertTransition::Raised)
        } else {
            info!(
                "✅ 帧 {}: {} (告警持续 {} 帧)",
                analysis.index,
                STATUS_NORMAL,
                analysis.index - self.since
            );
            Some(AlertTransition::Cleared)
        }
    }
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub frames_with_alert: u64,
    pub max_persons: usize,
    pub alert_events: u64,
}

impl RunSummary {
    pub fn record(&mut self, analysis: &FrameAnalysis, transition: Option<AlertTransition>) {
        self.frames += 1;
        if analysis.report.alert_active() {
            self.frames_with_alert += 1;
        }
        self.max_persons = self.max_persons.max(analysis.persons.len());
        if transition == Some(AlertTransition::Raised) {
            self.alert_events += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Person, PixelBox};
    use crate::proximity::{Point2, ProximityEvaluator};

    fn analysis(index: u64, centers_x: &[i32]) -> FrameAnalysis {
        let persons: Vec<Person> = centers_x
            .iter()
            .map(|&x| {
                Person::new(
                    PixelBox {
                        x1: x - 5,
                        y1: 0,
                        x2: x + 5,
                        y2: 10,
                    },
                    0.9,
                )
            })
            .collect();
        let centers: Vec<Point2> = persons.iter().map(|p| p.center()).collect();
        let report = ProximityEvaluator::new(300.0)
            .unwrap()
            .evaluate(&centers)
            .unwrap();
        FrameAnalysis {
            index,
            persons,
            report,
        }
    }

    #[test]
    fn test_transitions() {
        let mut monitor = AlertMonitor::new();
        assert_eq!(monitor.status(), STATUS_NORMAL);
        assert_eq!(monitor.observe(&analysis(0, &[0, 1000])), None);
        assert_eq!(
            monitor.observe(&analysis(1, &[0, 100])),
            Some(AlertTransition::Raised)
        );
        assert_eq!(monitor.status(), STATUS_TOO_CLOSE);
        assert_eq!(monitor.observe(&analysis(2, &[0, 50])), None);
        assert_eq!(
            monitor.observe(&analysis(3, &[0])),
            Some(AlertTransition::Cleared)
        );
        assert!(!monitor.is_active());
    }

    #[test]
    fn test_summary() {
        let mut monitor = AlertMonitor::new();
        let mut summary = RunSummary::default();
        let frames: [&[i32]; 4] = [&[0, 100], &[0, 100, 200], &[0], &[0, 10]];
        for (i, xs) in frames.iter().enumerate() {
            let a = analysis(i as u64, xs);
            let t = monitor.observe(&a);
            summary.record(&a, t);
        }
        assert_eq!(
            summary,
            RunSummary {
                frames: 4,
                frames_with_alert: 3,
                max_persons: 3,
                alert_events: 2,
            }
        );
    }
}
