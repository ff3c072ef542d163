// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 结果标注 (Annotator)
///
/// - 人员框: 女性品红 / 男性黄色 / 未分类青色, 线宽2
/// - 违规点对: 两中心点之间红线 + 距离文字 "{d}px"
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{info, warn};

use crate::detection::{Gender, Person};
use crate::proximity::ProximityReport;

pub const COLOR_FEMALE: Rgb<u8> = Rgb([255, 0, 255]);
pub const COLOR_MALE: Rgb<u8> = Rgb([255, 255, 0]);
pub const COLOR_UNCLASSIFIED: Rgb<u8> = Rgb([0, 255, 255]);
pub const COLOR_VIOLATION: Rgb<u8> = Rgb([255, 0, 0]);

const LABEL_SCALE: f32 = 20.0;
const DISTANCE_SCALE: f32 = 18.0;

pub struct Annotator {
    font: Option<FontVec>,
}

impl Annotator {
    /// 加载字体; 字体缺失时只画框和线, 不画文字
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => match FontVec::try_from_vec(bytes) {
                    Ok(font) => {
                        info!("✅ 字体加载成功: {}", path.display());
                        Some(font)
                    }
                    Err(e) => {
                        warn!("⚠️ 字体解析失败: {} ({})", path.display(), e);
                        None
                    }
                },
                Err(e) => {
                    warn!("⚠️ 未找到字体文件: {} ({})", path.display(), e);
                    None
                }
            },
            None => {
                warn!("⚠️ 未配置字体, 标注不包含文字");
                None
            }
        };
        Self { font }
    }

    pub fn without_text() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn annotate(&self, frame: &mut RgbImage, persons: &[Person], report: &ProximityReport) {
        for person in persons {
            let color = match person.gender {
                Some(Gender::Female) => COLOR_FEMALE,
                Some(Gender::Male) => COLOR_MALE,
                None => COLOR_UNCLASSIFIED,
            };
            let b = &person.bbox;
            if let Some(gender) = person.gender {
                self.text(
                    frame,
                    color,
                    b.x1,
                    b.y1 - 10 - LABEL_SCALE as i32,
                    LABEL_SCALE,
                    gender.label(),
                );
            }
            draw_thick_rect(frame, b.x1, b.y1, b.width(), b.height(), color);
        }

        for pair in report.pairs() {
            let (Some(a), Some(b)) = (persons.get(pair.i), persons.get(pair.j)) else {
                continue;
            };
            let (p1, p2) = (a.center(), b.center());
            draw_thick_line(frame, (p1.x(), p1.y()), (p2.x(), p2.y()), COLOR_VIOLATION);
            self.text(
                frame,
                COLOR_VIOLATION,
                p1.x() as i32,
                p1.y() as i32 - DISTANCE_SCALE as i32,
                DISTANCE_SCALE,
                &distance_label(pair.distance),
            );
        }
    }

    fn text(&self, frame: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, scale: f32, text: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(frame, color, x, y, PxScale::from(scale), font, text);
        }
    }
}

/// 距离标签, 截断取整: 12.9 → "12px"
pub fn distance_label(distance: f64) -> String {
    format!("{}px", distance as i64)
}

fn draw_thick_rect(frame: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Rgb<u8>) {
    // Rect 不接受0尺寸
    if w == 0 || h == 0 {
        return;
    }
    draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(w, h), color);
    if w > 2 && h > 2 {
        draw_hollow_rect_mut(frame, Rect::at(x + 1, y + 1).of_size(w - 2, h - 2), color);
    }
}

fn draw_thick_line(frame: &mut RgbImage, p1: (f32, f32), p2: (f32, f32), color: Rgb<u8>) {
    draw_line_segment_mut(frame, p1, p2, color);
    draw_line_segment_mut(frame, (p1.0, p1.1 + 1.0), (p2.0, p2.1 + 1.0), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::PixelBox;
    use crate::proximity::{Point2, ProximityEvaluator};

    fn person(x1: i32, y1: i32, x2: i32, y2: i32, gender: Option<Gender>) -> Person {
        Person {
            bbox: PixelBox { x1, y1, x2, y2 },
            confidence: 0.9,
            gender,
        }
    }

    #[test]
    fn test_distance_label() {
        assert_eq!(distance_label(12.9), "12px");
        assert_eq!(distance_label(0.0), "0px");
    }

    #[test]
    fn test_box_colors() {
        let mut frame = RgbImage::new(100, 100);
        let persons = vec![
            person(10, 10, 30, 40, Some(Gender::Female)),
            person(50, 10, 70, 40, Some(Gender::Male)),
            person(10, 60, 30, 90, None),
        ];
        Annotator::without_text().annotate(&mut frame, &persons, &ProximityReport::default());
        assert_eq!(frame.get_pixel(10, 20), &COLOR_FEMALE);
        assert_eq!(frame.get_pixel(50, 20), &COLOR_MALE);
        assert_eq!(frame.get_pixel(10, 70), &COLOR_UNCLASSIFIED);
        // 框内部不填充
        assert_eq!(frame.get_pixel(20, 25), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_violation_line() {
        let mut frame = RgbImage::new(200, 100);
        let persons = vec![
            person(0, 0, 40, 40, None),     // 中心 (20, 20)
            person(60, 0, 100, 40, None),   // 中心 (80, 20)
            person(150, 60, 190, 98, None), // 远处
        ];
        let centers: Vec<Point2> = persons.iter().map(|p| p.center()).collect();
        let report = ProximityEvaluator::new(100.0)
            .unwrap()
            .evaluate(&centers)
            .unwrap();
        assert_eq!(report.pairs().len(), 1);

        Annotator::without_text().annotate(&mut frame, &persons, &report);
        assert_eq!(frame.get_pixel(50, 20), &COLOR_VIOLATION);
        assert_eq!(frame.get_pixel(50, 21), &COLOR_VIOLATION);
    }
}
