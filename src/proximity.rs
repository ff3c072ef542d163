// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 人员间距告警 (Proximity Alert)
// 输入: 当前帧所有人员中心点 + 距离阈值(像素)
// 输出: 距离小于阈值的点对 + 告警标志 + 告警等级

use ndarray::Array2;
use thiserror::Error;

/// 告警激活时的等级 (二值仪表: 0 或 100)
pub const ALERT_LEVEL_ACTIVE: u8 = 100;
/// 告警未激活时的等级
pub const ALERT_LEVEL_INACTIVE: u8 = 0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProximityError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// 二维像素坐标 (人员中心点)
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct Point2 {
    x: f32,
    y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 从坐标元组构造, 维度必须为2
    pub fn from_slice(coords: &[f32]) -> Result<Self, ProximityError> {
        match coords {
            [x, y] => Ok(Self::new(*x, *y)),
            _ => Err(ProximityError::InvalidArgument(format!(
                "expected 2 coordinates, got {}",
                coords.len()
            ))),
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl From<(i32, i32)> for Point2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

/// 欧氏距离, 以 f64 计算
pub fn euclidean_distance(a: &Point2, b: &Point2) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}

/// N×N 对称距离矩阵, 对角线为 0
pub fn pairwise_distances(points: &[Point2]) -> Array2<f64> {
    let n = points.len();
    let mut dist = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&points[i], &points[j]);
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    dist
}

/// 违规点对: 两个中心点索引 (i < j) 及其距离
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ViolatingPair {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
}

/// 人员间距评估器
///
/// 无状态纯计算: 同样的输入总是得到同样的输出, 不修改输入, 不做I/O。
/// 每帧 O(N²) 次距离计算, N 为当前帧人数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityEvaluator {
    threshold: f64,
}

impl ProximityEvaluator {
    /// 创建评估器
    ///
    /// # Arguments
    /// * `threshold` - 距离阈值(像素), 必须是非负有限值
    ///
    /// # Errors
    /// 阈值为负数、NaN 或无穷大时返回 `ProximityError::InvalidArgument`
    pub fn new(threshold: f64) -> Result<Self, ProximityError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ProximityError::InvalidArgument(format!(
                "distance threshold must be a non-negative finite number, got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 惰性遍历所有违规点对, 顺序为 (i, j) 字典序, i < j
    pub fn violating_pairs<'a>(
        &self,
        points: &'a [Point2],
    ) -> Result<ViolatingPairs<'a>, ProximityError> {
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(ProximityError::InvalidArgument(format!(
                "point #{} has non-finite coordinates: {:?}",
                idx, points[idx]
            )));
        }
        Ok(ViolatingPairs {
            points,
            threshold: self.threshold,
            i: 0,
            j: 1,
        })
    }

    /// 评估一帧, 收集全部违规点对
    pub fn evaluate(&self, points: &[Point2]) -> Result<ProximityReport, ProximityError> {
        let pairs = self.violating_pairs(points)?.collect();
        Ok(ProximityReport { pairs })
    }
}

/// 违规点对迭代器 (见 [`ProximityEvaluator::violating_pairs`])
#[derive(Debug, Clone)]
pub struct ViolatingPairs<'a> {
    points: &'a [Point2],
    threshold: f64,
    i: usize,
    j: usize,
}

impl Iterator for ViolatingPairs<'_> {
    type Item = ViolatingPair;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.points.len();
        while self.i + 1 < n {
            while self.j < n {
                let (i, j) = (self.i, self.j);
                self.j += 1;
                let distance = euclidean_distance(&self.points[i], &self.points[j]);
                // 严格小于: 距离等于阈值不算违规
                if distance < self.threshold {
                    return Some(ViolatingPair { i, j, distance });
                }
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }
}

/// 单帧评估结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityReport {
    pairs: Vec<ViolatingPair>,
}

impl ProximityReport {
    pub fn pairs(&self) -> &[ViolatingPair] {
        &self.pairs
    }

    pub fn alert_active(&self) -> bool {
        !self.pairs.is_empty()
    }

    pub fn alert_level(&self) -> u8 {
        if self.alert_active() {
            ALERT_LEVEL_ACTIVE
        } else {
            ALERT_LEVEL_INACTIVE
        }
    }

    /// 违规点对中的最小距离 (无违规时为 None)
    pub fn min_distance(&self) -> Option<f64> {
        self.pairs
            .iter()
            .map(|p| p.distance)
            .reduce(f64::min)
    }
}
