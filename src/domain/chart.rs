// Chart series domain models
use super::series::ChartPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Smoothed joint flexion over video time.
    Flexion,
    /// Smoothed keypoint speed over video time.
    Speed,
}

impl ChartKind {
    pub fn unit(&self) -> &'static str {
        match self {
            ChartKind::Flexion => "deg",
            ChartKind::Speed => "px/s",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub id: String,
    pub kind: ChartKind,
    /// Number of points before downsampling.
    pub source_len: usize,
    pub points: Vec<ChartPoint>,
}

impl SeriesData {
    pub fn new(id: String, kind: ChartKind, source_len: usize, points: Vec<ChartPoint>) -> Self {
        Self {
            id,
            kind,
            source_len,
            points,
        }
    }
}
