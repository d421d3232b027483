// Largest-Triangle-Three-Buckets downsampling for chart series
use super::series::ChartPoint;

/// Reduce `points` to `threshold` points while keeping the visual shape.
///
/// The first and last points are always kept. A threshold of zero, or one
/// that would not shrink the series, returns the input unchanged; a
/// threshold of one or two keeps only the two boundary points.
pub fn downsample(points: &[ChartPoint], threshold: usize) -> Vec<ChartPoint> {
    let n = points.len();
    if threshold == 0 || threshold >= n {
        return points.to_vec();
    }
    if threshold <= 2 {
        return vec![points[0], points[n - 1]];
    }

    let every = (n - 2) as f64 / (threshold - 2) as f64;
    let mut sampled = Vec::with_capacity(threshold);
    sampled.push(points[0]);

    let mut a = 0usize;
    for i in 0..threshold - 2 {
        let avg_start = bucket_edge(i + 1, every);
        let avg_end = bucket_edge(i + 2, every).min(n);
        let centroid = centroid(&points[avg_start..avg_end]);

        let range_start = bucket_edge(i, every);
        let range_end = bucket_edge(i + 1, every);
        let anchor = points[a];

        let mut max_area = -1.0;
        let mut selected = range_start;
        for (j, point) in points.iter().enumerate().take(range_end).skip(range_start) {
            let area = triangle_area(&anchor, point, &centroid);
            if area > max_area {
                max_area = area;
                selected = j;
            }
        }

        sampled.push(points[selected]);
        a = selected;
    }

    sampled.push(points[n - 1]);
    sampled
}

fn bucket_edge(bucket: usize, every: f64) -> usize {
    (bucket as f64 * every).floor() as usize + 1
}

fn centroid(bucket: &[ChartPoint]) -> ChartPoint {
    let count = bucket.len() as f64;
    let (sum_x, sum_y) = bucket
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    ChartPoint::new(sum_x / count, sum_y / count)
}

fn triangle_area(a: &ChartPoint, b: &ChartPoint, c: &ChartPoint) -> f64 {
    ((a.x - c.x) * (b.y - a.y) - (a.x - b.x) * (c.y - a.y)).abs() * 0.5
}
