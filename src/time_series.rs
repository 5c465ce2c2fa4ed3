use serde::{Deserialize, Serialize};

/// One sample of the live speed readout, `t` in active seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
    pub burst: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64, burst: f64) -> Self {
        Self { t, wpm, burst }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Split a series into (t, wpm) and (t, burst) coordinate lists for charting
pub fn chart_coords(points: &[TimeSeriesPoint]) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    points
        .iter()
        .map(|p| ((p.t, p.wpm), (p.t, p.burst)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_coords() {
        let points = vec![
            TimeSeriesPoint::new(1.0, 40.0, 55.0),
            TimeSeriesPoint::new(2.0, 42.0, 38.0),
        ];
        let (wpm, burst) = chart_coords(&points);
        assert_eq!(wpm, vec![(1.0, 40.0), (2.0, 42.0)]);
        assert_eq!(burst, vec![(1.0, 55.0), (2.0, 38.0)]);
    }

    #[test]
    fn test_into_tuple() {
        let t: (f64, f64) = TimeSeriesPoint::new(3.0, 60.0, 0.0).into();
        assert_eq!(t, (3.0, 60.0));
    }
}
