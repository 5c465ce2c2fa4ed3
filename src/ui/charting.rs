use crate::time_series::TimeSeriesPoint;

/// Compute X (seconds) and Y (WPM) bounds for the results chart.
///
/// Y covers both the average and burst lines.
pub fn compute_chart_params(points: &[TimeSeriesPoint]) -> (f64, f64) {
    let highest_wpm = points
        .iter()
        .map(|p| p.wpm.max(p.burst))
        .fold(0.0_f64, f64::max);

    let overall_duration = points.last().map_or(1.0, |p| p.t).max(1.0);

    (overall_duration, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        assert_eq!(compute_chart_params(&[]), (1.0, 0.0));
    }

    #[test]
    fn test_compute_chart_params_uses_burst_peak() {
        let points = vec![
            TimeSeriesPoint::new(1.0, 30.0, 72.4),
            TimeSeriesPoint::new(12.5, 41.0, 50.0),
        ];
        assert_eq!(compute_chart_params(&points), (12.5, 72.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
