/// Characters that make up one "word" in WPM figures
pub const CHARS_PER_WORD: f64 = 5.0;

const MS_PER_MINUTE: f64 = 60_000.0;

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// stddev / mean; `None` for empty data or a zero mean
pub fn coefficient_of_variation(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    if data_mean == 0.0 {
        return None;
    }
    std_dev(data).map(|sd| sd / data_mean)
}

/// `part / whole` as a rounded percentage clamped to 0..=100
pub fn percent(part: usize, whole: usize) -> Option<u8> {
    if whole == 0 {
        return None;
    }
    let pct = (part as f64 / whole as f64 * 100.0).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// Rate per minute for `count` units over `elapsed_ms`; 0 when no time has passed
pub fn per_minute(count: f64, elapsed_ms: f64) -> f64 {
    if elapsed_ms <= 0.0 {
        return 0.0;
    }
    count / (elapsed_ms / MS_PER_MINUTE)
}

/// Words per minute for `chars` typed over `elapsed_ms`, rounded
pub fn wpm(chars: usize, elapsed_ms: f64) -> u32 {
    per_minute(chars as f64 / CHARS_PER_WORD, elapsed_ms).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean() {
        assert!(approx(mean(&[10., 20., 30., 15., 22.]).unwrap(), 19.4));
        assert_eq!(mean(&[42.0]), Some(42.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert!(approx(
            std_dev(&[100., 120., 90., 102., 94.]).unwrap(),
            10.322790320451151
        ));
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[100.0, 100.0]), Some(0.0));
        // mean 150, population sd 50
        assert!(approx(
            coefficient_of_variation(&[100.0, 200.0]).unwrap(),
            1.0 / 3.0
        ));
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
        assert_eq!(coefficient_of_variation(&[]), None);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(0, 4), Some(0));
        assert_eq!(percent(4, 4), Some(100));
        assert_eq!(percent(1, 0), None);
    }

    #[test]
    fn test_per_minute_zero_elapsed() {
        assert_eq!(per_minute(10.0, 0.0), 0.0);
        assert_eq!(per_minute(10.0, -5.0), 0.0);
    }

    #[test]
    fn test_wpm() {
        // 50 chars = 10 words in one minute
        assert_eq!(wpm(50, 60_000.0), 10);
        assert_eq!(wpm(25, 30_000.0), 10);
        assert_eq!(wpm(50, 0.0), 0);
    }
}
