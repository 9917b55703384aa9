use std::time::{Duration, Instant};
use tracing::info;

/// Logs when a unit of work starts and how long it took when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Format a count with thousands separators.
pub fn fmt_number(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a percentage with `decimals` places, or `placeholder` when undefined.
pub fn fmt_pct(value: Option<f64>, decimals: usize, placeholder: &str) -> String {
    match value {
        Some(v) => format!("{:.*}%", decimals, v),
        None => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(42_000), "42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(Some(1.23456), 2, "n/a"), "1.23%");
        assert_eq!(fmt_pct(Some(-0.5), 2, "n/a"), "-0.50%");
        assert_eq!(fmt_pct(None, 2, "n/a"), "n/a");
    }
}
