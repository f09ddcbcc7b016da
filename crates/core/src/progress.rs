//! Completion-percentage extraction from free-text provider logs.
//!
//! Providers report progress only as log lines like `" 34%|███▍ "` or
//! `"step 12/50 (24%)"`. The extractor scans the whole log blob for
//! percentage tokens and keeps the maximum, so noisy or out-of-order
//! lines never make reported progress go backwards.

use std::sync::OnceLock;

use regex::Regex;

/// Matches an integer or decimal percentage token, e.g. `34%` or `99.5%`.
fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").expect("valid percent regex"))
}

/// Extract the maximum percentage mentioned anywhere in `logs`.
///
/// Values above 100 are discarded as noise. Returns `None` when the
/// text contains no plausible percentage.
pub fn max_percent(logs: &str) -> Option<f32> {
    percent_re()
        .captures_iter(logs)
        .filter_map(|cap| cap[1].parse::<f32>().ok())
        .filter(|value| *value <= 100.0)
        .fold(None, |best, value| match best {
            Some(b) if b >= value => Some(b),
            _ => Some(value),
        })
}

/// Advance a running progress value with a fresh log observation.
///
/// The result never decreases: it is the max of the current value and
/// everything visible in `logs`.
pub fn advance(current: Option<f32>, logs: &str) -> Option<f32> {
    match (current, max_percent(logs)) {
        (Some(c), Some(n)) => Some(c.max(n)),
        (Some(c), None) => Some(c),
        (None, observed) => observed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_percent() {
        assert_eq!(max_percent("12%|█▎        | 6/50"), Some(12.0));
    }

    #[test]
    fn takes_max_across_lines() {
        let logs = "step 1: 12%\nstep 2: 45%\nwarmup replay: 30%\n";
        assert_eq!(max_percent(logs), Some(45.0));
    }

    #[test]
    fn handles_decimal_percent() {
        assert_eq!(max_percent("progress: 99.5% done"), Some(99.5));
    }

    #[test]
    fn no_percent_in_text() {
        assert_eq!(max_percent("loading weights shard 3 of 7"), None);
    }

    #[test]
    fn ignores_values_over_100() {
        assert_eq!(max_percent("ratio 250% overdrive, real 40%"), Some(40.0));
    }

    // Noisy sequence 12, 45, 30, 80 must be reported as 12, 45, 45, 80.
    #[test]
    fn advance_never_decreases() {
        let mut current = None;
        let mut reported = Vec::new();
        for line in ["12%", "45%", "30%", "80%"] {
            current = advance(current, line);
            reported.push(current.unwrap());
        }
        assert_eq!(reported, vec![12.0, 45.0, 45.0, 80.0]);
    }

    #[test]
    fn advance_keeps_current_when_logs_are_silent() {
        assert_eq!(advance(Some(45.0), "no numbers here"), Some(45.0));
    }

    #[test]
    fn advance_starts_from_nothing() {
        assert_eq!(advance(None, "booting"), None);
        assert_eq!(advance(None, "7% warm"), Some(7.0));
    }
}
