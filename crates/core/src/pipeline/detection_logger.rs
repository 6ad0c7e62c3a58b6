use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for detection-cycle events.
///
/// Keeps the use case free of any particular output mechanism. The desktop
/// worker and `facelens webcam` pass a `StdoutDetectionLogger`, whose periodic
/// status goes to the log; the CLI also prints its closing summary.
/// `facelens image` runs a single cycle and passes the null logger.
pub trait DetectionLogger: Send {
    /// Record one finished cycle and how many faces it produced.
    fn cycle(&mut self, faces: usize);

    /// Record how long a named stage took within one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullDetectionLogger;

impl DetectionLogger for NullDetectionLogger {
    fn cycle(&mut self, _faces: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
}

/// Collects per-stage timings and face counts; logs a summary on request.
///
/// Every `throttle_cycles` cycles a one-line status is logged so long live
/// sessions show signs of life without flooding the output.
pub struct StdoutDetectionLogger {
    throttle_cycles: usize,
    timings: HashMap<String, Vec<f64>>,
    face_counts: Vec<usize>,
    start_time: Instant,
}

impl StdoutDetectionLogger {
    pub fn new(throttle_cycles: usize) -> Self {
        Self {
            throttle_cycles: throttle_cycles.max(1),
            timings: HashMap::new(),
            face_counts: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn cycles(&self) -> usize {
        self.face_counts.len()
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Formatted summary, or `None` before the first cycle.
    pub fn summary_string(&self) -> Option<String> {
        if self.face_counts.is_empty() {
            return None;
        }
        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let cycles = self.face_counts.len();
        let mut lines = vec![format!(
            "Detection summary ({cycles} cycles, {elapsed_s:.1}s total):"
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms"
            ));
        }

        let faces: usize = self.face_counts.iter().sum();
        let peak = self.face_counts.iter().copied().max().unwrap_or(0);
        lines.push(format!(
            "  faces: avg {:.1}  peak {peak}",
            faces as f64 / cycles as f64
        ));
        if elapsed_s > 0.0 {
            lines.push(format!("  Rate: {:.1} cycles/s", cycles as f64 / elapsed_s));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutDetectionLogger {
    fn default() -> Self {
        Self::new(50)
    }
}

impl DetectionLogger for StdoutDetectionLogger {
    fn cycle(&mut self, faces: usize) {
        self.face_counts.push(faces);
        let n = self.face_counts.len();
        if n % self.throttle_cycles == 0 {
            log::info!("{n} detection cycles, {faces} face(s) in the latest");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullDetectionLogger;
        logger.cycle(3);
        logger.timing("analyze", 5.0);
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutDetectionLogger::new(10);
        logger.timing("analyze", 20.0);
        logger.timing("analyze", 30.0);
        logger.timing("mask", 1.0);

        assert_eq!(logger.timings_for("analyze"), Some(&[20.0, 30.0][..]));
        assert_eq!(logger.timings_for("mask").map(<[f64]>::len), Some(1));
        assert!(logger.timings_for("missing").is_none());
    }

    #[test]
    fn test_cycle_counts() {
        let mut logger = StdoutDetectionLogger::new(2);
        for faces in [0, 1, 2] {
            logger.cycle(faces);
        }
        assert_eq!(logger.cycles(), 3);
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutDetectionLogger::default().summary_string().is_none());
    }

    #[test]
    fn test_summary_contents() {
        let mut logger = StdoutDetectionLogger::new(10);
        logger.timing("analyze", 10.0);
        logger.timing("analyze", 30.0);
        logger.cycle(1);
        logger.cycle(3);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Detection summary (2 cycles"));
        assert!(summary.contains("analyze"));
        assert!(summary.contains("avg   20.0ms"));
        assert!(summary.contains("faces: avg 2.0  peak 3"));
    }

    #[test]
    fn test_throttle_floor_is_one() {
        let logger = StdoutDetectionLogger::new(0);
        assert_eq!(logger.throttle_cycles, 1);
    }
}
