use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for session events.
///
/// Keeps the frame loop free of output concerns: the loop reports progress,
/// stage timings and per-pass counts, the logger decides what to print.
pub trait PipelineLogger: Send {
    /// Report frame-level progress. `total` is 0 for live sources.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame value, e.g. regions found by a detection pass.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count/sum/min/max of a stream of samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleStats {
    fn first(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// CLI logger: throttled progress lines through `log`, plus a stage and
/// metric summary when the session ends.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, SampleStats>,
    metrics: BTreeMap<String, SampleStats>,
    started: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames_seen: 0,
        }
    }

    pub fn timing_stats(&self, stage: &str) -> Option<SampleStats> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stats(&self, name: &str) -> Option<SampleStats> {
        self.metrics.get(name).copied()
    }

    /// Multi-line summary, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut out = format!("Session summary: {} frames in {elapsed:.1}s", self.frames_seen);

        for (stage, s) in &self.timings {
            out.push_str(&format!(
                "\n  {stage:10} avg {:6.1}ms  min {:6.1}ms  max {:6.1}ms",
                s.mean(),
                s.min,
                s.max
            ));
        }
        for (name, s) in &self.metrics {
            out.push_str(&format!(
                "\n  {name:10} avg {:.1} per frame, {} total",
                s.mean(),
                s.sum
            ));
        }
        if self.frames_seen > 0 && elapsed > 0.0 {
            out.push_str(&format!(
                "\n  throughput {:.1} fps",
                self.frames_seen as f64 / elapsed
            ));
        }
        Some(out)
    }

    fn record(map: &mut BTreeMap<String, SampleStats>, key: &str, value: f64) {
        match map.get_mut(key) {
            Some(stats) => stats.push(value),
            None => {
                map.insert(key.to_string(), SampleStats::first(value));
            }
        }
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if total == 0 {
            if current % self.throttle_frames == 0 {
                log::info!("Captured {current} frames");
            }
        } else if current % self.throttle_frames == 0 || current == total {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Frame {current}/{total} ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        Self::record(&mut self.timings, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        Self::record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
