//! Lightweight per-phase timing for the substep schedules.
//!
//! Enabled with the `profile` feature, which makes `SimWorld` time its
//! integrate and resolve phases every substep:
//! ```bash
//! cargo run --release --features profile --example basic_demo
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates wall-clock time per named section.
#[derive(Debug, Default)]
pub struct Profiler {
    sections: HashMap<String, SectionStats>,
    open: Option<(String, Instant)>,
    substeps: u64,
}

#[derive(Debug, Default, Clone)]
pub struct SectionStats {
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Option<Duration>,
    pub max_time: Option<Duration>,
}

impl SectionStats {
    pub fn avg_time(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.call_count as u32
        }
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing a named section.
    /// Call `end_section` to stop timing.
    pub fn begin_section(&mut self, name: &str) {
        self.open = Some((name.to_string(), Instant::now()));
    }

    /// End the current section and record its duration.
    pub fn end_section(&mut self) {
        if let Some((name, start)) = self.open.take() {
            let elapsed = start.elapsed();
            let stats = self.sections.entry(name).or_default();
            stats.total_time += elapsed;
            stats.call_count += 1;
            stats.min_time = Some(stats.min_time.map_or(elapsed, |m| m.min(elapsed)));
            stats.max_time = Some(stats.max_time.map_or(elapsed, |m| m.max(elapsed)));
        }
    }

    /// Time a section using a closure.
    pub fn time_section<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.begin_section(name);
        let result = f();
        self.end_section();
        result
    }

    /// Mark the end of one profiled substep.
    pub fn end_substep(&mut self) {
        self.substeps += 1;
    }

    pub fn substeps(&self) -> u64 {
        self.substeps
    }

    /// Get statistics for a specific section.
    pub fn get_section(&self, name: &str) -> Option<&SectionStats> {
        self.sections.get(name)
    }

    /// Get all section names.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(|s| s.as_str()).collect()
    }

    /// Sections sorted by total time, slowest first.
    pub fn sorted_sections(&self) -> Vec<(&str, &SectionStats)> {
        let mut sections: Vec<_> = self.sections.iter().map(|(k, v)| (k.as_str(), v)).collect();
        sections.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time));
        sections
    }

    /// Emit one `info` event per section plus a per-substep total.
    pub fn log_summary(&self) {
        let sections = self.sorted_sections();
        let total: Duration = sections.iter().map(|(_, s)| s.total_time).sum();

        for (name, stats) in &sections {
            let share = if total.as_nanos() > 0 {
                stats.total_time.as_nanos() as f64 / total.as_nanos() as f64 * 100.0
            } else {
                0.0
            };
            tracing::info!(
                section = name,
                total = ?stats.total_time,
                avg = ?stats.avg_time(),
                min = ?stats.min_time.unwrap_or(Duration::ZERO),
                max = ?stats.max_time.unwrap_or(Duration::ZERO),
                share_pct = share,
                "profile section"
            );
        }

        if self.substeps > 0 {
            let avg_substep = total / self.substeps as u32;
            tracing::info!(substeps = self.substeps, total = ?total, avg_substep = ?avg_substep, "profile summary");
        }
    }

    /// Reset all profiling data.
    pub fn reset(&mut self) {
        self.sections.clear();
        self.open = None;
        self.substeps = 0;
    }
}
