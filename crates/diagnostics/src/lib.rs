//! Process-wide diagnostics collection for module stacks: timestamped
//! lap-time events and named report sections, plus plain-text report
//! rendering.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::RenderError;

use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Width every section headline is padded to when rendering a report.
const HEADLINE_WIDTH: usize = 60;

/// Fill character used to pad section headlines.
const HEADLINE_FILL: char = '-';

/// A named, timestamped diagnostic event.
#[derive(Debug, Clone)]
pub struct LapTime {
    /// Event name.
    pub name: String,

    /// Wall-clock time the lap was registered.
    pub at: DateTime<Utc>,

    /// Time elapsed since the previous lap, or since collector creation
    /// for the first lap.
    pub elapsed: Duration,
}

/// A named fragment of a rendered diagnostics report.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSection {
    /// Headline shown above the section body.
    pub headline: String,

    /// Section body, one line per entry.
    pub value: String,
}

impl DiagnosticsSection {
    /// Creates an empty section with the given headline.
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            value: String::new(),
        }
    }

    /// Appends one line to the section body.
    pub fn push_line(&mut self, line: impl AsRef<str>) {
        self.value.push_str(line.as_ref());
        self.value.push('\n');
    }
}

struct Inner {
    last_lap: Instant,
    timetable: Vec<LapTime>,
    sections: Vec<(String, DiagnosticsSection)>,
}

/// Thread-safe collector of lap times and report sections.
///
/// There is one logical collector per running stack; cloning returns a
/// handle to the same underlying store. All mutation goes through a single
/// mutex so lap-time ordering reflects real wall-clock insertion order
/// even under concurrent registration. The timetable is append-only and
/// emptied only by an explicit [`clear_timetable`](Self::clear_timetable).
#[derive(Clone)]
pub struct DiagnosticsCollector {
    inner: Arc<Mutex<Inner>>,
}

impl DiagnosticsCollector {
    /// Creates a new collector. The first lap's elapsed time is measured
    /// against this moment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                last_lap: Instant::now(),
                timetable: Vec::new(),
                sections: Vec::new(),
            })),
        }
    }

    /// Appends a lap time named `name`, stamped now, with elapsed time
    /// measured against the previous lap.
    pub fn register_lap_time(&self, name: impl Into<String>) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let elapsed = now - inner.last_lap;
        inner.last_lap = now;
        inner.timetable.push(LapTime {
            name: name.into(),
            at: Utc::now(),
            elapsed,
        });
    }

    /// Inserts or replaces the section stored under `key`.
    ///
    /// Replacement is last-write-wins; display order follows the first
    /// write of each key.
    pub fn add_section(&self, key: impl Into<String>, section: DiagnosticsSection) {
        let key = key.into();
        let mut inner = self.inner.lock();
        if let Some((_, existing)) = inner.sections.iter_mut().find(|(k, _)| *k == key) {
            *existing = section;
        } else {
            inner.sections.push((key, section));
        }
    }

    /// Atomically snapshots and empties the lap-time sequence.
    ///
    /// The returned snapshot stays valid after later laps are registered;
    /// a subsequent phase starts a fresh sequence.
    pub fn clear_timetable(&self) -> Vec<LapTime> {
        std::mem::take(&mut self.inner.lock().timetable)
    }

    /// The lap times registered since creation or the last clear.
    #[must_use]
    pub fn timetable(&self) -> Vec<LapTime> {
        self.inner.lock().timetable.clone()
    }

    /// All sections, in first-write order.
    #[must_use]
    pub fn sections(&self) -> Vec<DiagnosticsSection> {
        self.inner
            .lock()
            .sections
            .iter()
            .map(|(_, section)| section.clone())
            .collect()
    }

    /// The section stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<DiagnosticsSection> {
        self.inner
            .lock()
            .sections
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, section)| section.clone())
    }
}

impl Default for DiagnosticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a "Timetable" section from a lap-time snapshot, one lap per
/// line: timestamp, elapsed time, then the lap name.
#[must_use]
pub fn timetable_section(laps: &[LapTime]) -> DiagnosticsSection {
    let mut section = DiagnosticsSection::new("Timetable");
    for lap in laps {
        section.push_line(format!(
            "{} {:?} {}",
            lap.at.format("%Y-%m-%dT%H:%M:%S"),
            lap.elapsed,
            lap.name
        ));
    }
    section
}

/// Renders a plain-text report: a headline line followed by each section
/// as a padded headline and its body, in the given order.
///
/// # Errors
///
/// Returns a [`RenderError`] if writing the report text fails.
pub fn render_report(
    headline: &str,
    sections: &[DiagnosticsSection],
) -> Result<String, RenderError> {
    let mut out = String::new();
    writeln!(out)?;
    writeln!(out, "{headline}")?;
    writeln!(out)?;

    for section in sections {
        let mut rule = format!("{} ", section.headline);
        while rule.chars().count() < HEADLINE_WIDTH {
            rule.push(HEADLINE_FILL);
        }
        writeln!(out, "{rule}")?;
        out.push_str(&section.value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lap_times_preserve_insertion_order() {
        let collector = DiagnosticsCollector::new();
        collector.register_lap_time("x");
        std::thread::sleep(Duration::from_millis(5));
        collector.register_lap_time("y");

        let timetable = collector.timetable();
        assert_eq!(timetable.len(), 2);
        assert_eq!(timetable[0].name, "x");
        assert_eq!(timetable[1].name, "y");
        // y's elapsed is measured against x's lap, not collector creation
        assert!(timetable[1].elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn clear_timetable_snapshots_and_empties() {
        let collector = DiagnosticsCollector::new();
        collector.register_lap_time("a");
        collector.register_lap_time("b");

        let snapshot = collector.clear_timetable();
        assert_eq!(snapshot.len(), 2);
        assert!(collector.timetable().is_empty());

        // the snapshot is unaffected by laps registered afterwards
        collector.register_lap_time("c");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(collector.timetable().len(), 1);
    }

    #[test]
    fn sections_replace_in_place_keeping_first_write_order() {
        let collector = DiagnosticsCollector::new();
        collector.add_section("first", DiagnosticsSection::new("First"));
        collector.add_section("second", DiagnosticsSection::new("Second"));

        let mut replacement = DiagnosticsSection::new("First (replaced)");
        replacement.push_line("body");
        collector.add_section("first", replacement);

        let sections = collector.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].headline, "First (replaced)");
        assert_eq!(sections[1].headline, "Second");
        assert_eq!(collector.get("first").unwrap().value, "body\n");
        assert!(collector.get("missing").is_none());
    }

    #[test]
    fn report_pads_headlines_to_fixed_width() {
        let mut section = DiagnosticsSection::new("Flags");
        section.push_line("- verbose: true");

        let report = render_report("STARTUP DIAGNOSTICS", &[section]).unwrap();
        let rule_line = report
            .lines()
            .find(|line| line.starts_with("Flags "))
            .unwrap();
        assert_eq!(rule_line.chars().count(), HEADLINE_WIDTH);
        assert!(rule_line.ends_with("---"));
        assert!(report.contains("STARTUP DIAGNOSTICS"));
        assert!(report.contains("- verbose: true"));
    }

    #[test]
    fn timetable_section_formats_one_lap_per_line() {
        let collector = DiagnosticsCollector::new();
        collector.register_lap_time("Host starting");
        collector.register_lap_time("Host started");

        let section = timetable_section(&collector.clear_timetable());
        assert_eq!(section.headline, "Timetable");
        let lines: Vec<&str> = section.value.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Host starting"));
        assert!(lines[1].ends_with("Host started"));
    }
}
