//! Output formatting utilities for CLI.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use blue::board::{BoardState, FrameEvents};
use serde::Serialize;

/// One frame of the event log.
#[derive(Debug, Serialize)]
pub(super) struct JsonFrame {
    /// Frame the events were produced on.
    pub(super) frame: u64,
    /// What happened.
    #[serde(flatten)]
    pub(super) events: FrameEvents,
}

/// JSON-serializable machine summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonMachine {
    id: u32,
    name: String,
    xy: String,
    hull: i32,
    armour: i32,
    cap: u16,
    credits: u16,
}

/// JSON-serializable run result.
#[derive(Debug, Serialize)]
pub(super) struct JsonRunResult {
    /// Random seed used.
    pub(super) seed: u64,
    /// Frames run.
    pub(super) frames: u64,
    /// Machines still on the board at the end.
    pub(super) machines: Vec<JsonMachine>,
    /// Frames that produced events.
    pub(super) log: Vec<JsonFrame>,
}

impl JsonRunResult {
    /// Summarise the final board and attach the event log.
    pub(super) fn new(seed: u64, board: &BoardState, log: Vec<JsonFrame>) -> Self {
        Self { seed, frames: board.frame_number(), machines: machine_summaries(board), log }
    }
}

pub(super) fn machine_summaries(board: &BoardState) -> Vec<JsonMachine> {
    board
        .machines()
        .map(|m| JsonMachine {
            id: m.id().0,
            name: m.name().to_string(),
            xy: m.board_xy().to_string(),
            hull: m.combat_system().hull(),
            armour: m.combat_system().armour(),
            cap: m.capacitance(),
            credits: m.credits(),
        })
        .collect()
}

/// Format the end of a run as human-readable text.
pub(super) fn format_run_text(seed: u64, board: &BoardState) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Run Result (seed: {seed})");
    let _ = writeln!(output, "  Frames: {}", board.frame_number());
    let _ = writeln!(output, "  Machines on board: {}", board.machine_count());
    let rocks = board.asteroids().iter().filter(|a| a.is_on_board()).count();
    let _ = writeln!(output, "  Asteroids left: {rocks}\n");
    for m in machine_summaries(board) {
        let _ = writeln!(
            output,
            "  {} {} at {}: hull {} armour {} cap {} credits {}",
            m.id, m.name, m.xy, m.hull, m.armour, m.cap, m.credits
        );
    }
    output
}

/// Event counts of one run, keyed by event name.
pub(super) type EventCounts = BTreeMap<&'static str, u64>;

/// Tally every event of a frame.
pub(super) fn count_events(counts: &mut EventCounts, events: &FrameEvents) {
    for e in &events.machine_events {
        *counts.entry(e.kind.name()).or_default() += 1;
    }
    for e in &events.secondary_events {
        *counts.entry(e.name()).or_default() += 1;
    }
}

/// Outcome of one seed of a batch.
#[derive(Debug, Clone)]
pub(super) struct RunSummary {
    /// Seed run.
    pub(super) seed: u64,
    /// Frames run.
    pub(super) frames: u64,
    /// Machines alive at the end.
    pub(super) survivors: usize,
    /// Events seen.
    pub(super) event_counts: EventCounts,
    /// Board consistency failures seen across all frames.
    pub(super) violations: usize,
    /// Whether a second run of the seed reproduced the event log.
    pub(super) deterministic: bool,
}

/// Aggregated statistics for a batch.
#[derive(Debug, Default)]
pub(super) struct BatchStats {
    /// Runs that completed.
    pub(super) runs_completed: u64,
    /// Runs whose board could not be built.
    pub(super) runs_failed: u64,
    /// Seeds whose two runs disagreed.
    pub(super) nondeterministic_seeds: Vec<u64>,
    /// Board consistency failures over all runs.
    pub(super) invariant_violations: u64,
    total_survivors: u64,
    survivor_sq_sum: f64,
    total_frames: u64,
    /// Events over all runs.
    pub(super) event_counts: EventCounts,
}

#[allow(clippy::cast_precision_loss)]
impl BatchStats {
    /// Add a completed run.
    pub(super) fn add_result(&mut self, run: &RunSummary) {
        self.runs_completed += 1;
        self.total_frames += run.frames;
        self.total_survivors += run.survivors as u64;
        self.survivor_sq_sum += (run.survivors * run.survivors) as f64;
        self.invariant_violations += run.violations as u64;
        if !run.deterministic {
            self.nondeterministic_seeds.push(run.seed);
        }
        for (name, n) in &run.event_counts {
            *self.event_counts.entry(name).or_default() += n;
        }
    }

    /// Merge another thread's stats into these.
    pub(super) fn merge(&mut self, other: &Self) {
        self.runs_completed += other.runs_completed;
        self.runs_failed += other.runs_failed;
        self.nondeterministic_seeds.extend_from_slice(&other.nondeterministic_seeds);
        self.nondeterministic_seeds.sort_unstable();
        self.invariant_violations += other.invariant_violations;
        self.total_survivors += other.total_survivors;
        self.survivor_sq_sum += other.survivor_sq_sum;
        self.total_frames += other.total_frames;
        for (name, n) in &other.event_counts {
            *self.event_counts.entry(name).or_default() += n;
        }
    }

    /// Runs in total, completed or not.
    pub(super) const fn runs(&self) -> u64 {
        self.runs_completed + self.runs_failed
    }

    /// Average machines alive at the end of a run.
    pub(super) fn avg_survivors(&self) -> f64 {
        if self.runs_completed == 0 {
            return 0.0;
        }
        self.total_survivors as f64 / self.runs_completed as f64
    }

    /// Standard deviation of the survivors.
    pub(super) fn survivors_std_dev(&self) -> f64 {
        if self.runs_completed == 0 {
            return 0.0;
        }
        let mean = self.avg_survivors();
        let variance = self.survivor_sq_sum / self.runs_completed as f64 - mean * mean;
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }

    /// Average frames per run.
    pub(super) fn avg_frames(&self) -> f64 {
        if self.runs_completed == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.runs_completed as f64
    }

    /// Average count of an event per run.
    pub(super) fn per_run(&self, total: u64) -> f64 {
        if self.runs_completed == 0 {
            return 0.0;
        }
        total as f64 / self.runs_completed as f64
    }
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    runs: u64,
    runs_failed: u64,
    nondeterministic_seeds: Vec<u64>,
    invariant_violations: u64,
    avg_survivors: f64,
    survivors_std_dev: f64,
    avg_frames: f64,
    events: Vec<JsonEventCount>,
}

/// JSON-serializable event tally.
#[derive(Debug, Serialize)]
pub(super) struct JsonEventCount {
    event: &'static str,
    total: u64,
    per_run: f64,
}

impl JsonBatchResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &BatchStats) -> Self {
        Self {
            runs: stats.runs(),
            runs_failed: stats.runs_failed,
            nondeterministic_seeds: stats.nondeterministic_seeds.clone(),
            invariant_violations: stats.invariant_violations,
            avg_survivors: stats.avg_survivors(),
            survivors_std_dev: stats.survivors_std_dev(),
            avg_frames: stats.avg_frames(),
            events: stats
                .event_counts
                .iter()
                .map(|(&event, &total)| JsonEventCount { event, total, per_run: stats.per_run(total) })
                .collect(),
        }
    }
}

/// Format batch stats as human-readable text.
pub(super) fn format_batch_text(stats: &BatchStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Batch Results ({} runs)", stats.runs());
    output.push_str("========================================\n\n");

    if stats.runs_failed > 0 {
        let _ = writeln!(output, "Failed runs: {}", stats.runs_failed);
    }
    if stats.nondeterministic_seeds.is_empty() {
        output.push_str("Determinism: OK\n");
    } else {
        let _ = writeln!(output, "Determinism: FAILED for seeds {:?}", stats.nondeterministic_seeds);
    }
    let _ = writeln!(output, "Invariant violations: {}\n", stats.invariant_violations);

    let _ = writeln!(
        output,
        "Survivors: {:.1} (+/- {:.1}) over {:.0} frames\n",
        stats.avg_survivors(),
        stats.survivors_std_dev(),
        stats.avg_frames()
    );

    output.push_str("Events per run:\n");
    for (name, &total) in &stats.event_counts {
        let _ = writeln!(output, "  {name:<24} {:>10.1} ({total} total)", stats.per_run(total));
    }

    output
}

/// Format batch event counts as CSV.
pub(super) fn format_batch_csv(stats: &BatchStats) -> String {
    let mut output = String::from("event,total,per_run\n");
    for (name, &total) in &stats.event_counts {
        let _ = writeln!(output, "{name},{total},{:.4}", stats.per_run(total));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_run(seed: u64, survivors: usize, deterministic: bool) -> RunSummary {
        let mut event_counts = EventCounts::new();
        event_counts.insert("fired", 4);
        RunSummary { seed, frames: 100, survivors, event_counts, violations: 0, deterministic }
    }

    #[test]
    fn test_batch_stats_merge() {
        let mut a = BatchStats::default();
        a.add_result(&create_test_run(1, 2, true));
        let mut b = BatchStats::default();
        b.add_result(&create_test_run(2, 4, false));
        b.runs_failed += 1;
        a.merge(&b);

        assert_eq!(a.runs(), 3);
        assert_eq!(a.runs_completed, 2);
        assert_eq!(a.nondeterministic_seeds, vec![2]);
        assert_eq!(a.event_counts["fired"], 8);
        assert!((a.avg_survivors() - 3.0).abs() < f64::EPSILON);
        assert!((a.survivors_std_dev() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_stats_do_not_divide_by_zero() {
        let stats = BatchStats::default();
        assert!(stats.avg_survivors().abs() < f64::EPSILON);
        assert!(format_batch_text(&stats).contains("0 runs"));
        assert_eq!(format_batch_csv(&stats), "event,total,per_run\n");
    }
}
