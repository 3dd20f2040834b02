//! Progress display for the target loop.
//!
//! [`SearchProgress`] drives an `indicatif` bar over the targets. Its message shows how many
//! neighbor pairs were kept so far and, in the sequential loop, a smoothed time per target:
//! an exponential moving average `ema ← α·dt + (1−α)·ema` seeded with the first sample.
//!
//! This module is compiled only with the `progress` feature.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Weight of the newest sample in the per-target time average.
const TIME_SMOOTHING: f64 = 0.2;

const TEMPLATE: &str =
    "{bar:40.cyan/blue} {pos}/{len} targets ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}";

/// Bar over the targets of one neighbor search.
pub struct SearchProgress {
    bar: ProgressBar,
    pairs: AtomicUsize,
    last: Instant,
    per_target: Option<Duration>,
}

impl SearchProgress {
    /// Visible bar over `total` targets, ticking on its own every 200 ms.
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total.max(1) as u64);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        SearchProgress {
            bar,
            pairs: AtomicUsize::new(0),
            last: Instant::now(),
            per_target: None,
        }
    }

    /// One more target finished with `neighbors` kept pairs. Safe to call from workers.
    pub fn target_done(&self, neighbors: usize) {
        let pairs = self.pairs.fetch_add(neighbors, Ordering::Relaxed) + neighbors;
        self.bar.set_message(format!("{pairs} pairs"));
        self.bar.inc(1);
    }

    /// Like [`target_done`](Self::target_done), also folding the time since the previous
    /// target into the average.
    pub fn timed_target_done(&mut self, neighbors: usize) {
        let now = Instant::now();
        let avg = smooth(self.per_target, now.duration_since(self.last));
        self.last = now;
        self.per_target = Some(avg);

        let pairs = self.pairs.get_mut();
        *pairs += neighbors;
        self.bar
            .set_message(format!("{} pairs | {}/target", pairs, fmt_dur(avg)));
        self.bar.inc(1);
    }

    pub fn pairs(&self) -> usize {
        self.pairs.load(Ordering::Relaxed)
    }

    /// Smoothed time per target, `None` before the first timed target.
    pub fn average_target_time(&self) -> Option<Duration> {
        self.per_target
    }

    pub fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

fn smooth(previous: Option<Duration>, sample: Duration) -> Duration {
    match previous {
        None => sample,
        Some(ema) => Duration::from_secs_f64(
            TIME_SMOOTHING * sample.as_secs_f64() + (1.0 - TIME_SMOOTHING) * ema.as_secs_f64(),
        ),
    }
}

/// `"253µs"`, `"42ms"`, `"3.14s"`.
fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f32()),
    }
}
