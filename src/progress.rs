//! Progress reporting to stderr.
//!
//! Reporters count vectors as they are committed to the index, not as
//! they are embedded. All output goes to stderr so stdout stays clean
//! for piping.

use std::sync::atomic::{AtomicU64, Ordering};

/// Receives pipeline progress events. Methods take `&self` so a single
/// reporter can be shared across the async callback chain.
pub trait ProgressReporter: Send + Sync {
    /// Announce the total number of vectors that will be committed.
    fn start(&self, total: u64);

    /// Record `n` more vectors committed.
    fn advance(&self, n: u64);

    /// Finish reporting a successful run. Idempotent.
    fn stop(&self);

    /// Finish reporting a failed run. Reporters that distinguish the two
    /// outcomes override this; the default closes out like `stop`.
    fn abort(&self) {
        self.stop();
    }

    /// Vectors committed so far.
    fn committed(&self) -> u64;
}

/// How progress should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human output when stderr is a terminal, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress::new()),
            ProgressMode::Human => Box::new(StderrProgress::new()),
            ProgressMode::Json => Box::new(JsonProgress::new()),
        }
    }
}

/// Human-readable progress lines on stderr.
pub struct StderrProgress {
    total: AtomicU64,
    count: AtomicU64,
}

impl StderrProgress {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }
}

impl Default for StderrProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgress {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        eprintln!("Upserting {} vectors...", format_number(total));
    }

    fn advance(&self, n: u64) {
        let count = self.count.fetch_add(n, Ordering::Relaxed) + n;
        let total = self.total.load(Ordering::Relaxed);
        eprint!("\r  {} / {}", format_number(count), format_number(total));
    }

    fn stop(&self) {
        eprintln!();
    }

    fn committed(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// One JSON object per line on stderr, for machine consumers.
pub struct JsonProgress {
    total: AtomicU64,
    count: AtomicU64,
}

impl JsonProgress {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        eprintln!(r#"{{"event":"start","total":{}}}"#, total);
    }

    fn advance(&self, n: u64) {
        let count = self.count.fetch_add(n, Ordering::Relaxed) + n;
        let total = self.total.load(Ordering::Relaxed);
        eprintln!(
            r#"{{"event":"progress","committed":{},"total":{}}}"#,
            count, total
        );
    }

    fn stop(&self) {
        let count = self.count.load(Ordering::Relaxed);
        eprintln!(r#"{{"event":"done","committed":{}}}"#, count);
    }

    fn abort(&self) {
        let count = self.count.load(Ordering::Relaxed);
        eprintln!(r#"{{"event":"failed","committed":{}}}"#, count);
    }

    fn committed(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Counts silently. Used for `--progress off` and as the dry-run reporter.
pub struct NoProgress {
    count: AtomicU64,
}

impl NoProgress {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }
}

impl Default for NoProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for NoProgress {
    fn start(&self, _total: u64) {}

    fn advance(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    fn stop(&self) {}

    fn committed(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Format a number with thousands separators: 18891 -> "18,891".
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
