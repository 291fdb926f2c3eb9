use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use swarm_core::SkillLevel;
use swarm_core::runner::BatchProgress;

use super::format::format_duration;

/// One bar per cohort, advanced in users after every batch.
pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

struct Inner {
    multi: MultiProgress,
    bars: HashMap<SkillLevel, ProgressBar>,
}

impl HumanProgress {
    /// `multi` is shared with the log writer.
    pub(crate) fn new(multi: MultiProgress) -> Self {
        Self {
            inner: Mutex::new(Inner {
                multi,
                bars: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn start(&self, cohort: SkillLevel, users: u64, batches: usize) {
        let mut inner = self.lock();

        let pb = inner.multi.add(ProgressBar::new(users));
        pb.set_style(bar_style());
        pb.set_prefix(format!("{cohort:<12}"));
        pb.set_message(format!("batch 0/{batches}"));
        if let Some(old) = inner.bars.insert(cohort, pb) {
            old.finish_and_clear();
        }
    }

    pub(crate) fn update(&self, p: &BatchProgress) {
        let inner = self.lock();

        if let Some(pb) = inner.bars.get(&p.cohort) {
            pb.set_length(p.users_total);
            pb.set_position(p.users_done.min(p.users_total));
            pb.set_message(format!(
                "batch {}/{} failed={} elapsed={}",
                p.batch,
                p.batches,
                p.users_failed,
                format_duration(p.elapsed)
            ));
        }
    }

    /// Replaces the cohort's bar with a permanent line.
    pub(crate) fn finish_cohort(&self, cohort: SkillLevel, line: &str) {
        let mut inner = self.lock();

        if let Some(pb) = inner.bars.remove(&cohort) {
            pb.finish_and_clear();
        }
        inner.multi.suspend(|| println!("{line}"));
    }

    pub(crate) fn finish(&self) {
        let mut inner = self.lock();

        for (_, pb) in inner.bars.drain() {
            pb.finish_and_clear();
        }

        let _ = inner.multi.clear();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [ {bar:24.cyan/blue} ] {pos}/{len} users {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}
