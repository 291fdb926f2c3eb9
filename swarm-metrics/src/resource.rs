use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    visits: u64,
    failures: u64,
}

/// Visit counters for one content item, independent of which endpoint served it.
#[derive(Debug, Default)]
pub struct ResourceStats {
    counts: Mutex<Counts>,
}

impl ResourceStats {
    pub fn record_visit(&self, succeeded: bool) {
        let mut counts = self.counts.lock();
        counts.visits += 1;
        if !succeeded {
            counts.failures += 1;
        }
    }

    pub fn snapshot(&self, id: u64) -> ResourceSnapshot {
        let counts = *self.counts.lock();
        ResourceSnapshot {
            id,
            visits: counts.visits,
            failures: counts.failures,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub id: u64,
    pub visits: u64,
    pub failures: u64,
}

impl ResourceSnapshot {
    pub fn error_rate(&self) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        self.failures as f64 / self.visits as f64
    }
}
