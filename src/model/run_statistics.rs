use serde::{Deserialize, Serialize};

/// Aggregate timings for completions of one level. Fields are readable
/// everywhere but only [`RunStatistics::record`] changes them.
#[readonly::make]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub fastest: f64,
    pub slowest: f64,
    pub total: f64,
    pub runs: u32,
    pub last: f64,
    /// Unix seconds of the most recent run.
    pub last_recorded_at: i64,
}

impl RunStatistics {
    pub fn first_run(time: f64, recorded_at: i64) -> Self {
        Self {
            fastest: time,
            slowest: time,
            total: time,
            runs: 1,
            last: time,
            last_recorded_at: recorded_at,
        }
    }

    pub fn record(&mut self, time: f64, recorded_at: i64) {
        self.fastest = self.fastest.min(time);
        self.slowest = self.slowest.max(time);
        self.total += time;
        self.runs += 1;
        self.last = time;
        self.last_recorded_at = recorded_at;
    }

    pub fn average(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        self.total / self.runs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_extremes_and_average() {
        let mut stats = RunStatistics::first_run(12.0, 100);
        stats.record(9.0, 110);
        stats.record(15.0, 120);

        assert_eq!(stats.fastest, 9.0);
        assert_eq!(stats.slowest, 15.0);
        assert_eq!(stats.runs, 3);
        assert_eq!(stats.last, 15.0);
        assert_eq!(stats.last_recorded_at, 120);
        assert!((stats.average() - 12.0).abs() < 1e-9);
    }
}
