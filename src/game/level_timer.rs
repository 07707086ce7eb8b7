use log::trace;

use super::run_stats::SharedRunStats;
use crate::model::LevelNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRunState {
    Running,
    Stopped,
}

/// Frame-driven level clock. The host calls [`LevelTimer::tick`] once per
/// frame with the frame's delta; time only accumulates while running.
///
/// Stopping the timer freezes its own time and nothing else; pausing the game
/// is the host's business.
#[derive(Debug)]
pub struct LevelTimer {
    elapsed: f64,
    state: TimerRunState,
    run_stats: SharedRunStats,
}

impl LevelTimer {
    pub fn new(run_stats: SharedRunStats) -> Self {
        Self {
            elapsed: 0.0,
            state: TimerRunState::Running,
            run_stats,
        }
    }

    pub fn tick(&mut self, delta: f64) {
        if self.state == TimerRunState::Running && delta > 0.0 {
            self.elapsed += delta;
        }
    }

    pub fn stop(&mut self) {
        trace!(target: "timer", "Stopped at {:.2}", self.elapsed);
        self.state = TimerRunState::Stopped;
    }

    pub fn resume(&mut self) {
        self.state = TimerRunState::Running;
    }

    /// Zeros the clock without changing whether it is running.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn state(&self) -> TimerRunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerRunState::Running
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn formatted(&self) -> String {
        format!("{:.2}", self.elapsed)
    }

    /// Feeds a completed run into the process-wide statistics used for
    /// threshold suggestions. Independent of the running state.
    pub fn record_level_time(&self, level: LevelNumber, time: f64) {
        self.run_stats.borrow_mut().record(level, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::run_stats::RunStatsTable;

    #[test]
    fn test_accumulates_only_while_running() {
        let mut timer = LevelTimer::new(RunStatsTable::shared());
        timer.tick(0.5);
        timer.tick(0.25);
        assert_eq!(timer.elapsed(), 0.75);

        timer.stop();
        timer.tick(1.0);
        assert_eq!(timer.elapsed(), 0.75);
        assert_eq!(timer.state(), TimerRunState::Stopped);

        timer.resume();
        timer.tick(0.25);
        assert_eq!(timer.elapsed(), 1.0);
    }

    #[test]
    fn test_reset_preserves_state() {
        let mut timer = LevelTimer::new(RunStatsTable::shared());
        timer.tick(3.0);
        timer.stop();
        timer.reset();

        assert_eq!(timer.elapsed(), 0.0);
        assert!(!timer.is_running());

        timer.resume();
        timer.reset();
        assert!(timer.is_running());
    }

    #[test]
    fn test_formatted_uses_two_decimals() {
        let mut timer = LevelTimer::new(RunStatsTable::shared());
        assert_eq!(timer.formatted(), "0.00");
        timer.tick(12.3456);
        assert_eq!(timer.formatted(), "12.35");
    }

    #[test]
    fn test_record_level_time_ignores_timer_state() {
        let stats = RunStatsTable::shared();
        let mut timer = LevelTimer::new(stats.clone());
        timer.stop();
        timer.record_level_time(2, 8.0);
        timer.record_level_time(2, 6.0);

        let table = stats.borrow();
        let level = table.get(2).unwrap();
        assert_eq!(level.runs, 2);
        assert_eq!(level.fastest, 6.0);
        assert_eq!(level.last, 6.0);
    }

    #[test]
    fn test_record_level_time_skips_negative_time() {
        let stats = RunStatsTable::shared();
        let timer = LevelTimer::new(stats.clone());
        timer.record_level_time(1, -1.0);
        timer.record_level_time(1, 10.0);

        let table = stats.borrow();
        let level = table.get(1).unwrap();
        assert_eq!(level.runs, 1);
        assert_eq!(level.fastest, 10.0);
    }
}
