use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

use super::context::GameContext;
use super::level_timer::LevelTimer;
use super::star_tracker::StarTracker;
use crate::destroyable::Destroyable;
use crate::events::{Channel, EventEmitter, EventObserver};
use crate::model::{FinishOutcome, LevelEvent, LevelNumber, TrackerEvent};

/// One play of one level: a running timer plus the tracker that persists its
/// finish. Dropping the session detaches the tracker.
pub struct LevelSession {
    id: Uuid,
    level: LevelNumber,
    timer: LevelTimer,
    level_event_emitter: EventEmitter<LevelEvent>,
    tracker_event_observer: EventObserver<TrackerEvent>,
    tracker: Rc<RefCell<StarTracker>>,
    ended: bool,
}

impl LevelSession {
    pub fn start(context: &GameContext, level: LevelNumber) -> Self {
        let id = Uuid::new_v4();
        let (level_event_emitter, level_event_observer) = Channel::<LevelEvent>::new();
        let (tracker_event_emitter, tracker_event_observer) = Channel::<TrackerEvent>::new();
        let tracker = StarTracker::subscribed(
            StarTracker::new(
                id,
                level,
                context.store.clone(),
                context.settings.clone(),
                context.run_stats.clone(),
                tracker_event_emitter,
            ),
            &level_event_observer,
        );
        debug!(target: "stars", "Session {} started on level {}", id, level);
        Self {
            id,
            level,
            timer: LevelTimer::new(context.run_stats.clone()),
            level_event_emitter,
            tracker_event_observer,
            tracker,
            ended: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn level(&self) -> LevelNumber {
        self.level
    }

    pub fn timer(&self) -> &LevelTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut LevelTimer {
        &mut self.timer
    }

    /// Per-frame update from the host.
    pub fn tick(&mut self, delta: f64) {
        self.timer.tick(delta);
    }

    /// Subscribe here to show the run's result, e.g. on a results screen.
    pub fn tracker_events(&self) -> EventObserver<TrackerEvent> {
        self.tracker_event_observer.clone()
    }

    /// Stops the clock and announces the finish. Only the first call has an
    /// effect; later calls return the same outcome.
    pub fn player_finished(&mut self) -> Option<FinishOutcome> {
        if !self.ended {
            self.ended = true;
            self.timer.stop();
            self.level_event_emitter.emit(LevelEvent::Finished {
                time: self.timer.elapsed(),
            });
        } else {
            trace!(target: "stars", "Session {} already ended", self.id);
        }
        self.outcome()
    }

    pub fn player_died(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.timer.stop();
        self.level_event_emitter.emit(LevelEvent::Died);
    }

    pub fn outcome(&self) -> Option<FinishOutcome> {
        self.tracker.borrow().outcome().cloned()
    }
}

impl Drop for LevelSession {
    fn drop(&mut self) {
        self.tracker.borrow_mut().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level_store::tests::temp_store;
    use crate::game::settings::Settings;
    use crate::model::StarThresholds;
    use crate::tests::UsingLogger;
    use test_context::test_context;

    fn context_with_store() -> (tempfile::TempDir, GameContext) {
        let (dir, store) = temp_store();
        store.write_thresholds(1, &StarThresholds::new(10.0, 14.0, 20.0));
        let mut settings = Settings::default();
        settings.database_path = store.database().path().to_path_buf();
        (dir, GameContext::open(settings).unwrap())
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_session_finish_persists_and_records_stats(_: &mut UsingLogger) {
        let (_dir, context) = context_with_store();
        let mut session = LevelSession::start(&context, 1);
        for _ in 0..12 {
            session.tick(1.0);
        }

        let outcome = session.player_finished().unwrap();
        assert_eq!(outcome.session_id, session.id());
        assert_eq!(outcome.finish_time, 12.0);
        assert_eq!(outcome.run_stars, 2);
        assert!(!session.timer().is_running());
        assert_eq!(context.store.read_stars(1), 2);
        assert_eq!(context.run_stats.borrow().get(1).unwrap().runs, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_repeated_finish_is_idempotent(_: &mut UsingLogger) {
        let (_dir, context) = context_with_store();
        let mut session = LevelSession::start(&context, 1);
        session.tick(9.0);

        let first = session.player_finished();
        session.tick(5.0);
        let second = session.player_finished();

        assert_eq!(first, second);
        assert_eq!(session.timer().elapsed(), 9.0);
        assert_eq!(context.run_stats.borrow().get(1).unwrap().runs, 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_death_ends_session_without_writes(_: &mut UsingLogger) {
        let (_dir, context) = context_with_store();
        let mut session = LevelSession::start(&context, 1);
        session.tick(3.0);
        session.player_died();

        assert_eq!(session.player_finished(), None);
        assert_eq!(context.store.read_best_time(1), None);
        assert!(context.run_stats.borrow().is_empty());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_tracker_events_reach_results_screen(_: &mut UsingLogger) {
        let (_dir, context) = context_with_store();
        let mut session = LevelSession::start(&context, 1);
        let shown = Rc::new(RefCell::new(None));
        let shown_clone = shown.clone();
        session.tracker_events().subscribe(move |event: &TrackerEvent| {
            if let TrackerEvent::FinishRecorded(outcome) = event {
                *shown_clone.borrow_mut() = Some(outcome.run_stars);
            }
        });

        session.tick(25.0);
        session.player_finished();

        assert_eq!(*shown.borrow(), Some(0));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_sessions_share_run_stats(_: &mut UsingLogger) {
        let (_dir, context) = context_with_store();
        for time in [15.0, 11.0] {
            let mut session = LevelSession::start(&context, 1);
            session.tick(time);
            session.player_finished();
        }

        let stats = context.run_stats.borrow();
        let level = stats.get(1).unwrap();
        assert_eq!(level.runs, 2);
        assert_eq!(level.fastest, 11.0);
        assert_eq!(context.store.read_best_time(1), Some(11.0));
    }
}
