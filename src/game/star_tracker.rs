use log::{info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::SystemTime;
use uuid::Uuid;

use super::level_store::LevelStore;
use super::run_stats::SharedRunStats;
use super::settings::Settings;
use super::star_calculator::StarCalculator;
use crate::destroyable::Destroyable;
use crate::events::{EventEmitter, EventHandler, EventObserver, Unsubscriber};
use crate::model::{FinishOutcome, LevelEvent, LevelNumber, TrackerEvent};

#[derive(Debug, Clone, PartialEq)]
enum FinishState {
    Pending,
    Rejected,
    Recorded(FinishOutcome),
}

/// Turns the finish of one level-play session into persisted best time and
/// stars. A session has exactly one finish: whatever arrives after the first
/// one is ignored.
pub struct StarTracker {
    session_id: Uuid,
    level: LevelNumber,
    store: LevelStore,
    settings: Settings,
    run_stats: SharedRunStats,
    finish: FinishState,
    tracker_event_emitter: EventEmitter<TrackerEvent>,
    subscription: Option<Unsubscriber<LevelEvent>>,
}

impl Destroyable for StarTracker {
    fn destroy(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl StarTracker {
    pub fn new(
        session_id: Uuid,
        level: LevelNumber,
        store: LevelStore,
        settings: Settings,
        run_stats: SharedRunStats,
        tracker_event_emitter: EventEmitter<TrackerEvent>,
    ) -> Self {
        Self {
            session_id,
            level,
            store,
            settings,
            run_stats,
            finish: FinishState::Pending,
            tracker_event_emitter,
            subscription: None,
        }
    }

    /// Builds a tracker that handles the events of `level_event_observer`.
    pub fn subscribed(
        tracker: StarTracker,
        level_event_observer: &EventObserver<LevelEvent>,
    ) -> Rc<RefCell<Self>> {
        let refcell = Rc::new(RefCell::new(tracker));
        let handler = refcell.clone();
        let subscription = level_event_observer.subscribe(move |event| {
            handler.borrow_mut().handle_event(event);
        });
        refcell.borrow_mut().subscription = Some(subscription);
        refcell
    }

    pub fn level(&self) -> LevelNumber {
        self.level
    }

    pub fn finish_processed(&self) -> bool {
        self.finish != FinishState::Pending
    }

    pub fn outcome(&self) -> Option<&FinishOutcome> {
        match &self.finish {
            FinishState::Recorded(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn validate(&self, time: f64) -> bool {
        if !self.settings.levels().contains(&self.level) {
            warn!(
                target: "stars",
                "Level {} is outside the valid range {:?}; finish not recorded",
                self.level,
                self.settings.levels()
            );
            return false;
        }
        if !time.is_finite() || time < 0.0 {
            warn!(target: "stars", "Invalid finish time {} for level {}; finish not recorded", time, self.level);
            return false;
        }
        true
    }

    pub fn handle_finish(&mut self, time: f64) -> Option<&FinishOutcome> {
        if self.finish_processed() {
            trace!(target: "stars", "Finish for level {} already processed", self.level);
            return None;
        }
        self.finish = FinishState::Rejected;

        if !self.validate(time) {
            self.tracker_event_emitter.emit(TrackerEvent::FinishRejected {
                level: self.level,
                time,
            });
            return None;
        }

        let level = self.level;
        self.run_stats.borrow_mut().record(level, time);

        let run_stars = StarCalculator::new(&self.store).calculate_stars(level, time);
        let previous_best = self.store.read_best_time(level);
        let new_best = previous_best.map_or(true, |best| time < best);

        if new_best {
            info!(
                target: "stars",
                "Level {} new best {:.2} (previous {:?}), {} stars",
                level, time, previous_best, run_stars
            );
            self.persist(level, time, run_stars);
        } else {
            info!(target: "stars", "Level {} finish {:.2} is not better; no update", level, time);
        }

        let outcome = FinishOutcome {
            session_id: self.session_id,
            level,
            finish_time: time,
            previous_best,
            new_best,
            run_stars,
            stored_stars: self.store.read_stars(level),
            finished_at: SystemTime::now(),
        };
        self.tracker_event_emitter
            .emit(TrackerEvent::FinishRecorded(outcome.clone()));
        self.finish = FinishState::Recorded(outcome);
        self.outcome()
    }

    fn persist(&self, level: LevelNumber, time: f64, stars: u8) {
        if self.settings.atomic_finish_writes {
            self.store.commit_finish(level, time, stars);
            return;
        }
        // two round trips; a failure in between leaves stars stale until the next finish
        self.store.write_best_time(level, time);
        if stars > self.store.read_stars(level) {
            self.store.write_stars(level, stars);
        }
    }
}

impl EventHandler<LevelEvent> for StarTracker {
    fn handle_event(&mut self, event: &LevelEvent) {
        match event {
            LevelEvent::Finished { time } => {
                self.handle_finish(*time);
            }
            LevelEvent::Died => {
                trace!(target: "stars", "Player died on level {}", self.level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Channel;
    use crate::game::level_store::tests::temp_store;
    use crate::game::run_stats::RunStatsTable;
    use crate::model::StarThresholds;
    use crate::tests::UsingLogger;
    use test_context::test_context;

    fn tracker_for(store: &LevelStore, level: LevelNumber, settings: Settings) -> StarTracker {
        let (emitter, _observer) = Channel::<TrackerEvent>::new();
        StarTracker::new(
            Uuid::new_v4(),
            level,
            store.clone(),
            settings,
            RunStatsTable::shared(),
            emitter,
        )
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_level_three_scenario(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        store.write_thresholds(3, &StarThresholds::new(10.0, 14.0, 20.0));
        store.write_stars(3, 1);

        let mut first = tracker_for(&store, 3, Settings::default());
        let outcome = first.handle_finish(12.0).cloned().unwrap();
        assert!(outcome.new_best);
        assert_eq!(outcome.previous_best, None);
        assert_eq!(outcome.run_stars, 2);
        assert_eq!(outcome.stored_stars, 2);
        assert_eq!(store.read_best_time(3), Some(12.0));
        assert_eq!(store.read_stars(3), 2);

        let mut second = tracker_for(&store, 3, Settings::default());
        let outcome = second.handle_finish(15.0).cloned().unwrap();
        assert!(!outcome.new_best);
        assert_eq!(outcome.previous_best, Some(12.0));
        assert_eq!(outcome.run_stars, 1);
        assert_eq!(outcome.stored_stars, 2);
        assert_eq!(store.read_best_time(3), Some(12.0));
        assert_eq!(store.read_stars(3), 2);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_second_finish_in_session_is_ignored(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        store.write_thresholds(1, &StarThresholds::new(10.0, 14.0, 20.0));
        let run_stats = RunStatsTable::shared();
        let (emitter, _observer) = Channel::<TrackerEvent>::new();
        let mut tracker = StarTracker::new(
            Uuid::new_v4(),
            1,
            store.clone(),
            Settings::default(),
            run_stats.clone(),
            emitter,
        );

        assert!(tracker.handle_finish(18.0).is_some());
        assert!(tracker.finish_processed());
        assert!(tracker.handle_finish(5.0).is_none());

        assert_eq!(store.read_best_time(1), Some(18.0));
        assert_eq!(store.read_stars(1), 1);
        assert_eq!(run_stats.borrow().get(1).unwrap().runs, 1);
        assert_eq!(tracker.outcome().unwrap().finish_time, 18.0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_improved_time_never_downgrades_stars(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        store.write_thresholds(2, &StarThresholds::new(10.0, 14.0, 20.0));
        store.write_best_time(2, 30.0);
        store.write_stars(2, 3);

        let outcome = tracker_for(&store, 2, Settings::default())
            .handle_finish(19.0)
            .cloned()
            .unwrap();

        assert!(outcome.new_best);
        assert_eq!(outcome.run_stars, 1);
        assert_eq!(store.read_best_time(2), Some(19.0));
        assert_eq!(store.read_stars(2), 3);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_non_atomic_writes_reach_same_state(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        store.write_thresholds(4, &StarThresholds::new(10.0, 14.0, 20.0));
        let mut settings = Settings::default();
        settings.atomic_finish_writes = false;

        tracker_for(&store, 4, settings.clone()).handle_finish(9.0);
        assert_eq!(store.read_best_time(4), Some(9.0));
        assert_eq!(store.read_stars(4), 3);

        tracker_for(&store, 4, settings).handle_finish(8.0);
        assert_eq!(store.read_best_time(4), Some(8.0));
        assert_eq!(store.read_stars(4), 3);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_rejects_invalid_input(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        let run_stats = RunStatsTable::shared();
        let (emitter, observer) = Channel::<TrackerEvent>::new();
        let rejected = Rc::new(RefCell::new(Vec::new()));
        let rejected_clone = rejected.clone();
        observer.subscribe(move |event: &TrackerEvent| {
            if let TrackerEvent::FinishRejected { level, .. } = event {
                rejected_clone.borrow_mut().push(*level);
            }
        });

        let mut out_of_range = StarTracker::new(
            Uuid::new_v4(),
            99,
            store.clone(),
            Settings::default(),
            run_stats.clone(),
            emitter.clone(),
        );
        assert!(out_of_range.handle_finish(10.0).is_none());

        let mut negative = StarTracker::new(
            Uuid::new_v4(),
            1,
            store.clone(),
            Settings::default(),
            run_stats.clone(),
            emitter,
        );
        assert!(negative.handle_finish(-1.0).is_none());
        assert!(negative.finish_processed());

        assert_eq!(*rejected.borrow(), vec![99, 1]);
        assert!(run_stats.borrow().is_empty());
        assert!(store.read_all_stars().is_empty());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_subscribed_tracker_handles_events_once(_: &mut UsingLogger) {
        let (_dir, store) = temp_store();
        store.write_thresholds(1, &StarThresholds::new(10.0, 14.0, 20.0));
        let (level_emitter, level_observer) = Channel::<LevelEvent>::new();
        let (tracker_emitter, tracker_observer) = Channel::<TrackerEvent>::new();
        let recorded = Rc::new(RefCell::new(0));
        let recorded_clone = recorded.clone();
        tracker_observer.subscribe(move |event: &TrackerEvent| {
            if matches!(event, TrackerEvent::FinishRecorded(_)) {
                *recorded_clone.borrow_mut() += 1;
            }
        });

        let tracker = StarTracker::subscribed(
            StarTracker::new(
                Uuid::new_v4(),
                1,
                store.clone(),
                Settings::default(),
                RunStatsTable::shared(),
                tracker_emitter,
            ),
            &level_observer,
        );

        level_emitter.emit(LevelEvent::Died);
        assert!(!tracker.borrow().finish_processed());

        level_emitter.emit(LevelEvent::Finished { time: 9.0 });
        level_emitter.emit(LevelEvent::Finished { time: 8.0 });
        assert_eq!(*recorded.borrow(), 1);
        assert_eq!(store.read_best_time(1), Some(9.0));

        tracker.borrow_mut().destroy();
        assert!(!level_emitter.has_listeners());
    }
}
