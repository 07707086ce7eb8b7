use log::{debug, warn};
use std::collections::HashMap;

use crate::game::level_store::LevelStore;
use crate::model::{LevelNumber, StarCount, MAX_STARS};

/// Which star graphic to show: one per possible star count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarIcon {
    None,
    One,
    Two,
    Three,
}

impl StarIcon {
    /// Out of range counts are clamped with a warning rather than rejected.
    pub fn for_count(count: i64) -> Self {
        if !(0..=MAX_STARS as i64).contains(&count) {
            warn!(target: "level_selection", "Invalid star count ({}), clamping", count);
        }
        match count.clamp(0, MAX_STARS as i64) {
            0 => StarIcon::None,
            1 => StarIcon::One,
            2 => StarIcon::Two,
            _ => StarIcon::Three,
        }
    }

    /// Icon for the result screen of the run that just finished.
    pub fn for_run(stars: StarCount) -> Self {
        Self::for_count(stars as i64)
    }

    pub fn index(&self) -> usize {
        match self {
            StarIcon::None => 0,
            StarIcon::One => 1,
            StarIcon::Two => 2,
            StarIcon::Three => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorDisplay {
    pub level: LevelNumber,
    pub stars: StarCount,
    pub locked: bool,
    pub icon: StarIcon,
}

/// Door states for the level selection scene, computed once on entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSelection {
    doors: Vec<DoorDisplay>,
}

impl LevelSelection {
    pub fn load(store: &LevelStore, door_count: usize) -> Self {
        Self::from_stars(&store.read_all_stars(), door_count)
    }

    /// Door `i` (1-based) is locked when any earlier level has no stars.
    /// Levels missing from `stars` count as zero.
    pub fn from_stars(stars: &HashMap<LevelNumber, StarCount>, door_count: usize) -> Self {
        let mut doors = Vec::with_capacity(door_count);
        let mut earlier_level_unstarred = false;
        for level in (1..=door_count).map(|level| level as LevelNumber) {
            let count = stars.get(&level).copied().unwrap_or(0);
            let icon = StarIcon::for_count(count as i64);
            doors.push(DoorDisplay {
                level,
                stars: icon.index() as StarCount,
                locked: earlier_level_unstarred,
                icon,
            });
            earlier_level_unstarred |= count == 0;
        }
        debug!(
            target: "level_selection",
            "Matched {} doors, {} unlocked",
            doors.len(),
            doors.iter().filter(|door| !door.locked).count()
        );
        Self { doors }
    }

    pub fn doors(&self) -> &[DoorDisplay] {
        &self.doors
    }

    pub fn door(&self, level: LevelNumber) -> Option<&DoorDisplay> {
        self.doors.iter().find(|door| door.level == level)
    }

    pub fn total_stars(&self) -> u32 {
        self.doors.iter().map(|door| door.stars as u32).sum()
    }
}
