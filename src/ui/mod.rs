pub mod level_selection;

pub use level_selection::{DoorDisplay, LevelSelection, StarIcon};
