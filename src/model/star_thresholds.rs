use serde::{Deserialize, Serialize};

use super::StarCount;

/// Finish-time cutoffs in seconds. A run at or below `three_star` earns three
/// stars, at or below `two_star` two, at or below `one_star` one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarThresholds {
    pub three_star: f64,
    pub two_star: f64,
    pub one_star: f64,
}

impl StarThresholds {
    pub fn new(three_star: f64, two_star: f64, one_star: f64) -> Self {
        Self {
            three_star,
            two_star,
            one_star,
        }
    }

    pub fn stars_for(&self, finish_time: f64) -> StarCount {
        if finish_time <= self.three_star {
            3
        } else if finish_time <= self.two_star {
            2
        } else if finish_time <= self.one_star {
            1
        } else {
            0
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.warnings().is_empty()
    }

    /// Data-entry warnings shown next to a row in the tuner. Ordering is never
    /// enforced when reading, only reported.
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.two_star < self.three_star {
            warnings.push("2 star threshold should be higher than 3 star threshold");
        }
        if self.one_star < self.two_star {
            warnings.push("1 star threshold should be highest");
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_for_boundaries() {
        let thresholds = StarThresholds::new(10.0, 14.0, 20.0);

        assert_eq!(thresholds.stars_for(0.0), 3);
        assert_eq!(thresholds.stars_for(10.0), 3);
        assert_eq!(thresholds.stars_for(10.01), 2);
        assert_eq!(thresholds.stars_for(14.0), 2);
        assert_eq!(thresholds.stars_for(14.5), 1);
        assert_eq!(thresholds.stars_for(20.0), 1);
        assert_eq!(thresholds.stars_for(20.01), 0);
    }

    #[test]
    fn test_warnings_for_misordered_thresholds() {
        assert!(StarThresholds::new(10.0, 14.0, 20.0).is_ordered());
        assert!(StarThresholds::new(10.0, 10.0, 10.0).is_ordered());

        let swapped = StarThresholds::new(15.0, 14.0, 12.0);
        assert_eq!(swapped.warnings().len(), 2);

        let one_low = StarThresholds::new(10.0, 14.0, 13.0);
        assert_eq!(one_low.warnings(), vec!["1 star threshold should be highest"]);
    }
}
