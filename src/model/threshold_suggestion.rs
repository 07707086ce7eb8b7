use serde::{Deserialize, Serialize};

use super::StarThresholds;

/// Multipliers applied to the fastest recorded run when suggesting thresholds.
/// Expected `three_star < two_star < one_star`; not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarMultipliers {
    #[serde(default = "default_three_star")]
    pub three_star: f64,
    #[serde(default = "default_two_star")]
    pub two_star: f64,
    #[serde(default = "default_one_star")]
    pub one_star: f64,
}

fn default_three_star() -> f64 {
    1.1
}
fn default_two_star() -> f64 {
    1.4
}
fn default_one_star() -> f64 {
    2.0
}

impl Default for StarMultipliers {
    fn default() -> Self {
        Self {
            three_star: default_three_star(),
            two_star: default_two_star(),
            one_star: default_one_star(),
        }
    }
}

/// Derived from run statistics, never stored. All zeros means "no valid runs yet".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdSuggestion {
    pub three_star: f64,
    pub two_star: f64,
    pub one_star: f64,
}

impl ThresholdSuggestion {
    pub fn is_valid(&self) -> bool {
        self.three_star > 0.0
    }

    pub fn as_thresholds(&self) -> StarThresholds {
        StarThresholds::new(self.three_star, self.two_star, self.one_star)
    }
}
