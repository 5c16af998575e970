use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Every lane ends at this checkpoint.
pub const FINAL_CHECKPOINT: u32 = 10;

/// Extracts the checkpoint number from ids such as `L2_CP7`.
///
/// Returns `None` when the id has no `CP` marker or no digits follow it.
pub fn checkpoint_number(cpid: &str) -> Option<u32> {
    let (_, rest) = cpid.split_once("CP")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

pub fn checkpoint_id(lane: &str, number: u32) -> String {
    format!("{lane}_CP{number}")
}

pub fn is_final_checkpoint(cpid: &str) -> bool {
    checkpoint_number(cpid).is_some_and(|n| n >= FINAL_CHECKPOINT)
}

/// `L3` -> `Lane 3`.
pub fn lane_display_name(lane: &str) -> String {
    format!("Lane {}", lane.trim_start_matches('L'))
}

/// Rounded integer share of `part` in `total`, 0 when there is nothing to share.
pub fn percentage(part: i64, total: i64) -> i64 {
    if total > 0 {
        ((part as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleCategory {
    A,
    B,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::A => "A",
            VehicleCategory::B => "B",
        }
    }

    /// Category A vehicles carry an `X` as the fifth character of their BA number.
    pub fn from_ba_no(ba_no: &str) -> Self {
        match ba_no.chars().nth(4) {
            Some(c) if c.eq_ignore_ascii_case(&'X') => VehicleCategory::A,
            _ => VehicleCategory::B,
        }
    }

    /// Randomized travel time to the next checkpoint: A takes 4-6 minutes,
    /// everything else 1-3, plus up to 59 seconds.
    pub fn simulated_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedDelay {
        let minutes = match self {
            VehicleCategory::A => rng.gen_range(4..=6),
            VehicleCategory::B => rng.gen_range(1..=3),
        };
        SimulatedDelay {
            minutes,
            seconds: rng.gen_range(0..=59),
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(VehicleCategory::A),
            "B" | "b" => Ok(VehicleCategory::B),
            other => Err(format!("unknown vehicle category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedDelay {
    pub minutes: i64,
    pub seconds: i64,
}

impl SimulatedDelay {
    pub fn as_duration(&self) -> Duration {
        Duration::minutes(self.minutes) + Duration::seconds(self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parses_checkpoint_numbers() {
        assert_eq!(checkpoint_number("L1_CP1"), Some(1));
        assert_eq!(checkpoint_number("L4_CP10"), Some(10));
        assert_eq!(checkpoint_number("L2CP7"), Some(7));
        assert_eq!(checkpoint_number("L2_GATE"), None);
        assert_eq!(checkpoint_number("L2_CP"), None);
    }

    #[test]
    fn builds_checkpoint_ids() {
        assert_eq!(checkpoint_id("L3", 4), "L3_CP4");
        assert_eq!(checkpoint_number(&checkpoint_id("L3", 4)), Some(4));
    }

    #[test]
    fn final_checkpoint_detection() {
        assert!(is_final_checkpoint("L1_CP10"));
        assert!(!is_final_checkpoint("L1_CP1"));
        assert!(!is_final_checkpoint("unknown"));
    }

    #[test]
    fn category_from_ba_number() {
        assert_eq!(VehicleCategory::from_ba_no("BA01X234"), VehicleCategory::A);
        assert_eq!(VehicleCategory::from_ba_no("ba01x"), VehicleCategory::A);
        assert_eq!(VehicleCategory::from_ba_no("BA001"), VehicleCategory::B);
        assert_eq!(VehicleCategory::from_ba_no("BAX"), VehicleCategory::B);
    }

    #[test]
    fn delays_stay_in_category_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = VehicleCategory::A.simulated_delay(&mut rng);
            assert!((4..=6).contains(&a.minutes));
            assert!((0..=59).contains(&a.seconds));

            let b = VehicleCategory::B.simulated_delay(&mut rng);
            assert!((1..=3).contains(&b.minutes));
        }
    }

    #[test]
    fn percentages_round_and_handle_empty_totals() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn lane_names() {
        assert_eq!(lane_display_name("L2"), "Lane 2");
    }
}
