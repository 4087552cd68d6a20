//! The numeric indicators that describe the state of the outbreak.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Infection level above which the indicator is considered critical.
pub const CRITICAL_INFECTION: u32 = 50;

/// A non-negative indicator with one decimal place.
///
/// The simulation service rounds its indicators to tenths and sends them as
/// JSON numbers, whole or not. They are held as a count of tenths so the
/// value sent back on the next turn is exactly the one received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u32);

impl Level {
    /// A whole-number level.
    #[must_use]
    pub const fn whole(value: u32) -> Self {
        Self(value.saturating_mul(10))
    }

    /// A level of `tenths / 10`.
    #[must_use]
    pub const fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    /// The level in tenths.
    #[must_use]
    pub const fn tenths(self) -> u32 {
        self.0
    }

    /// Returns `true` if the level has no fractional part.
    #[must_use]
    pub const fn is_whole(self) -> bool {
        self.0 % 10 == 0
    }

    /// Converts a JSON number, rounding to the nearest tenth.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for negative, non-finite, or
    /// out-of-range values.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_number(value: f64) -> Result<Self, String> {
        if !value.is_finite() {
            return Err(format!("indicator {value} is not a finite number"));
        }
        if value < 0.0 {
            return Err(format!("indicator {value} is negative"));
        }
        let tenths = (value * 10.0).round();
        if tenths > f64::from(u32::MAX) {
            return Err(format!("indicator {value} is out of range"));
        }
        Ok(Self(tenths as u32))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0 / 10)
        } else {
            write!(f, "{}.{}", self.0 / 10, self.0 % 10)
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_u32(self.0 / 10)
        } else {
            serializer.serialize_f64(f64::from(self.0) / 10.0)
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_number(value).map_err(de::Error::custom)
    }
}

/// Accepts a day counter sent as `3` or `3.0`; anything fractional,
/// negative, or non-finite is rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_day<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "day {value} is not a non-negative whole number"
        )));
    }
    Ok(value as u32)
}

/// Named numeric indicators for one session.
///
/// The simulation service is the sole source of truth for new values; the
/// engine replaces the whole record on every accepted turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Day counter. Never decreases across turns.
    #[serde(deserialize_with = "whole_day")]
    pub day: u32,
    /// Population, as a percentage of the starting population.
    pub pop: Level,
    /// Public trust.
    pub trust: Level,
    /// Economy.
    pub eco: Level,
    /// Infection.
    pub inf: Level,
    /// Cure progress.
    pub cure: Level,
    /// Healthcare load. Older service revisions omit it.
    #[serde(default)]
    pub load: Level,
}

impl Stats {
    /// The indicators every new session starts from.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            day: 1,
            pop: Level::whole(100),
            trust: Level::whole(70),
            eco: Level::whole(80),
            inf: Level::whole(5),
            cure: Level::whole(0),
            load: Level::whole(0),
        }
    }

    /// Returns `true` when infection has crossed the critical threshold.
    #[must_use]
    pub const fn infection_critical(&self) -> bool {
        self.inf.tenths() > Level::whole(CRITICAL_INFECTION).tenths()
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_stats_match_session_start() {
        let stats = Stats::initial();
        assert_eq!(stats.day, 1);
        assert_eq!(stats.pop, Level::whole(100));
        assert_eq!(stats.trust, Level::whole(70));
        assert_eq!(stats.eco, Level::whole(80));
        assert_eq!(stats.inf, Level::whole(5));
        assert_eq!(stats.cure, Level::whole(0));
    }

    #[test]
    fn test_deserialize_without_load_defaults_to_zero() {
        let json = serde_json::json!({
            "day": 2, "pop": 99, "trust": 68, "eco": 79, "inf": 7, "cure": 1
        });
        let stats: Stats = serde_json::from_value(json).unwrap();
        assert_eq!(stats.day, 2);
        assert_eq!(stats.load, Level::whole(0));
    }

    #[test]
    fn test_whole_number_floats_are_accepted() {
        // Arrange
        let json = serde_json::json!({
            "day": 2.0, "pop": 100.0, "trust": 70, "eco": 80.0, "inf": 5, "cure": 0
        });

        // Act
        let stats: Stats = serde_json::from_value(json).unwrap();

        // Assert
        assert_eq!(stats.day, 2);
        assert_eq!(stats.pop, Level::whole(100));
        assert_eq!(stats.eco, Level::whole(80));
    }

    #[test]
    fn test_fractional_indicators_keep_tenths_and_echo_back() {
        let json = serde_json::json!({
            "day": 3, "pop": 99.5, "trust": 68.2, "eco": 79.5, "inf": 7.3, "cure": 0.4, "load": 12.1
        });

        let stats: Stats = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(stats.eco, Level::from_tenths(795));
        assert_eq!(stats.eco.to_string(), "79.5");
        assert_eq!(serde_json::to_value(stats).unwrap(), json);
    }

    #[test]
    fn test_finer_precision_rounds_to_tenths() {
        let level = Level::from_number(12.34).unwrap();
        assert_eq!(level, Level::from_tenths(123));
    }

    #[test]
    fn test_negative_indicator_is_rejected() {
        let json = serde_json::json!({
            "day": 2, "pop": -1, "trust": 68, "eco": 79, "inf": 7, "cure": 1
        });
        assert!(serde_json::from_value::<Stats>(json).is_err());
        assert!(Level::from_number(f64::NAN).is_err());
        assert!(Level::from_number(f64::INFINITY).is_err());
    }

    #[test]
    fn test_fractional_or_negative_day_is_rejected() {
        for day in [serde_json::json!(2.5), serde_json::json!(-1)] {
            let json = serde_json::json!({
                "day": day, "pop": 99, "trust": 68, "eco": 79, "inf": 7, "cure": 1
            });
            assert!(serde_json::from_value::<Stats>(json).is_err(), "{day} was accepted");
        }
    }

    #[test]
    fn test_whole_levels_serialize_as_integers() {
        let json = serde_json::to_value(Stats::initial()).unwrap();
        assert_eq!(json["pop"], serde_json::json!(100));
        assert_eq!(json["day"], serde_json::json!(1));
    }

    #[test]
    fn test_infection_critical_above_threshold() {
        let mut stats = Stats::initial();
        stats.inf = Level::whole(CRITICAL_INFECTION);
        assert!(!stats.infection_critical());
        stats.inf = Level::from_tenths(CRITICAL_INFECTION * 10 + 1);
        assert!(stats.infection_critical());
    }
}
