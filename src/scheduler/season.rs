use chrono::{DateTime, Datelike, Utc};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Months are 0-indexed (January = 0).
    pub fn from_month0(month0: u32) -> Self {
        match month0 {
            2..=4 => Season::Spring,
            5..=7 => Season::Summer,
            8..=10 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn of(at: DateTime<Utc>) -> Self {
        Self::from_month0(at.month0())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}

/// Per-season multiplier applied to a base care frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SeasonalMultipliers {
    pub spring: f64,
    pub summer: f64,
    pub fall: f64,
    pub winter: f64,
}

impl Default for SeasonalMultipliers {
    fn default() -> Self {
        Self {
            spring: 1.2,
            summer: 1.3,
            fall: 0.9,
            winter: 0.7,
        }
    }
}

/// Accepted range for any single multiplier.
pub const MULTIPLIER_RANGE: std::ops::RangeInclusive<f64> = 0.1..=5.0;

impl SeasonalMultipliers {
    pub fn for_season(&self, season: Season) -> f64 {
        match season {
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Fall => self.fall,
            Season::Winter => self.winter,
        }
    }

    /// Parses overrides such as `spring=1.1,winter=0.6`; unspecified seasons keep their defaults.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut table = Self::default();
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected season=multiplier, got '{}'", pair))?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("invalid multiplier '{}'", value.trim()))?;
            match name.parse::<Season>()? {
                Season::Spring => table.spring = value,
                Season::Summer => table.summer = value,
                Season::Fall => table.fall = value,
                Season::Winter => table.winter = value,
            }
        }
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), String> {
        for season in [Season::Spring, Season::Summer, Season::Fall, Season::Winter] {
            let value = self.for_season(season);
            if !value.is_finite() || !MULTIPLIER_RANGE.contains(&value) {
                return Err(format!(
                    "{} multiplier must be between {} and {}, got {}",
                    season,
                    MULTIPLIER_RANGE.start(),
                    MULTIPLIER_RANGE.end(),
                    value
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_season_from_month() {
        assert_eq!(Season::from_month0(3), Season::Spring);
        assert_eq!(Season::from_month0(6), Season::Summer);
        assert_eq!(Season::from_month0(9), Season::Fall);
        assert_eq!(Season::from_month0(11), Season::Winter);
        assert_eq!(Season::from_month0(0), Season::Winter);
        assert_eq!(Season::from_month0(1), Season::Winter);
        assert_eq!(Season::from_month0(2), Season::Spring);
        assert_eq!(Season::from_month0(10), Season::Fall);
    }

    #[test]
    fn test_season_of_date() {
        let july = Utc.with_ymd_and_hms(2026, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(Season::of(july), Season::Summer);
        let december = Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap();
        assert_eq!(Season::of(december), Season::Winter);
    }

    #[test]
    fn test_parse_overrides() {
        let table = SeasonalMultipliers::parse("spring=1.1, winter=0.5").unwrap();
        assert_eq!(table.spring, 1.1);
        assert_eq!(table.winter, 0.5);
        assert_eq!(table.summer, 1.3);
        assert_eq!(table.fall, 0.9);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SeasonalMultipliers::parse("monsoon=1.0").is_err());
        assert!(SeasonalMultipliers::parse("spring").is_err());
        assert!(SeasonalMultipliers::parse("spring=-1").is_err());
        assert!(SeasonalMultipliers::parse("summer=0").is_err());
        assert!(SeasonalMultipliers::parse("fall=1e9").is_err());
        assert!(SeasonalMultipliers::parse("winter=NaN").is_err());
        assert!(SeasonalMultipliers::parse("").is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(SeasonalMultipliers::default().validate().is_ok());

        let edges = SeasonalMultipliers {
            spring: 0.1,
            summer: 5.0,
            fall: 1.0,
            winter: 1.0,
        };
        assert!(edges.validate().is_ok());

        let negative = SeasonalMultipliers {
            winter: -5.0,
            ..SeasonalMultipliers::default()
        };
        let err = negative.validate().unwrap_err();
        assert!(err.contains("winter"));

        let huge = SeasonalMultipliers {
            spring: 1e9,
            ..SeasonalMultipliers::default()
        };
        assert!(huge.validate().is_err());
    }
}
