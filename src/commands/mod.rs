use chrono::NaiveDate;
use clap::ValueEnum;
use fitlog_core::Measure;

mod config_cmd;
mod data;
mod food;
mod routine;
mod sync_cmd;
mod workout;

pub use config_cmd::ConfigCommand;
pub use data::{DataCommand, DataSubcommand};
pub use food::{FoodCommand, FoodSubcommand};
pub use routine::{RoutineCommand, RoutineSubcommand};
pub use sync_cmd::SyncCommand;
pub use workout::{WorkoutCommand, WorkoutSubcommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `YYYY-MM-DD` argument.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", value))
}

/// Keeps numbers numeric and anything else (`"20 min"`) as typed.
pub(crate) fn parse_measure(value: &str) -> Measure {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        Measure::from(n)
    } else if let Ok(n) = value.parse::<f64>() {
        Measure::from(n)
    } else {
        Measure::from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measure() {
        assert_eq!(parse_measure("80"), Measure::from(80));
        assert_eq!(parse_measure(" 62.5 "), Measure::from(62.5));
        assert_eq!(parse_measure("20 min"), Measure::from("20 min"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date("10/03/2025").is_err());
    }
}
