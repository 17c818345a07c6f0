//! Versioned whole-state snapshot, the unit of remote backup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DraftWorkout, FoodDay, Routine, Workout};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Reasons a payload is not accepted as a snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Full copy of the local state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub version: String,
    pub sync_date: DateTime<Utc>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub current_workout: Option<DraftWorkout>,
    #[serde(default)]
    pub food_diary: Vec<FoodDay>,
}

impl SyncSnapshot {
    /// Parses a downloaded payload.
    ///
    /// The payload must be an object carrying `version` and `syncDate`;
    /// anything else is rejected as a whole rather than partially applied.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let object = value.as_object().ok_or(SnapshotError::NotAnObject)?;

        for field in ["version", "syncDate"] {
            if object.get(field).map_or(true, |v| v.is_null()) {
                return Err(SnapshotError::MissingField(field));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_snapshot_parses() {
        let raw = r#"{"version": "1.0", "syncDate": "2025-04-01T12:00:00Z"}"#;
        let snapshot = SyncSnapshot::from_json(raw).unwrap();
        assert_eq!(snapshot.version, "1.0");
        assert!(snapshot.workouts.is_empty());
        assert!(snapshot.current_workout.is_none());
    }

    #[test]
    fn test_missing_version_rejected() {
        let raw = r#"{"syncDate": "2025-04-01T12:00:00Z", "workouts": []}"#;
        let err = SyncSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingField("version")));
    }

    #[test]
    fn test_missing_sync_date_rejected() {
        let raw = r#"{"version": "1.0", "workouts": []}"#;
        let err = SyncSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingField("syncDate")));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            SyncSnapshot::from_json("[1, 2, 3]").unwrap_err(),
            SnapshotError::NotAnObject
        ));
        assert!(matches!(
            SyncSnapshot::from_json("not json").unwrap_err(),
            SnapshotError::Malformed(_)
        ));
    }

    #[test]
    fn test_uses_camel_case_keys() {
        let snapshot = SyncSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            sync_date: "2025-04-01T12:00:00Z".parse().unwrap(),
            workouts: Vec::new(),
            routines: Vec::new(),
            current_workout: Some(DraftWorkout::default()),
            food_diary: Vec::new(),
        };

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(json.get("syncDate").is_some());
        assert!(json.get("currentWorkout").is_some());
        assert!(json.get("foodDiary").is_some());
    }
}
