use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::exercise::Exercise;
use super::measure::Measure;
use crate::id::EntityId;

/// A finished workout session. Only created by finalizing the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: EntityId,
    pub date: DateTime<Utc>,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
}

/// The single in-progress workout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftWorkout {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl DraftWorkout {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workout {} - {}", self.id, self.date.format("%Y-%m-%d %H:%M"))?;
        writeln!(f, "{}", "=".repeat(30))?;
        if let Some(duration) = &self.duration {
            writeln!(f, "Duration: {}", duration)?;
        }
        for exercise in &self.exercises {
            writeln!(f, "  - {}", exercise)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SetEntry;

    #[test]
    fn test_draft_default_is_empty() {
        let draft = DraftWorkout::default();
        assert!(draft.is_empty());

        let parsed: DraftWorkout = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, draft);
    }

    #[test]
    fn test_workout_display() {
        let workout = Workout {
            id: EntityId::new(42),
            date: "2025-03-01T18:30:00Z".parse().unwrap(),
            exercises: vec![Exercise::strength("Squat", vec![SetEntry::new(100, 5)])],
            duration: Some(Measure::from("45 min")),
        };

        let output = workout.to_string();
        assert!(output.contains("Workout 42 - 2025-03-01 18:30"));
        assert!(output.contains("Duration: 45 min"));
        assert!(output.contains("Squat (strength): 100x5"));
    }
}
