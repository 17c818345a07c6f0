use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::exercise::Exercise;
use crate::id::EntityId;

/// A named, reusable template of exercises.
///
/// Exercises are copies; a routine never shares exercise identity with a
/// workout or the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: EntityId,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Routine: {} ({})", self.name, self.id)?;
        writeln!(f, "{}", "=".repeat(30))?;
        for exercise in &self.exercises {
            writeln!(f, "  - {}", exercise)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_uses_camel_case() {
        let routine = Routine {
            id: EntityId::new(7),
            name: "Push day".to_string(),
            exercises: Vec::new(),
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_value(&routine).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
