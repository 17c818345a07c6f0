use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::measure::Measure;
use crate::id::EntityId;

/// Kind of exercise, which decides the fields that must be filled in.
///
/// Documents written before cardio/HIIT support have no `type` field; they
/// deserialize as [`ExerciseKind::Strength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    Strength,
    Cardio,
    Hiit,
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::Strength => write!(f, "strength"),
            ExerciseKind::Cardio => write!(f, "cardio"),
            ExerciseKind::Hiit => write!(f, "hiit"),
        }
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strength" => Ok(ExerciseKind::Strength),
            "cardio" => Ok(ExerciseKind::Cardio),
            "hiit" => Ok(ExerciseKind::Hiit),
            _ => Err(format!(
                "Invalid exercise type '{}'. Valid options: strength, cardio, hiit",
                s
            )),
        }
    }
}

/// One set of a strength exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub weight: Measure,
    pub reps: Measure,
}

impl SetEntry {
    pub fn new(weight: impl Into<Measure>, reps: impl Into<Measure>) -> Self {
        Self {
            weight: weight.into(),
            reps: reps.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ExerciseKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<SetEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Measure>,
}

impl Exercise {
    /// A strength exercise. The id is assigned when it is added to a draft.
    pub fn strength(name: impl Into<String>, sets: Vec<SetEntry>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            kind: ExerciseKind::Strength,
            sets,
            duration: None,
            distance: None,
            calories: None,
            rounds: None,
        }
    }

    /// A cardio or HIIT exercise with its required duration.
    pub fn timed(kind: ExerciseKind, name: impl Into<String>, duration: impl Into<Measure>) -> Self {
        Self {
            id: EntityId::default(),
            name: name.into(),
            kind,
            sets: Vec::new(),
            duration: Some(duration.into()),
            distance: None,
            calories: None,
            rounds: None,
        }
    }

    pub fn with_distance(mut self, distance: impl Into<Measure>) -> Self {
        self.distance = Some(distance.into());
        self
    }

    pub fn with_calories(mut self, calories: impl Into<Measure>) -> Self {
        self.calories = Some(calories.into());
        self
    }

    pub fn with_rounds(mut self, rounds: impl Into<Measure>) -> Self {
        self.rounds = Some(rounds.into());
        self
    }

    /// Strength exercises need at least one set, cardio and HIIT a duration.
    pub fn is_valid(&self) -> bool {
        if self.name.trim().is_empty() {
            return false;
        }
        match self.kind {
            ExerciseKind::Strength => !self.sets.is_empty(),
            ExerciseKind::Cardio | ExerciseKind::Hiit => self.duration.is_some(),
        }
    }

    /// Total repetitions across all sets; unparseable reps count as zero.
    pub fn total_reps(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| s.reps.as_f64().unwrap_or(0.0))
            .sum()
    }

    /// Sum of weight x reps across all sets.
    pub fn volume(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| s.weight.as_f64().unwrap_or(0.0) * s.reps.as_f64().unwrap_or(0.0))
            .sum()
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)?;
        match self.kind {
            ExerciseKind::Strength => {
                let sets: Vec<String> = self
                    .sets
                    .iter()
                    .map(|s| format!("{}x{}", s.weight, s.reps))
                    .collect();
                if !sets.is_empty() {
                    write!(f, ": {}", sets.join(", "))?;
                }
            }
            ExerciseKind::Cardio | ExerciseKind::Hiit => {
                if let Some(duration) = &self.duration {
                    write!(f, ": {}", duration)?;
                }
                if let Some(distance) = &self.distance {
                    write!(f, ", distance {}", distance)?;
                }
                if let Some(rounds) = &self.rounds {
                    write!(f, ", {} rounds", rounds)?;
                }
                if let Some(calories) = &self.calories {
                    write!(f, ", {} kcal", calories)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_is_strength() {
        let json = r#"{"id": 1, "name": "Squat", "sets": [{"weight": 100, "reps": "5"}]}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.kind, ExerciseKind::Strength);
        assert_eq!(exercise.sets.len(), 1);
    }

    #[test]
    fn test_cardio_fields() {
        let json = r#"{"id": 2, "name": "Run", "type": "cardio", "duration": "30", "distance": 5}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.kind, ExerciseKind::Cardio);
        assert!(exercise.sets.is_empty());
        assert!(exercise.is_valid());
    }

    #[test]
    fn test_validity_rules() {
        assert!(!Exercise::strength("Bench", vec![]).is_valid());
        assert!(Exercise::strength("Bench", vec![SetEntry::new(60, 8)]).is_valid());
        assert!(!Exercise::strength("  ", vec![SetEntry::new(60, 8)]).is_valid());

        let mut hiit = Exercise::timed(ExerciseKind::Hiit, "Tabata", 20);
        assert!(hiit.is_valid());
        hiit.duration = None;
        assert!(!hiit.is_valid());
    }

    #[test]
    fn test_volume_ignores_unparseable_values() {
        let exercise = Exercise::strength(
            "Deadlift",
            vec![
                SetEntry::new(100, 5),
                SetEntry::new("120", "3"),
                SetEntry::new("bodyweight", 10),
            ],
        );
        assert_eq!(exercise.total_reps(), 18.0);
        assert_eq!(exercise.volume(), 500.0 + 360.0);
    }

    #[test]
    fn test_display() {
        let exercise = Exercise::strength("Row", vec![SetEntry::new(40, 10)]);
        assert_eq!(exercise.to_string(), "Row (strength): 40x10");

        let run = Exercise::timed(ExerciseKind::Cardio, "Run", "25").with_distance(5);
        assert_eq!(run.to_string(), "Run (cardio): 25, distance 5");
    }
}
