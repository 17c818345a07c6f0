use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::exercise::SetEntry;

/// Lifetime training totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_workouts: usize,
    pub total_exercises: usize,
    pub total_sets: usize,
    pub total_reps: f64,
    /// Sum of weight x reps.
    pub total_volume: f64,
}

/// One past occurrence of an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub sets: Vec<SetEntry>,
}

impl fmt::Display for WorkoutStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workouts:  {}", self.total_workouts)?;
        writeln!(f, "Exercises: {}", self.total_exercises)?;
        writeln!(f, "Sets:      {}", self.total_sets)?;
        writeln!(f, "Reps:      {}", self.total_reps)?;
        write!(f, "Volume:    {}", self.total_volume)
    }
}
