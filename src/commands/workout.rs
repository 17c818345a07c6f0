use clap::{Args, Subcommand};
use fitlog_core::{EntityId, Exercise, ExerciseKind, SetEntry};

use super::{parse_measure, OutputFormat};
use crate::sync::Repository;

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// Add an exercise to the current workout
    Add {
        /// Exercise name
        name: String,

        /// Exercise type (strength, cardio, hiit)
        #[arg(long = "type", short = 't', value_name = "TYPE", default_value = "strength")]
        kind: ExerciseKind,

        /// Strength set as WEIGHTxREPS (can be repeated)
        #[arg(long = "set", short = 's', value_name = "WEIGHTxREPS")]
        sets: Vec<String>,

        /// Duration for cardio/HIIT
        #[arg(long)]
        duration: Option<String>,

        /// Distance for cardio
        #[arg(long)]
        distance: Option<String>,

        /// Calories burned
        #[arg(long)]
        calories: Option<String>,

        /// Rounds for HIIT
        #[arg(long)]
        rounds: Option<String>,
    },

    /// Remove an exercise from the current workout
    Remove {
        /// Exercise ID
        id: EntityId,
    },

    /// Show the current (unfinished) workout
    Current {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Finish the current workout and save it
    Finish {
        /// Session duration to record
        #[arg(long)]
        duration: Option<String>,
    },

    /// Throw away the current workout
    Discard,

    /// List finished workouts, most recent first
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Show at most this many workouts
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show a finished workout
    Show {
        id: EntityId,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a finished workout
    Delete {
        id: EntityId,
    },

    /// Show every logged occurrence of an exercise
    History {
        /// Exercise name (case-insensitive)
        name: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show lifetime training totals
    Stats {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl WorkoutCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WorkoutSubcommand::Add {
                name,
                kind,
                sets,
                duration,
                distance,
                calories,
                rounds,
            } => {
                let exercise = build_exercise(
                    name,
                    *kind,
                    sets,
                    duration.as_deref(),
                    distance.as_deref(),
                    calories.as_deref(),
                    rounds.as_deref(),
                )?;
                let added = repo.add_exercise_to_draft(exercise).ok_or_else(|| match kind {
                    ExerciseKind::Strength => {
                        "A strength exercise needs a name and at least one --set".to_string()
                    }
                    _ => format!("A {} exercise needs a name and --duration", kind),
                })?;
                println!("Added {} ({})", added, added.id);
                Ok(())
            }

            WorkoutSubcommand::Remove { id } => {
                if !repo.remove_exercise_from_draft(*id) {
                    return Err(format!("Exercise not in current workout: {}", id).into());
                }
                println!("Removed exercise {}", id);
                Ok(())
            }

            WorkoutSubcommand::Current { format } => {
                let draft = repo.current_draft();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&draft)?),
                    OutputFormat::Text => {
                        if draft.is_empty() {
                            println!("No workout in progress.");
                        } else {
                            println!("Current workout");
                            println!("{}", "=".repeat(30));
                            for exercise in &draft.exercises {
                                println!("  {}  {}", exercise.id, exercise);
                            }
                        }
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Finish { duration } => {
                let finished = match duration {
                    Some(d) => repo.finish_workout_with_duration(parse_measure(d)),
                    None => repo.finish_workout(),
                };
                if !finished {
                    return Err("No exercises in the current workout".into());
                }
                if let Some(workout) = repo.all_workouts().first() {
                    println!("Saved workout {}", workout.id);
                }
                Ok(())
            }

            WorkoutSubcommand::Discard => {
                if repo.draft().is_none() {
                    println!("No workout in progress.");
                    return Ok(());
                }
                if !repo.discard_draft() {
                    return Err("Failed to discard the current workout".into());
                }
                println!("Discarded current workout");
                Ok(())
            }

            WorkoutSubcommand::List { format, limit } => {
                let mut workouts = repo.all_workouts();
                if let Some(limit) = limit {
                    workouts.truncate(*limit);
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workouts)?);
                    }
                    OutputFormat::Text => {
                        if workouts.is_empty() {
                            println!("No workouts found.");
                            return Ok(());
                        }
                        println!("{:<15} {:<17} {:>9}", "ID", "DATE", "EXERCISES");
                        println!("{}", "-".repeat(43));
                        for workout in &workouts {
                            println!(
                                "{:<15} {:<17} {:>9}",
                                workout.id,
                                workout.date.format("%Y-%m-%d %H:%M"),
                                workout.exercises.len()
                            );
                        }
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Show { id, format } => {
                let workout = repo
                    .workout(*id)
                    .ok_or_else(|| format!("Workout not found: {}", id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&workout)?),
                    OutputFormat::Text => print!("{}", workout),
                }
                Ok(())
            }

            WorkoutSubcommand::Delete { id } => {
                if !repo.delete_workout(*id) {
                    return Err(format!("Workout not found: {}", id).into());
                }
                println!("Deleted workout {}", id);
                Ok(())
            }

            WorkoutSubcommand::History { name, format } => {
                let history = repo.exercise_history(name);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
                    OutputFormat::Text => {
                        if history.is_empty() {
                            println!("No history for '{}'.", name);
                            return Ok(());
                        }
                        for entry in &history {
                            let sets: Vec<String> = entry
                                .sets
                                .iter()
                                .map(|s| format!("{}x{}", s.weight, s.reps))
                                .collect();
                            println!("{}  {}", entry.date.format("%Y-%m-%d"), sets.join(", "));
                        }
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Stats { format } => {
                let stats = repo.stats();
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                    OutputFormat::Text => println!("{}", stats),
                }
                Ok(())
            }
        }
    }
}

fn build_exercise(
    name: &str,
    kind: ExerciseKind,
    sets: &[String],
    duration: Option<&str>,
    distance: Option<&str>,
    calories: Option<&str>,
    rounds: Option<&str>,
) -> Result<Exercise, String> {
    let mut exercise = match kind {
        ExerciseKind::Strength => {
            let sets = sets
                .iter()
                .map(|s| parse_set(s))
                .collect::<Result<Vec<_>, _>>()?;
            Exercise::strength(name, sets)
        }
        _ => Exercise::timed(kind, name, duration.map(parse_measure).ok_or_else(|| {
            format!("--duration is required for {} exercises", kind)
        })?),
    };

    if let Some(distance) = distance {
        exercise = exercise.with_distance(parse_measure(distance));
    }
    if let Some(calories) = calories {
        exercise = exercise.with_calories(parse_measure(calories));
    }
    if let Some(rounds) = rounds {
        exercise = exercise.with_rounds(parse_measure(rounds));
    }
    Ok(exercise)
}

/// Parses `WEIGHTxREPS`, e.g. `60x8` or `bodyweightx12`.
fn parse_set(value: &str) -> Result<SetEntry, String> {
    let (weight, reps) = value
        .rsplit_once(['x', 'X'])
        .ok_or_else(|| format!("Invalid set '{}'. Use WEIGHTxREPS, e.g. 60x8.", value))?;
    if reps.trim().is_empty() {
        return Err(format!("Invalid set '{}'. Reps missing.", value));
    }
    Ok(SetEntry::new(parse_measure(weight), parse_measure(reps)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitlog_core::Measure;

    #[test]
    fn test_parse_set() {
        let set = parse_set("60x8").unwrap();
        assert_eq!(set.weight, Measure::from(60));
        assert_eq!(set.reps, Measure::from(8));

        let set = parse_set("bodyweightx12").unwrap();
        assert_eq!(set.weight, Measure::from("bodyweight"));

        assert!(parse_set("60").is_err());
        assert!(parse_set("60x").is_err());
    }

    #[test]
    fn test_build_cardio_requires_duration() {
        let err = build_exercise("Run", ExerciseKind::Cardio, &[], None, None, None, None);
        assert!(err.is_err());

        let run = build_exercise(
            "Run",
            ExerciseKind::Cardio,
            &[],
            Some("25"),
            Some("5"),
            None,
            None,
        )
        .unwrap();
        assert!(run.is_valid());
        assert_eq!(run.distance, Some(Measure::from(5)));
    }
}
