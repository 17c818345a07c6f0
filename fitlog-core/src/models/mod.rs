mod exercise;
mod food;
mod meal_type;
mod measure;
mod routine;
mod stats;
mod workout;

pub use exercise::{Exercise, ExerciseKind, SetEntry};
pub use food::{FoodDay, FoodEntry, FoodStats, NewFoodItem};
pub use meal_type::MealType;
pub use measure::Measure;
pub use routine::Routine;
pub use stats::{HistoryEntry, WorkoutStats};
pub use workout::{DraftWorkout, Workout};
