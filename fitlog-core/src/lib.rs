//! FitLog Core Library
//!
//! Local-first storage for workouts, routines and the food diary, plus
//! optional backup to a cloud drive.

pub mod clock;
pub mod id;
pub mod models;
pub mod repository;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use clock::{Clock, FixedClock, SystemClock};
pub use id::{EntityId, EntityIdError};
pub use models::{
    DraftWorkout, Exercise, ExerciseKind, FoodDay, FoodEntry, FoodStats, HistoryEntry, MealType,
    Measure, NewFoodItem, Routine, SetEntry, Workout, WorkoutStats,
};
pub use repository::DocumentRepository;
pub use snapshot::{SnapshotError, SyncSnapshot, SNAPSHOT_VERSION};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use sync::{
    AuthError, AutoSyncOutcome, ConnectionState, DriveConfig, OAuthConfig, RemoteSyncEngine,
    SyncCredentialManager, SyncError, SyncStatus,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
