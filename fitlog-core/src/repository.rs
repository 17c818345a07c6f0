//! Typed collections on top of a [`KeyValueStore`].
//!
//! Each collection is one document under its own key:
//!
//! | key              | contents                                   |
//! |------------------|--------------------------------------------|
//! | `currentWorkout` | the draft workout, absent when there is none |
//! | `workouts`       | finished workouts, most recent first       |
//! | `routines`       | routines in creation order                 |
//! | `foodDiary`      | one entry per calendar day with food logged |
//! | `meta.lastId`    | last id handed out                         |
//!
//! Every mutation is read-modify-write of the whole collection. Nothing here
//! returns an error: missing records come back as `None`/`false`/zeroed
//! totals, and storage failures are absorbed by the store and show up as a
//! `false` (or `None`) result.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::id::{self, EntityId};
use crate::models::{
    DraftWorkout, Exercise, FoodDay, FoodEntry, FoodStats, HistoryEntry, MealType, Measure,
    NewFoodItem, Routine, Workout, WorkoutStats,
};
use crate::snapshot::{SyncSnapshot, SNAPSHOT_VERSION};
use crate::store::KeyValueStore;

pub const DRAFT_KEY: &str = "currentWorkout";
pub const WORKOUTS_KEY: &str = "workouts";
pub const ROUTINES_KEY: &str = "routines";
pub const FOOD_DIARY_KEY: &str = "foodDiary";
const LAST_ID_KEY: &str = "meta.lastId";

pub struct DocumentRepository<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> DocumentRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn next_ids(&self, count: usize) -> Vec<EntityId> {
        let last = self.store.get::<i64>(LAST_ID_KEY);
        let ids = id::next_ids(last, self.clock.now().timestamp_millis(), count);
        if let Some(newest) = ids.last() {
            self.store.set(LAST_ID_KEY, &newest.value());
        }
        ids
    }

    fn next_id(&self) -> EntityId {
        self.next_ids(1).pop().unwrap_or_default()
    }

    /// Makes sure future ids sort after `ids`, e.g. after importing data.
    fn reserve_ids(&self, ids: impl Iterator<Item = EntityId>) {
        if let Some(max) = ids.map(|id| id.value()).max() {
            let last = self.store.get::<i64>(LAST_ID_KEY).unwrap_or(i64::MIN);
            if max > last {
                self.store.set(LAST_ID_KEY, &max);
            }
        }
    }

    // ==================== Draft ====================

    /// The draft, or `None` when no workout is in progress.
    pub fn draft(&self) -> Option<DraftWorkout> {
        self.store.get(DRAFT_KEY)
    }

    /// The draft, with an empty one standing in when none is in progress.
    pub fn current_draft(&self) -> DraftWorkout {
        self.draft().unwrap_or_default()
    }

    pub fn save_current_draft(&self, draft: &DraftWorkout) -> bool {
        self.store.set(DRAFT_KEY, draft)
    }

    pub fn discard_draft(&self) -> bool {
        self.store.remove(DRAFT_KEY)
    }

    /// Appends an exercise to the draft with a freshly assigned id.
    ///
    /// Returns `None` for an invalid exercise (blank name, strength without
    /// sets, cardio/HIIT without duration) or when the draft cannot be saved.
    pub fn add_exercise_to_draft(&self, mut exercise: Exercise) -> Option<Exercise> {
        if !exercise.is_valid() {
            return None;
        }

        exercise.id = self.next_id();
        let mut draft = self.current_draft();
        draft.exercises.push(exercise.clone());

        self.save_current_draft(&draft).then_some(exercise)
    }

    pub fn remove_exercise_from_draft(&self, exercise_id: EntityId) -> bool {
        let Some(mut draft) = self.draft() else {
            return false;
        };

        let before = draft.exercises.len();
        draft.exercises.retain(|e| e.id != exercise_id);
        if draft.exercises.len() == before {
            return false;
        }

        self.save_current_draft(&draft)
    }

    /// Turns the draft into a workout.
    ///
    /// Returns `false` without touching anything when the draft is empty.
    pub fn finish_workout(&self) -> bool {
        self.finalize_draft(None)
    }

    /// Like [`finish_workout`](Self::finish_workout), recording how long the session took.
    pub fn finish_workout_with_duration(&self, duration: impl Into<Measure>) -> bool {
        self.finalize_draft(Some(duration.into()))
    }

    fn finalize_draft(&self, duration: Option<Measure>) -> bool {
        let draft = self.current_draft();
        if draft.is_empty() {
            return false;
        }

        let workout = Workout {
            id: self.next_id(),
            date: self.clock.now(),
            exercises: draft.exercises,
            duration,
        };
        let workout_id = workout.id;

        let previous = self.all_workouts();
        let mut workouts = previous.clone();
        workouts.insert(0, workout);
        if !self.store.set(WORKOUTS_KEY, &workouts) {
            return false;
        }

        // A draft left behind would be logged again by the next finish
        if !self.store.remove(DRAFT_KEY) {
            tracing::error!("Draft not cleared, dropping workout {}", workout_id);
            self.store.set(WORKOUTS_KEY, &previous);
            return false;
        }

        tracing::debug!("Finished workout {}", workout_id);
        true
    }

    // ==================== Workouts ====================

    /// All finished workouts, most recent first.
    pub fn all_workouts(&self) -> Vec<Workout> {
        self.store.get(WORKOUTS_KEY).unwrap_or_default()
    }

    pub fn workout(&self, id: EntityId) -> Option<Workout> {
        self.all_workouts().into_iter().find(|w| w.id == id)
    }

    pub fn delete_workout(&self, id: EntityId) -> bool {
        let mut workouts = self.all_workouts();
        let before = workouts.len();
        workouts.retain(|w| w.id != id);
        if workouts.len() == before {
            return false;
        }

        self.store.set(WORKOUTS_KEY, &workouts)
    }

    /// Every past occurrence of an exercise, matched case-insensitively,
    /// most recent first.
    pub fn exercise_history(&self, name: &str) -> Vec<HistoryEntry> {
        let needle = name.trim().to_lowercase();
        let mut history: Vec<HistoryEntry> = self
            .all_workouts()
            .into_iter()
            .flat_map(|workout| {
                let date = workout.date;
                let needle = &needle;
                workout
                    .exercises
                    .into_iter()
                    .filter(move |e| e.name.trim().to_lowercase() == *needle)
                    .map(move |e| HistoryEntry { date, sets: e.sets })
            })
            .collect();

        history.sort_by(|a, b| b.date.cmp(&a.date));
        history
    }

    pub fn stats(&self) -> WorkoutStats {
        self.all_workouts()
            .iter()
            .fold(WorkoutStats::default(), |mut acc, workout| {
                acc.total_workouts += 1;
                acc.total_exercises += workout.exercises.len();
                for exercise in &workout.exercises {
                    acc.total_sets += exercise.sets.len();
                    acc.total_reps += exercise.total_reps();
                    acc.total_volume += exercise.volume();
                }
                acc
            })
    }

    // ==================== Routines ====================

    /// All routines in creation order.
    pub fn all_routines(&self) -> Vec<Routine> {
        self.store.get(ROUTINES_KEY).unwrap_or_default()
    }

    pub fn routine(&self, id: EntityId) -> Option<Routine> {
        self.all_routines().into_iter().find(|r| r.id == id)
    }

    /// Saves a routine. Returns `None` for a blank name.
    pub fn save_routine(&self, name: &str, exercises: Vec<Exercise>) -> Option<Routine> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let routine = Routine {
            id: self.next_id(),
            name: name.to_string(),
            exercises,
            created_at: self.clock.now(),
        };

        let mut routines = self.all_routines();
        routines.push(routine.clone());

        self.store.set(ROUTINES_KEY, &routines).then_some(routine)
    }

    pub fn delete_routine(&self, id: EntityId) -> bool {
        let mut routines = self.all_routines();
        let before = routines.len();
        routines.retain(|r| r.id != id);
        if routines.len() == before {
            return false;
        }

        self.store.set(ROUTINES_KEY, &routines)
    }

    /// Replaces the draft with a copy of a routine's exercises.
    ///
    /// Every exercise gets a new id, so the draft never shares identity with
    /// the routine. Returns `None` and leaves the draft alone if the routine
    /// does not exist.
    pub fn load_routine(&self, id: EntityId) -> Option<DraftWorkout> {
        let routine = self.routine(id)?;
        let ids = self.next_ids(routine.exercises.len());

        let exercises = routine
            .exercises
            .iter()
            .zip(ids)
            .map(|(exercise, id)| Exercise {
                id,
                ..exercise.clone()
            })
            .collect();
        let draft = DraftWorkout::new(exercises);

        self.save_current_draft(&draft).then_some(draft)
    }

    // ==================== Food diary ====================

    /// All days with food logged.
    pub fn all_food_days(&self) -> Vec<FoodDay> {
        self.store.get(FOOD_DIARY_KEY).unwrap_or_default()
    }

    pub fn food_day(&self, date: NaiveDate) -> Option<FoodDay> {
        self.all_food_days().into_iter().find(|d| d.date == date)
    }

    /// Logs a food item against today, creating the day if needed.
    ///
    /// Macro values are coerced to integers; anything unparseable counts as 0.
    pub fn add_food_item(&self, meal_type: MealType, item: NewFoodItem) -> Option<FoodEntry> {
        let today = self.clock.today();
        let entry = FoodEntry {
            id: self.next_id(),
            meal_type,
            name: item.name.trim().to_string(),
            calories: item.calories.to_int_or_zero(),
            protein: item.protein.to_int_or_zero(),
            carbs: item.carbs.to_int_or_zero(),
            fats: item.fats.to_int_or_zero(),
            time: self.clock.now(),
        };

        let mut diary = self.all_food_days();
        match diary.iter_mut().find(|d| d.date == today) {
            Some(day) => day.meals.push(entry.clone()),
            None => {
                let mut day = FoodDay::new(today);
                day.meals.push(entry.clone());
                diary.push(day);
            }
        }

        self.store.set(FOOD_DIARY_KEY, &diary).then_some(entry)
    }

    /// Removes a food entry from whichever day holds it. A day left without
    /// entries is removed as well.
    pub fn delete_food_item(&self, id: EntityId) -> bool {
        let mut diary = self.all_food_days();
        let mut removed = false;
        for day in diary.iter_mut() {
            let before = day.meals.len();
            day.meals.retain(|m| m.id != id);
            removed |= day.meals.len() != before;
        }
        if !removed {
            return false;
        }

        diary.retain(|d| !d.meals.is_empty());
        self.store.set(FOOD_DIARY_KEY, &diary)
    }

    /// Macro totals for `date`, today when `None`.
    pub fn food_stats(&self, date: Option<NaiveDate>) -> FoodStats {
        let date = date.unwrap_or_else(|| self.clock.today());
        self.food_day(date)
            .map(|day| day.stats())
            .unwrap_or_default()
    }

    // ==================== Whole state ====================

    pub fn export_snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            sync_date: self.clock.now(),
            workouts: self.all_workouts(),
            routines: self.all_routines(),
            current_workout: self.draft(),
            food_diary: self.all_food_days(),
        }
    }

    /// Replaces all local state with the snapshot. Nothing is merged.
    pub fn import_snapshot(&self, snapshot: &SyncSnapshot) -> bool {
        let mut ok = self.store.set(WORKOUTS_KEY, &snapshot.workouts);
        ok &= self.store.set(ROUTINES_KEY, &snapshot.routines);
        ok &= self.store.set(FOOD_DIARY_KEY, &snapshot.food_diary);
        ok &= match &snapshot.current_workout {
            Some(draft) => self.save_current_draft(draft),
            None => self.discard_draft(),
        };

        let workout_ids = snapshot.workouts.iter().flat_map(|w| {
            std::iter::once(w.id).chain(w.exercises.iter().map(|e| e.id))
        });
        let routine_ids = snapshot.routines.iter().flat_map(|r| {
            std::iter::once(r.id).chain(r.exercises.iter().map(|e| e.id))
        });
        let draft_ids = snapshot
            .current_workout
            .iter()
            .flat_map(|d| d.exercises.iter().map(|e| e.id));
        let food_ids = snapshot
            .food_diary
            .iter()
            .flat_map(|d| d.meals.iter().map(|m| m.id));
        self.reserve_ids(workout_ids.chain(routine_ids).chain(draft_ids).chain(food_ids));

        ok
    }

    /// Removes every collection and the draft.
    pub fn clear_all(&self) -> bool {
        [DRAFT_KEY, WORKOUTS_KEY, ROUTINES_KEY, FOOD_DIARY_KEY]
            .iter()
            .fold(true, |ok, key| self.store.remove(key) && ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{ExerciseKind, SetEntry};
    use crate::store::MemoryStore;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashSet;

    fn start() -> DateTime<Utc> {
        "2025-03-10T09:00:00Z".parse().unwrap()
    }

    fn test_repo() -> (DocumentRepository<MemoryStore>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start()));
        let repo = DocumentRepository::with_clock(MemoryStore::new(), clock.clone());
        (repo, clock)
    }

    fn bench(weight: i32, reps: i32) -> Exercise {
        Exercise::strength("Bench Press", vec![SetEntry::new(weight, reps)])
    }

    fn log_workout(repo: &DocumentRepository<MemoryStore>, exercise: Exercise) {
        repo.add_exercise_to_draft(exercise).unwrap();
        assert!(repo.finish_workout());
    }

    #[test]
    fn test_current_draft_defaults_to_empty() {
        let (repo, _clock) = test_repo();
        assert!(repo.draft().is_none());
        assert_eq!(repo.current_draft(), DraftWorkout::default());
    }

    #[test]
    fn test_save_draft_roundtrip() {
        let (repo, _clock) = test_repo();
        let mut run = Exercise::timed(ExerciseKind::Cardio, "Run", "30").with_distance(5.2);
        run.id = EntityId::new(11);
        let mut squat = Exercise::strength(
            "Squat",
            vec![SetEntry::new(100, 5), SetEntry::new("102.5", "5")],
        );
        squat.id = EntityId::new(12);
        let draft = DraftWorkout::new(vec![squat, run]);

        assert!(repo.save_current_draft(&draft));
        assert_eq!(repo.current_draft(), draft);
    }

    #[test]
    fn test_add_exercise_rejects_invalid() {
        let (repo, _clock) = test_repo();

        assert!(repo
            .add_exercise_to_draft(Exercise::strength("Squat", vec![]))
            .is_none());
        let mut cardio = Exercise::timed(ExerciseKind::Cardio, "Bike", 20);
        cardio.duration = None;
        assert!(repo.add_exercise_to_draft(cardio).is_none());
        assert!(repo.draft().is_none());
    }

    #[test]
    fn test_add_and_remove_exercise() {
        let (repo, _clock) = test_repo();
        let first = repo.add_exercise_to_draft(bench(60, 10)).unwrap();
        let second = repo.add_exercise_to_draft(bench(70, 8)).unwrap();
        assert_ne!(first.id, second.id);

        assert!(repo.remove_exercise_from_draft(first.id));
        assert!(!repo.remove_exercise_from_draft(first.id));
        assert_eq!(repo.current_draft().exercises, vec![second]);
    }

    #[test]
    fn test_finish_empty_draft_returns_false() {
        let (repo, _clock) = test_repo();
        log_workout(&repo, bench(60, 10));
        let before = repo.all_workouts();

        assert!(!repo.finish_workout());
        assert_eq!(repo.all_workouts(), before);
    }

    #[test]
    fn test_finish_workout_prepends_and_clears_draft() {
        let (repo, clock) = test_repo();
        log_workout(&repo, bench(60, 10));

        clock.advance(Duration::days(1));
        let exercise = repo.add_exercise_to_draft(bench(65, 10)).unwrap();
        assert!(repo.finish_workout_with_duration("50 min"));

        let workouts = repo.all_workouts();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].exercises, vec![exercise]);
        assert_eq!(workouts[0].date, start() + Duration::days(1));
        assert_eq!(workouts[0].duration, Some(Measure::from("50 min")));
        assert_eq!(repo.current_draft(), DraftWorkout::default());
        assert!(repo.draft().is_none());
    }

    #[test]
    fn test_workout_lookup_and_delete() {
        let (repo, _clock) = test_repo();
        log_workout(&repo, bench(60, 10));
        log_workout(&repo, bench(62, 10));
        let id = repo.all_workouts()[1].id;

        assert_eq!(repo.workout(id).map(|w| w.id), Some(id));
        assert!(repo.delete_workout(id));
        assert!(repo.workout(id).is_none());
        assert_eq!(repo.all_workouts().len(), 1);
        assert!(!repo.delete_workout(id));
        assert!(!repo.delete_workout(EntityId::new(1)));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let (repo, _clock) = test_repo();
        let mut ids = HashSet::new();
        for _ in 0..20 {
            let exercise = repo.add_exercise_to_draft(bench(50, 5)).unwrap();
            assert!(ids.insert(exercise.id));
        }
    }

    #[test]
    fn test_save_routine_requires_name() {
        let (repo, _clock) = test_repo();
        assert!(repo.save_routine("   ", vec![bench(60, 10)]).is_none());
        assert!(repo.all_routines().is_empty());
    }

    #[test]
    fn test_routines_append_in_creation_order() {
        let (repo, _clock) = test_repo();
        let push = repo.save_routine("Push", vec![bench(60, 10)]).unwrap();
        let pull = repo.save_routine("Pull", vec![]).unwrap();

        let names: Vec<String> = repo.all_routines().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Push", "Pull"]);

        assert!(repo.delete_routine(push.id));
        assert!(!repo.delete_routine(push.id));
        assert_eq!(repo.routine(pull.id).map(|r| r.name), Some("Pull".to_string()));
    }

    #[test]
    fn test_load_routine_deep_copies_with_new_ids() {
        let (repo, _clock) = test_repo();
        let a = repo.add_exercise_to_draft(bench(60, 10)).unwrap();
        let b = repo
            .add_exercise_to_draft(Exercise::strength(
                "Row",
                vec![SetEntry::new(40, 12), SetEntry::new("45", "10")],
            ))
            .unwrap();
        let c = repo
            .add_exercise_to_draft(Exercise::timed(ExerciseKind::Hiit, "Burpees", "10"))
            .unwrap();
        let routine = repo.save_routine("Full body", vec![a, b, c]).unwrap();
        repo.discard_draft();

        let draft = repo.load_routine(routine.id).unwrap();
        assert_eq!(draft.exercises.len(), routine.exercises.len());
        assert_eq!(repo.current_draft(), draft);

        let original_ids: HashSet<EntityId> = routine.exercises.iter().map(|e| e.id).collect();
        let new_ids: HashSet<EntityId> = draft.exercises.iter().map(|e| e.id).collect();
        assert_eq!(new_ids.len(), draft.exercises.len());
        assert!(new_ids.is_disjoint(&original_ids));

        for (copy, original) in draft.exercises.iter().zip(&routine.exercises) {
            assert_eq!(copy.name, original.name);
            assert_eq!(copy.kind, original.kind);
            assert_eq!(copy.sets, original.sets);
            assert_eq!(copy.duration, original.duration);
        }

        // Editing the draft leaves the stored routine untouched
        let mut edited = draft.clone();
        edited.exercises[1].sets[0].weight = Measure::from(999);
        repo.save_current_draft(&edited);
        assert_eq!(repo.routine(routine.id).unwrap(), routine);
    }

    #[test]
    fn test_load_unknown_routine_leaves_draft() {
        let (repo, _clock) = test_repo();
        repo.add_exercise_to_draft(bench(60, 10)).unwrap();
        let before = repo.current_draft();

        assert!(repo.load_routine(EntityId::new(404)).is_none());
        assert_eq!(repo.current_draft(), before);
    }

    #[test]
    fn test_exercise_history_case_insensitive_most_recent_first() {
        let (repo, clock) = test_repo();
        for (name, weight) in [("bench press", 60), ("Bench Press", 65), ("BENCH PRESS", 70)] {
            repo.add_exercise_to_draft(Exercise::strength(
                name,
                vec![SetEntry::new(weight, 5)],
            ))
            .unwrap();
            repo.add_exercise_to_draft(Exercise::strength("Squat", vec![SetEntry::new(100, 5)]))
                .unwrap();
            assert!(repo.finish_workout());
            clock.advance(Duration::days(2));
        }

        let history = repo.exercise_history("Bench Press");
        assert_eq!(history.len(), 3);
        let weights: Vec<Measure> = history.iter().map(|h| h.sets[0].weight.clone()).collect();
        assert_eq!(
            weights,
            vec![Measure::from(70), Measure::from(65), Measure::from(60)]
        );
        assert!(history[0].date > history[1].date);

        assert!(repo.exercise_history("Deadlift").is_empty());
    }

    #[test]
    fn test_stats_empty() {
        let (repo, _clock) = test_repo();
        assert_eq!(repo.stats(), WorkoutStats::default());
    }

    #[test]
    fn test_stats_totals() {
        let (repo, _clock) = test_repo();
        repo.add_exercise_to_draft(Exercise::strength(
            "Squat",
            vec![SetEntry::new(100, 5), SetEntry::new("100", "5")],
        ))
        .unwrap();
        repo.add_exercise_to_draft(Exercise::timed(ExerciseKind::Cardio, "Run", 20))
            .unwrap();
        assert!(repo.finish_workout());
        log_workout(&repo, bench(60, 10));

        let stats = repo.stats();
        assert_eq!(stats.total_workouts, 2);
        assert_eq!(stats.total_exercises, 3);
        assert_eq!(stats.total_sets, 3);
        assert_eq!(stats.total_reps, 20.0);
        assert_eq!(stats.total_volume, 1000.0 + 600.0);
    }

    #[test]
    fn test_food_stats_sum_entries() {
        let (repo, _clock) = test_repo();
        repo.add_food_item(MealType::Breakfast, NewFoodItem::new("Oats", 350, 12, 60, 6))
            .unwrap();
        repo.add_food_item(
            MealType::Lunch,
            NewFoodItem::new("Chicken", "420", "45.6", "0", "11g"),
        )
        .unwrap();
        repo.add_food_item(MealType::Dinner, NewFoodItem::new("Mystery", "lots", "", 3, 1))
            .unwrap();

        let stats = repo.food_stats(None);
        assert_eq!(
            stats,
            FoodStats {
                calories: 770,
                protein: 57,
                carbs: 63,
                fats: 18,
            }
        );
        assert_eq!(repo.all_food_days().len(), 1);
        assert_eq!(repo.food_day(start().date_naive()).unwrap().meals.len(), 3);
    }

    #[test]
    fn test_food_items_group_by_day() {
        let (repo, clock) = test_repo();
        repo.add_food_item(MealType::Breakfast, NewFoodItem::new("Eggs", 200, 14, 1, 15))
            .unwrap();
        clock.advance(Duration::hours(3));
        repo.add_food_item(MealType::Lunch, NewFoodItem::new("Rice", 300, 6, 65, 1))
            .unwrap();
        clock.advance(Duration::days(1));
        repo.add_food_item(MealType::Dinner, NewFoodItem::new("Fish", 250, 30, 0, 12))
            .unwrap();

        let days = repo.all_food_days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].meals.len(), 2);
        assert_eq!(repo.food_stats(Some(start().date_naive())).calories, 500);
        assert_eq!(repo.food_stats(None).calories, 250);
    }

    #[test]
    fn test_food_stats_empty_day() {
        let (repo, _clock) = test_repo();
        assert_eq!(repo.food_stats(None), FoodStats::default());
        let other = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(repo.food_stats(Some(other)), FoodStats::default());
    }

    #[test]
    fn test_delete_food_item_prunes_empty_day() {
        let (repo, _clock) = test_repo();
        let a = repo
            .add_food_item(MealType::Breakfast, NewFoodItem::new("Toast", 150, 5, 25, 2))
            .unwrap();
        let b = repo
            .add_food_item(MealType::Postworkout, NewFoodItem::new("Shake", 200, 30, 10, 3))
            .unwrap();

        assert!(repo.delete_food_item(a.id));
        assert_eq!(repo.food_stats(None).calories, 200);
        assert!(!repo.delete_food_item(a.id));

        assert!(repo.delete_food_item(b.id));
        assert!(repo.all_food_days().is_empty());
        assert_eq!(repo.food_stats(None), FoodStats::default());
    }

    #[test]
    fn test_corrupt_collection_falls_back_to_empty() {
        let (repo, _clock) = test_repo();
        repo.store().write(WORKOUTS_KEY, "{\"broken\":").unwrap();

        assert!(repo.all_workouts().is_empty());
        assert_eq!(repo.stats(), WorkoutStats::default());

        // The next write replaces the corrupt document
        log_workout(&repo, bench(60, 10));
        assert_eq!(repo.all_workouts().len(), 1);
    }

    #[test]
    fn test_legacy_same_millisecond_ids_stay_distinct() {
        let (repo, _clock) = test_repo();
        let legacy = r#"{"exercises": [
            {"id": 1700000000000.12, "name": "Squat", "type": "strength",
             "sets": [{"weight": 100, "reps": 5}]},
            {"id": 1700000000000.87, "name": "Lunge", "type": "strength",
             "sets": [{"weight": 20, "reps": 10}]}]}"#;
        repo.store().write(DRAFT_KEY, legacy).unwrap();

        let exercises = repo.current_draft().exercises;
        assert_ne!(exercises[0].id, exercises[1].id);

        assert!(repo.remove_exercise_from_draft(exercises[0].id));
        let left = repo.current_draft().exercises;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Lunge");
        assert_eq!(left[0].id.to_string(), "1700000000000.87");

        // New ids never land on a legacy one
        let fresh = repo.add_exercise_to_draft(bench(60, 10)).unwrap();
        assert!(!fresh.id.is_legacy());
        assert_ne!(fresh.id, left[0].id);

        // Saving writes the legacy id back unchanged
        let raw = repo.store().read(DRAFT_KEY).unwrap().unwrap();
        assert!(raw.contains("1700000000000.87"));
    }

    #[test]
    fn test_huge_food_values_do_not_overflow_totals() {
        let (repo, _clock) = test_repo();
        repo.add_food_item(MealType::Lunch, NewFoodItem::new("Feast", 1e300, 0, 0, 0))
            .unwrap();
        repo.add_food_item(
            MealType::Dinner,
            NewFoodItem::new("Feast", "9223372036854775807", 0, 0, 0),
        )
        .unwrap();

        assert_eq!(repo.food_stats(None).calories, i64::MAX);
    }

    /// Memory store whose deletes always fail.
    struct UndeletableStore(MemoryStore);

    impl KeyValueStore for UndeletableStore {
        fn read(&self, key: &str) -> Result<Option<String>, crate::store::StoreError> {
            self.0.read(key)
        }

        fn write(&self, key: &str, value: &str) -> Result<(), crate::store::StoreError> {
            self.0.write(key, value)
        }

        fn delete(&self, key: &str) -> Result<(), crate::store::StoreError> {
            Err(crate::store::StoreError::Io(
                key.into(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    #[test]
    fn test_finish_fails_when_draft_cannot_be_cleared() {
        let clock = Arc::new(FixedClock::new(start()));
        let repo = DocumentRepository::with_clock(UndeletableStore(MemoryStore::new()), clock);
        repo.add_exercise_to_draft(bench(60, 10)).unwrap();

        assert!(!repo.finish_workout());
        assert!(repo.all_workouts().is_empty());
        assert_eq!(repo.current_draft().exercises.len(), 1);

        // Retrying does not log the same session twice
        assert!(!repo.finish_workout());
        assert!(repo.all_workouts().is_empty());
    }

    #[test]
    fn test_legacy_exercise_without_type_is_strength() {
        let (repo, _clock) = test_repo();
        let legacy = r#"[{"id": 1700000000000, "date": "2023-11-14T22:13:20Z",
            "exercises": [{"id": 1700000000000.37, "name": "Curl",
                           "sets": [{"weight": "12", "reps": 10}]}]}]"#;
        repo.store().write(WORKOUTS_KEY, legacy).unwrap();

        let workouts = repo.all_workouts();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].exercises[0].kind, ExerciseKind::Strength);
        assert_eq!(repo.stats().total_volume, 120.0);
    }

    #[test]
    fn test_export_import_replaces_everything() {
        let (source, _clock) = test_repo();
        log_workout(&source, bench(60, 10));
        source.save_routine("Push", vec![bench(60, 10)]).unwrap();
        source
            .add_food_item(MealType::Lunch, NewFoodItem::new("Salad", 150, 4, 10, 9))
            .unwrap();
        let snapshot = source.export_snapshot();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.current_workout.is_none());

        let (target, _clock) = test_repo();
        target.add_exercise_to_draft(bench(1, 1)).unwrap();
        target.save_routine("Legacy", vec![]).unwrap();

        assert!(target.import_snapshot(&snapshot));
        assert_eq!(target.all_workouts(), source.all_workouts());
        assert_eq!(target.all_routines(), source.all_routines());
        assert_eq!(target.all_food_days(), source.all_food_days());
        assert!(target.draft().is_none());

        // Ids issued after an import never collide with imported ones
        let imported_max = snapshot
            .food_diary
            .iter()
            .flat_map(|d| d.meals.iter().map(|m| m.id))
            .chain(snapshot.routines.iter().map(|r| r.id))
            .max()
            .unwrap();
        let fresh = target.add_exercise_to_draft(bench(5, 5)).unwrap();
        assert!(fresh.id > imported_max);
    }

    #[test]
    fn test_clear_all() {
        let (repo, _clock) = test_repo();
        log_workout(&repo, bench(60, 10));
        repo.add_exercise_to_draft(bench(60, 10)).unwrap();

        assert!(repo.clear_all());
        assert!(repo.all_workouts().is_empty());
        assert!(repo.draft().is_none());
    }
}
