use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::meal_type::MealType;
use super::measure::Measure;
use crate::id::EntityId;

/// One logged food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: EntityId,
    pub meal_type: MealType,
    pub name: String,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
    pub time: DateTime<Utc>,
}

/// All food entries logged on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodDay {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: Vec<FoodEntry>,
}

impl FoodDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            meals: Vec::new(),
        }
    }

    pub fn stats(&self) -> FoodStats {
        self.meals.iter().fold(FoodStats::default(), |mut acc, m| {
            acc.calories = acc.calories.saturating_add(m.calories);
            acc.protein = acc.protein.saturating_add(m.protein);
            acc.carbs = acc.carbs.saturating_add(m.carbs);
            acc.fats = acc.fats.saturating_add(m.fats);
            acc
        })
    }

    pub fn entries_for(&self, meal_type: MealType) -> impl Iterator<Item = &FoodEntry> {
        self.meals.iter().filter(move |m| m.meal_type == meal_type)
    }
}

/// Food item as entered, before numbers are coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFoodItem {
    pub name: String,
    pub calories: Measure,
    pub protein: Measure,
    pub carbs: Measure,
    pub fats: Measure,
}

impl NewFoodItem {
    pub fn new(
        name: impl Into<String>,
        calories: impl Into<Measure>,
        protein: impl Into<Measure>,
        carbs: impl Into<Measure>,
        fats: impl Into<Measure>,
    ) -> Self {
        Self {
            name: name.into(),
            calories: calories.into(),
            protein: protein.into(),
            carbs: carbs.into(),
            fats: fats.into(),
        }
    }
}

/// Macro totals for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FoodStats {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
}

impl fmt::Display for FoodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} kcal, P {}g, C {}g, F {}g ({})",
            self.meal_type, self.name, self.calories, self.protein, self.carbs, self.fats, self.id
        )
    }
}

impl fmt::Display for FoodStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} kcal, protein {}g, carbs {}g, fats {}g",
            self.calories, self.protein, self.carbs, self.fats
        )
    }
}

/// Serializes a calendar day as `YYYY-MM-DD`.
///
/// Also accepts full RFC 3339 timestamps, which older diaries stored, and
/// keeps their date in the local time zone, the same day "today" uses.
mod calendar_date {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
            return Ok(dt.with_timezone(&Local).date_naive());
        }
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
