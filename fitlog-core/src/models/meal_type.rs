use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slot of the day a food entry is logged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Midmorning,
    Lunch,
    Preworkout,
    Postworkout,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::Midmorning,
        MealType::Lunch,
        MealType::Preworkout,
        MealType::Postworkout,
        MealType::Dinner,
    ];
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "breakfast"),
            MealType::Midmorning => write!(f, "midmorning"),
            MealType::Lunch => write!(f, "lunch"),
            MealType::Preworkout => write!(f, "preworkout"),
            MealType::Postworkout => write!(f, "postworkout"),
            MealType::Dinner => write!(f, "dinner"),
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "midmorning" => Ok(MealType::Midmorning),
            "lunch" => Ok(MealType::Lunch),
            "preworkout" => Ok(MealType::Preworkout),
            "postworkout" => Ok(MealType::Postworkout),
            "dinner" => Ok(MealType::Dinner),
            _ => Err(format!(
                "Invalid meal type '{}'. Valid options: breakfast, midmorning, lunch, \
                 preworkout, postworkout, dinner",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_display_matches_from_str() {
        for meal_type in MealType::ALL {
            let parsed = MealType::from_str(&meal_type.to_string()).unwrap();
            assert_eq!(parsed, meal_type);
        }
    }

    #[test]
    fn test_meal_type_from_str_case_insensitive() {
        assert_eq!(MealType::from_str("LUNCH").unwrap(), MealType::Lunch);
        assert_eq!(
            MealType::from_str("PostWorkout").unwrap(),
            MealType::Postworkout
        );
    }

    #[test]
    fn test_meal_type_from_str_invalid() {
        assert!(MealType::from_str("snack").is_err());
        assert!(MealType::from_str("").is_err());
    }

    #[test]
    fn test_meal_type_json() {
        let json = serde_json::to_string(&MealType::Midmorning).unwrap();
        assert_eq!(json, "\"midmorning\"");
    }
}
