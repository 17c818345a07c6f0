use chrono::NaiveDate;
use clap::{Args, Subcommand};
use fitlog_core::{Clock, EntityId, MealType, NewFoodItem, SystemClock};

use super::{parse_date, parse_measure, OutputFormat};
use crate::sync::Repository;

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Log a food item for today
    Add {
        /// Food name
        name: String,

        /// Meal (breakfast, midmorning, lunch, preworkout, postworkout, dinner)
        #[arg(long = "meal", short = 'm', value_name = "MEAL")]
        meal_type: MealType,

        #[arg(long, default_value = "0")]
        calories: String,

        /// Protein in grams
        #[arg(long, default_value = "0")]
        protein: String,

        /// Carbohydrates in grams
        #[arg(long, default_value = "0")]
        carbs: String,

        /// Fats in grams
        #[arg(long, default_value = "0")]
        fats: String,
    },

    /// Show the food logged on a day
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a logged food item
    Delete {
        id: EntityId,
    },

    /// Show calorie and macro totals for a day
    Stats {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FoodCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FoodSubcommand::Add {
                name,
                meal_type,
                calories,
                protein,
                carbs,
                fats,
            } => {
                if name.trim().is_empty() {
                    return Err("Food name cannot be empty".into());
                }
                let item = NewFoodItem::new(
                    name.trim(),
                    parse_measure(calories),
                    parse_measure(protein),
                    parse_measure(carbs),
                    parse_measure(fats),
                );
                let entry = repo
                    .add_food_item(*meal_type, item)
                    .ok_or("Failed to save food entry")?;
                println!("Logged {}", entry);
                Ok(())
            }

            FoodSubcommand::List { date, format } => {
                let date = resolve_date(date)?;
                let day = repo.food_day(date);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&day)?),
                    OutputFormat::Text => {
                        let Some(day) = day else {
                            println!("Nothing logged on {}", date);
                            return Ok(());
                        };
                        println!("{}", day.date);
                        println!("{}", "-".repeat(60));
                        for meal_type in MealType::ALL {
                            let entries: Vec<_> = day.entries_for(meal_type).collect();
                            if entries.is_empty() {
                                continue;
                            }
                            println!("  {}", meal_type);
                            for entry in entries {
                                println!(
                                    "    {:<15} {:<24} {:>5} kcal  P {}g  C {}g  F {}g",
                                    entry.id,
                                    entry.name,
                                    entry.calories,
                                    entry.protein,
                                    entry.carbs,
                                    entry.fats
                                );
                            }
                        }
                        println!("\nTotal: {}", day.stats());
                    }
                }
                Ok(())
            }

            FoodSubcommand::Delete { id } => {
                if !repo.delete_food_item(*id) {
                    return Err(format!("Food entry not found: {}", id).into());
                }
                println!("Deleted food entry {}", id);
                Ok(())
            }

            FoodSubcommand::Stats { date, format } => {
                let date = resolve_date(date)?;
                let stats = repo.food_stats(Some(date));
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                    OutputFormat::Text => println!("{}: {}", date, stats),
                }
                Ok(())
            }
        }
    }
}

fn resolve_date(date: &Option<String>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => parse_date(d),
        None => Ok(SystemClock.today()),
    }
}
