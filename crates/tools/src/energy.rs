//! Daily energy tool — total daily energy expenditure (TDEE).
//!
//! Basal rate from the Mifflin–St Jeor equation, scaled by an activity
//! multiplier matched from free text.

use async_trait::async_trait;
use serde_json::{Map, Value};
use vitalis_core::error::ToolError;
use vitalis_core::tool::{Tool, ToolResult};

use crate::args::{ensure_positive, optional_number, optional_text, positive_number};

const DEFAULT_HEIGHT_CM: f64 = 170.0;
const DEFAULT_AGE: f64 = 30.0;
const SEDENTARY: f64 = 1.2;

/// Activity keywords and their multipliers. The longest keyword found in
/// the input wins, so "extremely active" never resolves to "active".
const ACTIVITY_MULTIPLIERS: &[(&str, f64)] = &[
    ("sedentary", 1.2),
    ("light", 1.375),
    ("lightly active", 1.375),
    ("moderate", 1.55),
    ("moderately active", 1.55),
    ("active", 1.55),
    ("very active", 1.725),
    ("extra active", 1.9),
    ("extremely active", 1.9),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "male" | "m" | "man" => Some(Self::Male),
            "female" | "f" | "woman" => Some(Self::Female),
            _ => None,
        }
    }

    fn offset(self) -> f64 {
        match self {
            Self::Male => 5.0,
            Self::Female => -161.0,
        }
    }
}

/// Multiplier for a free-text activity level; unrecognised text is sedentary.
pub fn activity_multiplier(level: &str) -> f64 {
    let level = level.to_lowercase();
    ACTIVITY_MULTIPLIERS
        .iter()
        .filter(|(keyword, _)| level.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map_or(SEDENTARY, |(_, multiplier)| *multiplier)
}

/// Mifflin–St Jeor basal metabolic rate.
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: f64, sex: Sex) -> f64 {
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age + sex.offset()
}

pub struct DailyEnergyTool;

#[async_trait]
impl Tool for DailyEnergyTool {
    fn name(&self) -> &str {
        "estimate_daily_calories"
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolResult, ToolError> {
        let weight = positive_number(args, "weight_kg")?;

        let mut height_cm = match optional_number(args, "height_cm")? {
            Some(h) => ensure_positive("height_cm", h)?,
            None => DEFAULT_HEIGHT_CM,
        };
        if height_cm <= 3.0 {
            height_cm *= 100.0;
        }

        let age = match optional_number(args, "age")? {
            Some(a) => ensure_positive("age", a)?,
            None => DEFAULT_AGE,
        };

        let sex = match optional_text(args, "sex").or_else(|| optional_text(args, "gender")) {
            Some(text) => Sex::parse(&text)
                .ok_or_else(|| ToolError::InvalidArguments(format!("unknown sex: {text}")))?,
            None => Sex::Male,
        };

        let multiplier = optional_text(args, "activity_level")
            .map_or(SEDENTARY, |level| activity_multiplier(&level));

        let tdee = basal_metabolic_rate(weight, height_cm, age, sex) * multiplier;
        Ok(ToolResult::ok(format!("TDEE: {} kcal", tdee.round() as i64)))
    }
}
