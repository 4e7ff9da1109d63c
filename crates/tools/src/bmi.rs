//! BMI tool — body-mass index from weight and height.

use async_trait::async_trait;
use serde_json::{Map, Value};
use vitalis_core::error::ToolError;
use vitalis_core::tool::{Tool, ToolResult};

use crate::args::positive_number;

/// Heights above this many metres are taken to be centimetres.
const MAX_PLAUSIBLE_HEIGHT_M: f64 = 3.0;

pub struct BmiTool;

/// Body-mass index for `weight_kg` and a height in metres or centimetres.
pub fn body_mass_index(weight_kg: f64, height: f64) -> f64 {
    let height_m = if height > MAX_PLAUSIBLE_HEIGHT_M {
        height / 100.0
    } else {
        height
    };
    weight_kg / (height_m * height_m)
}

#[async_trait]
impl Tool for BmiTool {
    fn name(&self) -> &str {
        "calculate_bmi"
    }

    async fn execute(&self, args: &Map<String, Value>) -> Result<ToolResult, ToolError> {
        let weight = positive_number(args, "weight_kg")?;
        let height = positive_number(args, "height_m")?;
        Ok(ToolResult::ok(format!("BMI: {:.2}", body_mass_index(weight, height))))
    }
}
