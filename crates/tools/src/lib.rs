//! Built-in tool implementations for Vitalis.
//!
//! Tools are deterministic calculations the model can request instead of
//! doing arithmetic itself.

mod args;
pub mod bmi;
pub mod energy;

use vitalis_core::tool::ToolRegistry;

pub use bmi::BmiTool;
pub use energy::DailyEnergyTool;

/// Create a default tool registry with all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(BmiTool));
    registry.register(Box::new(DailyEnergyTool));
    registry
}
