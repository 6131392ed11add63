pub mod meal_plan;
pub mod weather;
