pub mod agent;
pub mod configuration;
pub mod meal_plan;
pub mod models;
pub mod providers;
pub mod sink;
pub mod team;
pub mod termination;
pub mod weather;
