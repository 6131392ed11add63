pub mod azure;
pub mod base;
pub mod configs;
pub mod token;
pub mod utils;

#[cfg(test)]
pub mod mock;
