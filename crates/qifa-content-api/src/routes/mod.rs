pub mod cache;
pub mod health;
pub mod records;
