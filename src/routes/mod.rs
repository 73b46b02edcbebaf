pub mod estimates;
pub mod health;
pub mod locations;
