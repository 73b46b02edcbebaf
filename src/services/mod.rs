pub mod location;
pub mod nsrdb;
pub mod report;
pub mod simulation;
pub mod system;
pub mod typical_year;
