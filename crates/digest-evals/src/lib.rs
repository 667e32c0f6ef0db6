pub mod cases;
pub mod config;
pub mod error;
pub mod gate;
pub mod report;
pub mod runner;
pub mod summary;
