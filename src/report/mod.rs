//! Report output: CSV tables and PNG charts.

pub mod charts;
pub mod tables;
