//! Route handlers

pub mod grade;
pub mod metrics;
pub mod results;
