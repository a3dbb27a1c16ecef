//! Parsing strategies beyond a single document

pub mod parallel;
