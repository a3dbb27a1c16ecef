//! Core XML parsing
//!
//! - Scanner: cursor and matching primitives, line/column tracking
//! - Entities: predefined entity table and reference expansion
//! - Parser: recursive-descent grammar, including DOCTYPE and internal subset
//! - Error: syntax error diagnostics

pub mod entities;
pub mod error;
pub mod parser;
pub mod scanner;
