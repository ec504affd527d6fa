//! Common building blocks shared by every record type

pub mod errors;
pub mod identifiers;
