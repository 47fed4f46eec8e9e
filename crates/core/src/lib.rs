//! Core business logic for Hearth.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `series` - Installment/recurring series expansion, bulk scopes,
//!   anticipation and its reversal

pub mod series;
