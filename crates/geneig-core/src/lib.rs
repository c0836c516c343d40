//! Core types for geneig.
//!
//! This crate provides:
//! - The shared [`Error`] type and [`Result`] alias
//! - Dense-matrix helpers: pencil validation, row-major construction,
//!   norms and pretty printing

pub mod error;
pub mod matrix;

pub use error::{Error, Result};
pub use matrix::{check_pencil, format_matrix, from_rows, is_square, norm_inf, same_size};
