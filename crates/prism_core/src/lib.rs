//! # Prism - Core
//!
//! Shared building blocks for the Prism pipeline compiler:
//!
//! - [`errors`]: the fatal error type [`PrismError`] and [`Result`] alias
//! - [`text`]: comment stripping and line tokenizing helpers
//! - [`include`]: the thread-safe [`IncludeRegistry`]
//! - [`defines`]: caller supplied [`ShaderDefines`]
//! - [`interner`]: string interning backing the define sets

pub mod defines;
pub mod errors;
pub mod include;
pub mod interner;
pub mod text;

pub use defines::ShaderDefines;
pub use errors::{PrismError, Result};
pub use include::{IncludeRegistry, IncludeSource};
