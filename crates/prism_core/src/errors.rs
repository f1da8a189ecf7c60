//! Error Types
//!
//! This module defines the error type shared by every Prism crate.
//!
//! # Overview
//!
//! Pipeline compilation distinguishes three severities:
//!
//! - **Field-level** problems (a malformed token, an unknown enum value) are
//!   logged and the affected field keeps its default.
//! - **Structural** problems (an unterminated block, an unknown section) are
//!   logged and the parser resynchronizes.
//! - **Fatal** problems abort compilation and are the only ones represented by
//!   [`PrismError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::errors::{PrismError, Result};
//!
//! fn assemble() -> Result<()> {
//!     Err(PrismError::MissingEntryStage)
//! }
//! ```

use thiserror::Error;

/// The fatal error type for pipeline compilation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrismError {
    // ========================================================================
    // Layout Errors
    // ========================================================================
    /// A packed group was asked to hold more than 32 bits.
    #[error(
        "Packed group '{group}' cannot fit field '{field}': {requested} bits requested, {available} available"
    )]
    PackedGroupOverflow {
        /// Name of the packed group
        group: String,
        /// Name of the field that did not fit
        field: String,
        /// Bits the field needs
        requested: u32,
        /// Bits still free in the group
        available: u32,
    },

    // ========================================================================
    // Assembly Errors
    // ========================================================================
    /// The definition declares neither a `vertex` nor a `compute` stage.
    #[error("Pipeline definition has no stage: a vertex or compute section is required")]
    MissingEntryStage,

    /// A stage was requested from a program that does not carry it.
    #[error("Program has no {0} stage")]
    StageNotPresent(String),

    // ========================================================================
    // Preprocessor Errors
    // ========================================================================
    /// An `#error` directive was reached outside a skipped conditional block.
    #[error("#error in {origin} (line {line}): {message}")]
    ErrorDirective {
        /// Label of the source being preprocessed (usually the stage name)
        origin: String,
        /// 1-based line in the include-resolved source. Lines spliced in by
        /// `#include` directives shift later line numbers.
        line: usize,
        /// Text following the directive
        message: String,
    },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The graphics backend rejected the compiled pipeline.
    #[error("Backend failed to create pipeline: {0}")]
    Backend(String),
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;
