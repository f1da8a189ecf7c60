//! # Prism - Preprocessor
//!
//! A small C-like preprocessor for shader stage sources. It runs in two passes:
//!
//! 1. [`resolve_includes`] splices registered include text in place of
//!    `#include "name"` / `#include <name>` lines, recursively.
//! 2. [`Preprocessor::process_conditionals`] evaluates `#define`, `#undef`,
//!    `#ifdef`, `#ifndef`, `#if`, `#elif`, `#else`, `#endif` and `#error`, and
//!    substitutes macros into the surviving lines.
//!
//! Conditions support `!`, `==`, `!=`, `&&` and `||` only.

mod condition;
mod includes;
mod macros;
mod preprocess;

pub use includes::resolve_includes;
pub use preprocess::{Preprocessor, preprocess};
