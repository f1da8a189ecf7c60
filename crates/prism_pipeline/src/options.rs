//! Compiler Options
//!
//! [`CompileOptions`] carries everything a compilation needs besides the
//! document and the include registry.
//!
//! ```rust,ignore
//! use prism_pipeline::{CompileOptions, LayoutRule};
//!
//! // Defaults: std140 memory layout, no defines, implicit `stdlib` include
//! let options = CompileOptions::default();
//!
//! // Tightly packed storage buffers and a custom standard library
//! let options = CompileOptions {
//!     layout_rule: LayoutRule::Std430,
//!     ..Default::default()
//! }
//! .with_stdlib_include("engine/common");
//! ```

use prism_core::ShaderDefines;

use crate::layout::LayoutRule;

/// Name of the include placed in front of every stage unless disabled.
pub const DEFAULT_STDLIB_INCLUDE: &str = "stdlib";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Alignment regime for uniform and buffer memory.
    pub layout_rule: LayoutRule,
    /// Feature flags defined in every stage.
    pub defines: ShaderDefines,
    /// Include injected at the top of every stage. `None` disables it.
    pub stdlib_include: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            layout_rule: LayoutRule::default(),
            defines: ShaderDefines::new(),
            stdlib_include: Some(DEFAULT_STDLIB_INCLUDE.to_string()),
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn with_layout_rule(mut self, rule: LayoutRule) -> Self {
        self.layout_rule = rule;
        self
    }

    #[must_use]
    pub fn with_defines(mut self, defines: ShaderDefines) -> Self {
        self.defines = defines;
        self
    }

    /// Adds a single `NAME value` define.
    #[must_use]
    pub fn with_define(mut self, name: &str, value: &str) -> Self {
        self.defines.set(name, value);
        self
    }

    #[must_use]
    pub fn with_stdlib_include(mut self, name: impl Into<String>) -> Self {
        self.stdlib_include = Some(name.into());
        self
    }

    #[must_use]
    pub fn without_stdlib_include(mut self) -> Self {
        self.stdlib_include = None;
        self
    }
}
