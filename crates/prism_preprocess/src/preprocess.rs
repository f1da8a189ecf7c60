use prism_core::text::{directive, is_identifier, strip_comments};
use prism_core::{IncludeRegistry, PrismError, Result, ShaderDefines};
use smallvec::SmallVec;

use crate::condition;
use crate::includes::resolve_includes;
use crate::macros::{Defines, Substitution, expand};

/// Stack of `#if` results. A line is live only while every entry is true.
#[derive(Debug, Default)]
struct ConditionStack(SmallVec<[bool; 8]>);

impl ConditionStack {
    fn is_active(&self) -> bool {
        self.0.iter().all(|&gate| gate)
    }

    fn push(&mut self, gate: bool) {
        self.0.push(gate);
    }

    /// `#elif`: the branch is taken when the previous one was not and the
    /// new condition holds. Only the immediately preceding result is consulted.
    fn elif(&mut self, condition: bool) -> bool {
        match self.0.last_mut() {
            Some(top) => {
                *top = !*top && condition;
                true
            }
            None => false,
        }
    }

    fn invert(&mut self) -> bool {
        match self.0.last_mut() {
            Some(top) => {
                *top = !*top;
                true
            }
            None => false,
        }
    }

    fn pop(&mut self) -> bool {
        self.0.pop().is_some()
    }

    fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Two-pass text preprocessor: include expansion, then conditionals and macros.
///
/// ```rust,ignore
/// let registry = IncludeRegistry::new();
/// let mut pp = Preprocessor::new(&registry).with_origin("vertex");
/// pp.define("VERTEX", "");
/// let text = pp.run("#ifdef VERTEX\nvoid main() {}\n#endif")?;
/// assert_eq!(text, "void main() {}");
/// ```
pub struct Preprocessor<'a> {
    registry: &'a IncludeRegistry,
    defines: Defines,
    origin: String,
}

impl<'a> Preprocessor<'a> {
    #[must_use]
    pub fn new(registry: &'a IncludeRegistry) -> Self {
        Self {
            registry,
            defines: Defines::default(),
            origin: "source".to_string(),
        }
    }

    /// Seeds the define table with caller supplied feature flags.
    #[must_use]
    pub fn with_defines(mut self, defines: &ShaderDefines) -> Self {
        for (name, value) in defines.iter() {
            self.define(name, value);
        }
        self
    }

    /// Label used in `#error` diagnostics, usually the stage name.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.defines.insert(name.to_string(), value.to_string());
    }

    pub fn undefine(&mut self, name: &str) -> bool {
        self.defines.remove(name).is_some()
    }

    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    /// Value of a defined macro, as left by the last [`run`](Self::run).
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    /// Runs both passes over `source`.
    ///
    /// The define table persists across calls, so `#define`s seen in one run
    /// are visible to the next.
    pub fn run(&mut self, source: &str) -> Result<String> {
        let resolved = resolve_includes(source, self.registry);
        self.process_conditionals(&resolved)
    }

    /// Evaluates conditionals and substitutes macros in include-resolved text.
    pub fn process_conditionals(&mut self, text: &str) -> Result<String> {
        let mut stack = ConditionStack::default();
        let mut out: Vec<String> = Vec::new();

        // Block comments may span lines, so strip them over the whole text
        let stripped_text = strip_comments(text);
        for (index, (line, stripped)) in text.lines().zip(stripped_text.lines()).enumerate() {
            let line_no = index + 1;

            let Some((name, argument)) = directive(stripped) else {
                if stack.is_active() {
                    out.push(expand(line, &self.defines, Substitution::All));
                }
                continue;
            };

            match name {
                "define" => {
                    if stack.is_active() {
                        self.handle_define(argument, line_no);
                    }
                }
                "undef" => {
                    if stack.is_active() {
                        match argument.split_whitespace().next() {
                            Some(macro_name) => {
                                self.defines.remove(macro_name);
                            }
                            None => log::warn!(
                                "{}:{line_no}: #undef without a macro name",
                                self.origin
                            ),
                        }
                    }
                }
                "ifdef" | "ifndef" => {
                    let gate = if stack.is_active() {
                        match argument.split_whitespace().next() {
                            Some(macro_name) => {
                                self.defines.contains_key(macro_name) == (name == "ifdef")
                            }
                            None => {
                                log::warn!(
                                    "{}:{line_no}: #{name} without a macro name",
                                    self.origin
                                );
                                false
                            }
                        }
                    } else {
                        false
                    };
                    stack.push(gate);
                }
                "if" => {
                    let gate = stack.is_active() && self.evaluate(argument, line_no);
                    stack.push(gate);
                }
                "elif" => {
                    let condition = self.evaluate(argument, line_no);
                    if !stack.elif(condition) {
                        log::warn!("{}:{line_no}: #elif without a matching #if", self.origin);
                    }
                }
                "else" => {
                    if !stack.invert() {
                        log::warn!("{}:{line_no}: #else without a matching #if", self.origin);
                    }
                }
                "endif" => {
                    if !stack.pop() {
                        log::warn!("{}:{line_no}: #endif without a matching #if", self.origin);
                    }
                }
                "error" => {
                    if stack.is_active() {
                        log::error!("{}:{line_no}: #error {argument}", self.origin);
                        return Err(PrismError::ErrorDirective {
                            origin: self.origin.clone(),
                            line: line_no,
                            message: argument.to_string(),
                        });
                    }
                }
                _ => {
                    // Directives for the downstream compiler (#version, #extension, ...)
                    if stack.is_active() {
                        out.push(line.to_string());
                    }
                }
            }
        }

        if stack.depth() > 0 {
            log::warn!(
                "{}: {} conditional block(s) left open at end of input",
                self.origin,
                stack.depth()
            );
        }

        Ok(out.join("\n"))
    }

    fn handle_define(&mut self, argument: &str, line_no: usize) {
        let (macro_name, value) = match argument.split_once(char::is_whitespace) {
            Some((macro_name, value)) => (macro_name, value.trim()),
            None => (argument, ""),
        };
        if !is_identifier(macro_name) {
            log::warn!(
                "{}:{line_no}: ignoring #define with invalid name '{macro_name}'",
                self.origin
            );
            return;
        }
        self.defines.insert(macro_name.to_string(), value.to_string());
    }

    /// Substitutes macros into a condition and evaluates it. Malformed
    /// conditions are logged and count as false.
    fn evaluate(&self, argument: &str, line_no: usize) -> bool {
        let substituted = expand(argument, &self.defines, Substitution::NonEmpty);
        match condition::evaluate(&substituted, &self.defines) {
            Ok(result) => result,
            Err(err) => {
                log::warn!(
                    "{}:{line_no}: cannot evaluate condition '{argument}': {err}",
                    self.origin
                );
                false
            }
        }
    }
}

/// Preprocesses `source` with `defines` predefined.
pub fn preprocess(
    source: &str,
    registry: &IncludeRegistry,
    defines: &ShaderDefines,
) -> Result<String> {
    Preprocessor::new(registry).with_defines(defines).run(source)
}
