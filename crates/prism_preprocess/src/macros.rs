use prism_core::text::replace_identifiers;
use rustc_hash::FxHashMap;

/// Active `#define` table: name → replacement text
pub(crate) type Defines = FxHashMap<String, String>;

/// Which macros take part in a substitution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Substitution {
    /// Every defined macro is replaced, empty ones by nothing
    All,
    /// Macros with an empty value keep their bare name, so conditions can
    /// still test that they are defined
    NonEmpty,
}

/// Replaces defined macro names in `text`, rescanning replacements.
///
/// A macro is never expanded inside its own expansion, so `#define A A` and
/// mutually recursive pairs terminate.
pub(crate) fn expand(text: &str, defines: &Defines, mode: Substitution) -> String {
    if defines.is_empty() {
        return text.to_string();
    }
    let mut active = Vec::new();
    expand_guarded(text, defines, mode, &mut active)
}

fn expand_guarded(
    text: &str,
    defines: &Defines,
    mode: Substitution,
    active: &mut Vec<String>,
) -> String {
    replace_identifiers(text, |word| {
        if active.iter().any(|name| name == word) {
            return None;
        }
        let value = defines.get(word)?;
        if mode == Substitution::NonEmpty && value.is_empty() {
            return None;
        }
        active.push(word.to_string());
        let expanded = expand_guarded(value, defines, mode, active);
        active.pop();
        Some(expanded)
    })
    .into_owned()
}
