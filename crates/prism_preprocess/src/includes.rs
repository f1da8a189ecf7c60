use prism_core::IncludeRegistry;
use prism_core::include::missing_include_marker;
use prism_core::text::{directive, strip_comments};
use smallvec::SmallVec;

/// Names of the includes currently being expanded, outermost first
type IncludeChain = SmallVec<[String; 8]>;

/// Expands every `#include` in `source`, depth first.
///
/// Included text is itself include-resolved before being spliced in place of
/// the directive line. Unknown names become a single
/// `#error Unable to locate include: <name>` line; an include that would
/// recurse into a file already being expanded becomes
/// `#error Recursive include: <name>`.
#[must_use]
pub fn resolve_includes(source: &str, registry: &IncludeRegistry) -> String {
    let mut lines = Vec::new();
    let mut chain = IncludeChain::new();
    expand_into(&mut lines, source, registry, &mut chain);
    lines.join("\n")
}

fn expand_into(
    lines: &mut Vec<String>,
    source: &str,
    registry: &IncludeRegistry,
    chain: &mut IncludeChain,
) {
    let stripped_source = strip_comments(source);
    for (line, stripped) in source.lines().zip(stripped_source.lines()) {
        let Some(("include", argument)) = directive(stripped) else {
            lines.push(line.to_string());
            continue;
        };

        let Some(name) = include_name(argument) else {
            log::warn!("Malformed include directive: '{}'", line.trim());
            lines.push(format!("#error Malformed include directive: {}", line.trim()));
            continue;
        };

        if chain.iter().any(|active| active == name) {
            log::warn!("Include '{name}' recursively includes itself; chain: {chain:?}");
            lines.push(format!("#error Recursive include: {name}"));
            continue;
        }

        match registry.get(name) {
            Some(text) => {
                log::debug!("Resolving include '{name}'");
                chain.push(name.to_string());
                expand_into(lines, &text, registry, chain);
                chain.pop();
            }
            None => {
                log::warn!("Include '{name}' is not registered");
                lines.push(missing_include_marker(name));
            }
        }
    }
}

/// Extracts `name` from `"name"` or `<name>`.
fn include_name(argument: &str) -> Option<&str> {
    let argument = argument.trim();
    let (open, close) = match argument.chars().next()? {
        '"' => ('"', '"'),
        '<' => ('<', '>'),
        _ => return None,
    };
    let inner = argument.strip_prefix(open)?;
    let end = inner.find(close)?;
    let name = inner[..end].trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_name() {
        assert_eq!(include_name("\"common\""), Some("common"));
        assert_eq!(include_name("<lib/noise>"), Some("lib/noise"));
        assert_eq!(include_name("common"), None);
        assert_eq!(include_name("\"\""), None);
        assert_eq!(include_name("<unterminated"), None);
    }
}
