//! Preprocessor Tests
//!
//! Tests for:
//! - `#define` / `#undef` visibility in later conditions
//! - Caller defines merged with in-source defines
//! - Include splicing through a shared registry
//! - `#elif` chains

use prism::{IncludeRegistry, Preprocessor, PrismError, ShaderDefines, preprocess};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn define_and_undef_gate_later_lines() {
    init_logger();
    let registry = IncludeRegistry::new();
    let source = "\
#define X 1
#if X == 1
first
#endif
#undef X
#if X == 1
second
#endif";
    let text = preprocess(source, &registry, &ShaderDefines::new()).unwrap();
    assert_eq!(text, "first");
}

#[test]
fn caller_defines_are_visible() {
    init_logger();
    let registry = IncludeRegistry::new();
    let mut defines = ShaderDefines::new();
    defines.set("QUALITY", "high");
    defines.define("SHADOWS");

    let source = "#ifdef SHADOWS\n#if QUALITY == high\npcf QUALITY\n#endif\n#endif";
    let text = preprocess(source, &registry, &defines).unwrap();
    assert_eq!(text, "pcf high");
}

#[test]
fn includes_share_one_registry() {
    init_logger();
    let registry = IncludeRegistry::new();
    registry.register_source("lighting", "#include \"math\"\nvec3 light();");
    registry.register_source("math", "#define PI 3.14159");

    let mut pp = Preprocessor::new(&registry).with_origin("fragment");
    let text = pp.run("#include \"lighting\"\nfloat tau = 2.0 * PI;").unwrap();
    assert_eq!(text, "vec3 light();\nfloat tau = 2.0 * 3.14159;");
    assert!(pp.is_defined("PI"));
}

#[test]
fn missing_include_fails_with_origin() {
    init_logger();
    let registry = IncludeRegistry::new();
    let mut pp = Preprocessor::new(&registry).with_origin("vertex");
    let err = pp.run("#include <noise>").unwrap_err();
    assert_eq!(
        err,
        PrismError::ErrorDirective {
            origin: "vertex".to_string(),
            line: 1,
            message: "Unable to locate include: noise".to_string(),
        }
    );
}

#[test]
fn elif_chain() {
    init_logger();
    let registry = IncludeRegistry::new();
    let defines = ShaderDefines::from(&[("MODE", "2")][..]);
    let source = "#if MODE == 1\none\n#elif MODE == 2\ntwo\n#else\nother\n#endif";
    assert_eq!(preprocess(source, &registry, &defines).unwrap(), "two");
}
