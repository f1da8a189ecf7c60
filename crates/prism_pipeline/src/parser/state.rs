//! `state` section parser.
//!
//! One setting per line; a malformed line leaves its field unset.
//!
//! ```text
//! cull back
//! blend src_alpha one_minus_src_alpha add
//! colormask F
//! depthmask off
//! depth lequal
//! stencilmask FF
//! stencil always 1 FF keep keep replace
//! ```

use prism_core::text::{parse_hex, tokenize};

use crate::state::{
    Blend, BlendFactor, BlendOp, ColorMask, CompareFunc, CullMode, DepthTest, State, StencilOp,
    StencilTest,
};

/// Parses a `state` section.
#[must_use]
pub fn parse_state(text: &str) -> State {
    let mut state = State::default();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let tokens = tokenize(line);
        let Some((keyword, args)) = tokens.split_first() else {
            continue;
        };

        let applied = match keyword.to_ascii_lowercase().as_str() {
            "cull" => set(&mut state.cull, single(args).and_then(CullMode::parse)),
            "blend" => set(&mut state.blend, parse_blend(args)),
            "colormask" => set(
                &mut state.color_mask,
                single(args).and_then(parse_hex).and_then(ColorMask::from_bits),
            ),
            "depthmask" => set(&mut state.depth_write, single(args).and_then(parse_switch)),
            "depth" => set(&mut state.depth, parse_depth(args)),
            "stencilmask" => set(&mut state.stencil_mask, single(args).and_then(parse_hex)),
            "stencil" => set(&mut state.stencil, parse_stencil(args)),
            _ => {
                log::warn!("state:{line_no}: unknown setting '{keyword}'");
                continue;
            }
        };

        if !applied {
            log::warn!("state:{line_no}: malformed '{keyword}' setting '{}'", line.trim());
        }
    }

    state
}

fn set<T>(field: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *field = Some(value);
            true
        }
        None => false,
    }
}

fn single<'a>(args: &[&'a str]) -> Option<&'a str> {
    match args {
        [arg] => Some(*arg),
        _ => None,
    }
}

fn is_off(token: &str) -> bool {
    token.eq_ignore_ascii_case("off")
}

fn parse_switch(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_blend(args: &[&str]) -> Option<Blend> {
    match args {
        [off] if is_off(off) => Some(Blend::Disabled),
        [src, dst] => Some(Blend::Enabled {
            src: BlendFactor::parse(src)?,
            dst: BlendFactor::parse(dst)?,
            op: BlendOp::default(),
        }),
        [src, dst, op] => Some(Blend::Enabled {
            src: BlendFactor::parse(src)?,
            dst: BlendFactor::parse(dst)?,
            op: BlendOp::parse(op)?,
        }),
        _ => None,
    }
}

fn parse_depth(args: &[&str]) -> Option<DepthTest> {
    match single(args)? {
        off if is_off(off) => Some(DepthTest::Disabled),
        func => CompareFunc::parse(func).map(DepthTest::Enabled),
    }
}

fn parse_stencil(args: &[&str]) -> Option<StencilTest> {
    match args {
        [off] if is_off(off) => Some(StencilTest::Disabled),
        [func, reference, mask, fail, depth_fail, pass] => Some(StencilTest::Enabled {
            func: CompareFunc::parse(func)?,
            reference: reference.parse().ok()?,
            mask: parse_hex(mask)?,
            fail: StencilOp::parse(fail)?,
            depth_fail: StencilOp::parse(depth_fail)?,
            pass: StencilOp::parse(pass)?,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_full_state() {
        init_logger();
        let state = parse_state(
            "cull back\nblend src_alpha one_minus_src_alpha\ncolormask 7\ndepthmask off\n\
             depth lequal\nstencilmask FF\nstencil always 1 0xFF keep keep replace",
        );
        assert_eq!(state.cull, Some(CullMode::Back));
        assert_eq!(
            state.blend,
            Some(Blend::Enabled {
                src: BlendFactor::SrcAlpha,
                dst: BlendFactor::OneMinusSrcAlpha,
                op: BlendOp::Add,
            })
        );
        assert_eq!(state.color_mask, Some(ColorMask::R | ColorMask::G | ColorMask::B));
        assert_eq!(state.depth_write, Some(false));
        assert_eq!(state.depth, Some(DepthTest::Enabled(CompareFunc::LessEqual)));
        assert_eq!(state.stencil_mask, Some(0xFF));
        assert_eq!(
            state.stencil,
            Some(StencilTest::Enabled {
                func: CompareFunc::Always,
                reference: 1,
                mask: 0xFF,
                fail: StencilOp::Keep,
                depth_fail: StencilOp::Keep,
                pass: StencilOp::Replace,
            })
        );
    }

    #[test]
    fn test_off_forms() {
        init_logger();
        let state = parse_state("blend off\ndepth OFF\nstencil off\ndepthmask 1\ncull none");
        assert_eq!(state.blend, Some(Blend::Disabled));
        assert_eq!(state.depth, Some(DepthTest::Disabled));
        assert_eq!(state.stencil, Some(StencilTest::Disabled));
        assert_eq!(state.depth_write, Some(true));
        assert_eq!(state.cull, Some(CullMode::None));
    }

    #[test]
    fn test_blend_with_op() {
        init_logger();
        let state = parse_state("blend one one max");
        assert_eq!(
            state.blend,
            Some(Blend::Enabled {
                src: BlendFactor::One,
                dst: BlendFactor::One,
                op: BlendOp::Max,
            })
        );
    }

    #[test]
    fn test_malformed_lines_leave_fields_unset() {
        init_logger();
        let state = parse_state(
            "cull sideways\nblend one\ncolormask 1F\ndepthmask maybe\ndepth\nstencil always 1 FF keep\nwireframe on",
        );
        assert!(state.is_default());
    }

    #[test]
    fn test_later_lines_override() {
        init_logger();
        let state = parse_state("cull back\ncull sideways\ncull front");
        assert_eq!(state.cull, Some(CullMode::Front));
    }
}
