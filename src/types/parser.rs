//! Parser for the credential type DSL.
//!
//! ```text
//! @revocable(16); age:uint<8>; name:prop<248,keccak256,1>; vip:bool;
//! ```
//!
//! Statements are separated by `;`. Lines starting with `@` are pragmas,
//! every other line is `name:type`. Parsing is all-or-nothing: the first
//! error aborts and no partial type is returned.

use std::sync::OnceLock;

use regex::Regex;

use super::claim::{check_revocable_depth, ClaimDef, ClaimType, CredType, HashAlgorithm};
use crate::error::{Error, Result};

fn pragma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@([a-zA-Z_][a-zA-Z0-9_]*)\s*\(([^()]*)\)$").expect("static regex")
    })
}

fn type_expr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([a-z]+)\s*(?:<([^<>]*)>)?$").expect("static regex"))
}

/// Parse a type DSL string into a [`CredType`] with type id 0.
pub fn parse_type(dsl: &str) -> Result<CredType> {
    let lines: Vec<&str> = dsl
        .split(';')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let (pragmas, claim_lines): (Vec<&str>, Vec<&str>) =
        lines.into_iter().partition(|l| l.starts_with('@'));

    let mut revocable = None;
    for line in pragmas {
        let (name, args) = parse_pragma(line)?;
        match name {
            "revocable" => {
                if revocable.is_some() {
                    return Err(Error::InvalidPragma("revocable declared more than once".into()));
                }
                revocable = Some(parse_revocable_depth(args)?);
            }
            other => {
                return Err(Error::InvalidPragma(format!("unknown pragma @{other}")));
            }
        }
    }

    let claims = claim_lines
        .into_iter()
        .map(parse_claim)
        .collect::<Result<Vec<_>>>()?;

    let tp = CredType::new(claims, revocable)?;
    tracing::debug!(
        claims = tp.claims().len(),
        revocable = ?tp.revocable(),
        "parsed credential type"
    );
    Ok(tp)
}

fn parse_pragma(line: &str) -> Result<(&str, &str)> {
    let caps = pragma_pattern()
        .captures(line)
        .ok_or_else(|| Error::InvalidPragma(format!("malformed pragma {line:?}")))?;
    let name = caps.get(1).map_or("", |m| m.as_str());
    let args = caps.get(2).map_or("", |m| m.as_str().trim());
    Ok((name, args))
}

fn parse_revocable_depth(args: &str) -> Result<u32> {
    if args.is_empty() || !args.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPragma(format!(
            "revocable depth {args:?} is not a decimal unsigned integer"
        )));
    }
    // Anything that overflows u32 is certainly above the maximum depth.
    let depth = args.parse::<u32>().unwrap_or(u32::MAX);
    check_revocable_depth(depth)?;
    Ok(depth)
}

fn parse_claim(line: &str) -> Result<ClaimDef> {
    let (name, expr) = line
        .split_once(':')
        .ok_or_else(|| Error::InvalidTypeParameter(format!("malformed claim {line:?}")))?;
    let name = name.trim();
    let tp = parse_claim_type(expr.trim())?;
    ClaimDef::new(name, tp)
}

/// Parse a single type expression such as `uint<64>`.
pub fn parse_claim_type(expr: &str) -> Result<ClaimType> {
    let caps = type_expr_pattern()
        .captures(expr)
        .ok_or_else(|| Error::InvalidTypeParameter(format!("malformed type {expr:?}")))?;
    let type_name = caps.get(1).map_or("", |m| m.as_str());
    let args: Vec<&str> = match caps.get(2) {
        Some(m) if !m.as_str().trim().is_empty() => m.as_str().split(',').map(str::trim).collect(),
        _ => Vec::new(),
    };

    match type_name {
        "uint" => {
            let [width] = expect_args::<1>(type_name, &args)?;
            ClaimType::scalar(parse_u32(width)?)
        }
        "prop" => {
            let [width, alg, checks] = expect_args::<3>(type_name, &args)?;
            ClaimType::property(
                parse_u32(width)?,
                HashAlgorithm::parse(alg)?,
                parse_u32(checks)?,
            )
        }
        "bool" => {
            expect_args::<0>(type_name, &args)?;
            Ok(ClaimType::Boolean)
        }
        other => Err(Error::InvalidTypeParameter(format!("unknown type {other:?}"))),
    }
}

fn expect_args<'a, const N: usize>(type_name: &str, args: &[&'a str]) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| {
        Error::InvalidTypeParameter(format!(
            "{type_name} expects {N} parameter(s), got {}",
            args.len()
        ))
    })
}

fn parse_u32(s: &str) -> Result<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidTypeParameter(format!("{s:?} is not a decimal integer")));
    }
    s.parse::<u32>()
        .map_err(|e| Error::InvalidTypeParameter(format!("{s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_full_type() {
        let tp = parse_type(" age:uint<8>;name : prop<248, keccak256, 2> ; vip:bool ;; ").unwrap();
        assert_eq!(tp.claims().len(), 3);
        assert_eq!(tp.claims()[0].tp, ClaimType::Scalar { width: 8 });
        assert_eq!(
            tp.claims()[1].tp,
            ClaimType::Property {
                width: 248,
                hash_algorithm: HashAlgorithm::Keccak256,
                n_equal_checks: 2
            }
        );
        assert_eq!(tp.claims()[2].tp, ClaimType::Boolean);
        assert_eq!(tp.revocable(), None);
        assert_eq!(tp.type_id(), &num_bigint::BigUint::default());
    }

    #[test]
    fn test_revocable_pragma() {
        let tp = parse_type("@revocable(4);age:uint<256>;").unwrap();
        assert_eq!(tp.revocable(), Some(4));

        let e = parse_type("@revocable(249);age:uint<256>;").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidPragma);
        assert!(e.to_string().contains("too large"));

        let e = parse_type("@revocable(1);age:uint<256>;").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidPragma);
        assert!(e.to_string().contains("too small"));

        let e = parse_type("@revocable(99999999999);age:uint<8>;").unwrap_err();
        assert!(e.to_string().contains("too large"));
    }

    #[test]
    fn test_pragma_errors() {
        for dsl in [
            "@revocable(4);@revocable(5);a:bool;",
            "@revocable(-4);a:bool;",
            "@revocable(0x10);a:bool;",
            "@revocable();a:bool;",
            "@expires(3);a:bool;",
            "@revocable 4;a:bool;",
        ] {
            let e = parse_type(dsl).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidPragma, "{dsl}");
        }
    }

    #[test]
    fn test_claim_errors() {
        let cases = [
            ("sig_foo:uint<8>;", ErrorKind::InvalidClaimName),
            ("id:uint<8>;", ErrorKind::InvalidClaimName),
            ("a:uint<8>;a:bool;", ErrorKind::DuplicateClaimName),
            ("a:uint<7>;", ErrorKind::InvalidTypeParameter),
            ("a:uint;", ErrorKind::InvalidTypeParameter),
            ("a:uint<8,8>;", ErrorKind::InvalidTypeParameter),
            ("a:int<8>;", ErrorKind::InvalidTypeParameter),
            ("a:bool<1>;", ErrorKind::InvalidTypeParameter),
            ("a:prop<248,sha1,1>;", ErrorKind::InvalidTypeParameter),
            ("a uint<8>;", ErrorKind::InvalidTypeParameter),
        ];
        for (dsl, kind) in cases {
            assert_eq!(parse_type(dsl).unwrap_err().kind(), kind, "{dsl}");
        }
    }

    #[test]
    fn test_error_aborts_whole_parse() {
        assert!(parse_type("a:uint<8>;b:uint<9>;c:bool;").is_err());
    }

    #[test]
    fn test_dsl_round_trip() {
        let src = "@revocable(10);x:uint<256>;p:prop<64,custom,3>;b:bool;";
        let tp = parse_type(src).unwrap();
        assert_eq!(parse_type(&tp.to_dsl()).unwrap(), tp);
    }
}
