//! `{$name}` parameter interpolation inside literal text, using `nom`.
//!
//! Each token is matched on its own, so `"{$a}-{$b}"` substitutes both
//! names. A `{` that does not start a well-formed token is kept as text.

use std::collections::BTreeMap;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::char,
    multi::many0,
    sequence::delimited,
};
use wiring_common::error::{Result, WiringError};
use wiring_common::types::Value;

/// A piece of interpolated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// Verbatim text.
    Text(&'a str),
    /// `{$name}` placeholder.
    Token(&'a str),
}

fn token(input: &str) -> IResult<&str, Segment<'_>> {
    let (input, name) =
        delimited(tag("{$"), take_while1(|c: char| c != '}' && c != '{'), char('}'))
            .parse(input)?;
    Ok((input, Segment::Token(name)))
}

fn text(input: &str) -> IResult<&str, Segment<'_>> {
    let (input, chunk) = alt((take_till1(|c: char| c == '{'), tag("{"))).parse(input)?;
    Ok((input, Segment::Text(chunk)))
}

fn segments(input: &str) -> IResult<&str, Vec<Segment<'_>>> {
    many0(alt((token, text))).parse(input)
}

/// Substitutes every `{$name}` token in `template` with the display form of
/// the matching parameter.
///
/// Unknown names, and names bound to `null`, are replaced by the bare name
/// unless `strict` is set.
///
/// # Errors
///
/// Returns an undefined-parameter error for an unknown name in strict mode.
pub fn interpolate(
    template: &str,
    parameters: &BTreeMap<String, Value>,
    strict: bool,
) -> Result<String> {
    if !template.contains("{$") {
        return Ok(template.to_owned());
    }
    let Ok((rest, parts)) = segments(template) else {
        return Ok(template.to_owned());
    };
    let mut out = String::with_capacity(template.len());
    for part in parts {
        match part {
            Segment::Text(chunk) => out.push_str(chunk),
            Segment::Token(name) => match parameters.get(name).filter(|value| !value.is_null()) {
                Some(value) => out.push_str(&value.to_string()),
                None if strict => {
                    return Err(WiringError::UndefinedParameter {
                        name: name.to_owned(),
                    });
                }
                None => {
                    tracing::debug!(name, "interpolating unknown parameter as its name");
                    out.push_str(name);
                }
            },
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let out = interpolate("plain {text}", &BTreeMap::new(), true).expect("interpolate");
        assert_eq!(out, "plain {text}");
    }

    #[test]
    fn single_token_is_substituted() {
        let p = params(&[("param", Value::from("interpolated"))]);
        let out = interpolate("value {$param}", &p, false).expect("interpolate");
        assert_eq!(out, "value interpolated");
    }

    #[test]
    fn each_token_is_matched_separately() {
        let p = params(&[("a", Value::from("x")), ("b", Value::Int(2))]);
        let out = interpolate("{$a}-{$b}/{$a}", &p, false).expect("interpolate");
        assert_eq!(out, "x-2/x");
    }

    #[test]
    fn unknown_token_becomes_bare_name() {
        let out = interpolate("home: {$home}", &BTreeMap::new(), false).expect("interpolate");
        assert_eq!(out, "home: home");
    }

    #[test]
    fn unknown_token_in_strict_mode_fails() {
        let err = interpolate("home: {$home}", &BTreeMap::new(), true).unwrap_err();
        assert!(matches!(err, WiringError::UndefinedParameter { name } if name == "home"));
    }

    #[test]
    fn null_parameter_counts_as_unknown() {
        let p = params(&[("home", Value::Null)]);
        let out = interpolate("{$home}/cache", &p, false).expect("interpolate");
        assert_eq!(out, "home/cache");
        assert!(interpolate("{$home}", &p, true).is_err());
    }

    #[test]
    fn malformed_tokens_are_kept_as_text() {
        let p = params(&[("b", Value::from("B"))]);
        let out = interpolate("{$a {$b} {$} {$open", &p, true).expect("interpolate");
        assert_eq!(out, "{$a B {$} {$open");
    }
}
