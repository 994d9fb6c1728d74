//! `%` format strings
//!
//! Grammar of the body of a string on the left of `%` (after the quotes are removed):
//!
//!     format  ::= (percent | spec | text)*
//!     percent ::= "%%"
//!     spec    ::= "%" ["(" key ")"] flags* [width] ["." precision] [length] conversion
//!     flags   ::= "#" | "0" | "-" | " " | "+"
//!     width   ::= digits | "*"
//!     length  ::= "h" | "l" | "L"
//!
//! A `%` that does not start a complete spec makes the whole string unparseable, which is
//! what Python's `%` operator reports as an error too.

use super::ConversionError;
use chumsky::prelude::*;

/// One `%` conversion, e.g. `%-10.2f`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversionSpec {
    /// Mapping key, as in `%(name)s`
    pub key: Option<String>,
    pub flags: String,
    pub width: String,
    pub precision: Option<String>,
    pub conversion: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    /// `%%`
    Percent,
    Spec(ConversionSpec),
}

fn digits() -> impl Parser<char, String, Error = Simple<char>> + Clone {
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
}

fn format_string() -> impl Parser<char, Vec<Piece>, Error = Simple<char>> {
    let percent = just("%%").to(Piece::Percent);

    let key = none_of(")")
        .repeated()
        .collect::<String>()
        .delimited_by(just('('), just(')'));
    let flags = one_of("#0- +").repeated().collect::<String>();
    let width = just('*')
        .map(|c: char| c.to_string())
        .or(digits())
        .or_not()
        .map(Option::unwrap_or_default);
    let precision = just('.').ignore_then(digits()).or_not();
    let length = one_of("hlL").or_not().ignored();
    let conversion = one_of("diouxXeEfFgGcrsa");

    let spec = just('%')
        .ignore_then(key.or_not())
        .then(flags)
        .then(width)
        .then(precision)
        .then_ignore(length)
        .then(conversion)
        .map(|((((key, flags), width), precision), conversion)| {
            Piece::Spec(ConversionSpec {
                key,
                flags,
                width,
                precision,
                conversion,
            })
        });

    let text = none_of("%")
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Piece::Text);

    choice((percent, spec, text)).repeated().then_ignore(end())
}

/// Split a format string into literal text and conversions
pub fn parse_format(body: &str) -> Result<Vec<Piece>, ConversionError> {
    format_string().parse(body).map_err(|errors| {
        let position = errors.first().map(|e| e.span().start).unwrap_or(0);
        ConversionError::BadFormat(position)
    })
}

/// Literal text of an f-string: braces are doubled, `%%` is a plain `%`
pub fn render_text(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// The `{...}` field that formats `value` the way `spec` would
pub fn render_field(value: &str, spec: &ConversionSpec) -> Result<String, ConversionError> {
    if spec.key.is_some() {
        return Err(ConversionError::MappingKey);
    }
    if spec.width == "*" || spec.precision.as_deref() == Some("*") {
        return Err(ConversionError::StarWidth);
    }

    // Conversions that produce a string keep Python's right alignment
    let (conversion, type_char) = match spec.conversion {
        'r' => ("!r", None),
        'a' => ("!a", None),
        's' => ("!s", None),
        'i' | 'u' => ("", Some('d')),
        other => ("", Some(other)),
    };
    let left = spec.flags.contains('-');

    let mut format_spec = String::new();
    if left {
        format_spec.push('<');
    } else if type_char.is_none() && !spec.width.is_empty() {
        format_spec.push('>');
    }
    if type_char.is_some() {
        if spec.flags.contains('+') {
            format_spec.push('+');
        } else if spec.flags.contains(' ') {
            format_spec.push(' ');
        }
        if spec.flags.contains('#') {
            format_spec.push('#');
        }
        if spec.flags.contains('0') && !left {
            format_spec.push('0');
        }
    }
    format_spec.push_str(&spec.width);
    if let Some(precision) = &spec.precision {
        format_spec.push('.');
        format_spec.push_str(precision);
    }
    if let Some(type_char) = type_char {
        format_spec.push(type_char);
    }

    // A leading brace would read as a doubled brace
    let value = if value.starts_with('{') {
        format!(" {} ", value)
    } else {
        value.to_string()
    };

    let mut field = String::from("{");
    field.push_str(&value);
    if spec.conversion != 's' || !format_spec.is_empty() {
        field.push_str(conversion);
    }
    if !format_spec.is_empty() {
        field.push(':');
        field.push_str(&format_spec);
    }
    field.push('}');
    Ok(field)
}
