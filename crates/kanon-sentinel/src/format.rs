//! `format` keyword checks.
//!
//! A format constrains values of one JSON kind only; values of any other
//! kind pass here and are left to the type check. Unknown formats pass.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate};
use kanon_core::Format;
use regex::Regex;
use serde_json::Value;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .expect("email pattern compiles")
});

/// Checks `value` against `format`.
///
/// Returns a short description of the expected shape on failure.
pub fn check(format: &Format, value: &Value) -> Result<(), String> {
    match value {
        Value::String(s) => check_str(format, s),
        Value::Number(n) => check_number(format, n),
        _ => Ok(()),
    }
}

fn check_str(format: &Format, s: &str) -> Result<(), String> {
    let ok = match format {
        Format::Email => EMAIL.is_match(s),
        Format::Uuid => uuid::Uuid::parse_str(s).is_ok() && s.len() == 36,
        Format::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        Format::DateTime => DateTime::parse_from_rfc3339(s).is_ok(),
        Format::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
        Format::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
        Format::Byte => STANDARD.decode(s).is_ok(),
        _ => true,
    };

    if ok {
        Ok(())
    } else {
        Err(format!("'{s}' is not a valid {format}"))
    }
}

fn check_number(format: &Format, n: &serde_json::Number) -> Result<(), String> {
    let ok = match format {
        Format::Int32 => whole(n).is_some_and(|v| i32::try_from(v).is_ok()),
        Format::Int64 => whole(n).is_some(),
        _ => true,
    };

    if ok {
        Ok(())
    } else {
        Err(format!("{n} is out of range for {format}"))
    }
}

// Integral value of `n`, accepting floats with no fractional part.
#[allow(clippy::cast_possible_truncation)]
fn whole(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e18)
            .map(|f| f as i64)
    })
}
