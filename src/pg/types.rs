//! PostgreSQL type OIDs and text-format decoding.
//!
//! This module turns column data in the server's text output format into
//! [`Cell`]s. Reference: https://www.postgresql.org/docs/current/datatype.html

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use super::error::{PgError, PgResult};
use crate::cell::{Cell, Interval, Scalar};

// ============================================================================
// Type OIDs
// ============================================================================

/// PostgreSQL type object identifiers (OIDs).
///
/// These are the built-in type OIDs from PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Oid(pub i32);

impl Oid {
    // Boolean types
    pub const BOOL: Oid = Oid(16);

    // Binary data
    pub const BYTEA: Oid = Oid(17);

    // Character types
    pub const CHAR: Oid = Oid(18);
    pub const NAME: Oid = Oid(19);

    // Integer types
    pub const INT8: Oid = Oid(20);
    pub const INT2: Oid = Oid(21);
    pub const INT4: Oid = Oid(23);

    // Text types
    pub const TEXT: Oid = Oid(25);

    // OID type
    pub const OID_TYPE: Oid = Oid(26);

    // Floating point types
    pub const FLOAT4: Oid = Oid(700);
    pub const FLOAT8: Oid = Oid(701);

    // String types
    pub const VARCHAR: Oid = Oid(1043);
    pub const BPCHAR: Oid = Oid(1042);

    // Date/time types
    pub const DATE: Oid = Oid(1082);
    pub const TIMESTAMP: Oid = Oid(1114);
    pub const TIMESTAMPTZ: Oid = Oid(1184);
    pub const INTERVAL: Oid = Oid(1186);

    // UUID
    pub const UUID: Oid = Oid(2950);

    // JSON types
    pub const JSON: Oid = Oid(114);
    pub const JSONB: Oid = Oid(3802);

    // Numeric
    pub const NUMERIC: Oid = Oid(1700);

    // Array types
    pub const JSON_ARRAY: Oid = Oid(199);
    pub const BOOL_ARRAY: Oid = Oid(1000);
    pub const INT2_ARRAY: Oid = Oid(1005);
    pub const INT4_ARRAY: Oid = Oid(1007);
    pub const TEXT_ARRAY: Oid = Oid(1009);
    pub const VARCHAR_ARRAY: Oid = Oid(1015);
    pub const INT8_ARRAY: Oid = Oid(1016);
    pub const FLOAT4_ARRAY: Oid = Oid(1021);
    pub const FLOAT8_ARRAY: Oid = Oid(1022);
    pub const TIMESTAMP_ARRAY: Oid = Oid(1115);
    pub const DATE_ARRAY: Oid = Oid(1182);
    pub const TIMESTAMPTZ_ARRAY: Oid = Oid(1185);
    pub const UUID_ARRAY: Oid = Oid(2951);
    pub const JSONB_ARRAY: Oid = Oid(3807);

    /// Get the raw i32 value
    #[inline]
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Element type of a one-dimensional array type.
    pub fn element(self) -> Option<Oid> {
        let elem = match self {
            Oid::BOOL_ARRAY => Oid::BOOL,
            Oid::INT2_ARRAY => Oid::INT2,
            Oid::INT4_ARRAY => Oid::INT4,
            Oid::INT8_ARRAY => Oid::INT8,
            Oid::TEXT_ARRAY => Oid::TEXT,
            Oid::VARCHAR_ARRAY => Oid::VARCHAR,
            Oid::FLOAT4_ARRAY => Oid::FLOAT4,
            Oid::FLOAT8_ARRAY => Oid::FLOAT8,
            Oid::TIMESTAMP_ARRAY => Oid::TIMESTAMP,
            Oid::TIMESTAMPTZ_ARRAY => Oid::TIMESTAMPTZ,
            Oid::DATE_ARRAY => Oid::DATE,
            Oid::UUID_ARRAY => Oid::UUID,
            Oid::JSON_ARRAY => Oid::JSON,
            Oid::JSONB_ARRAY => Oid::JSONB,
            _ => return None,
        };
        Some(elem)
    }
}

// ============================================================================
// Text format decoding
// ============================================================================

/// Decode one column value from text format. `None` is SQL NULL.
pub fn decode_text(oid: Oid, data: Option<&[u8]>) -> PgResult<Cell> {
    let Some(data) = data else {
        return Ok(Cell::Null);
    };
    let text = std::str::from_utf8(data)
        .map_err(|e| PgError::Type(format!("Invalid UTF-8 for OID {}: {}", oid.as_i32(), e)))?;
    decode_str(oid, text)
}

fn decode_str(oid: Oid, text: &str) -> PgResult<Cell> {
    if let Some(elem) = oid.element() {
        return decode_array(elem, text);
    }

    let scalar = match oid {
        Oid::BOOL => match text {
            "t" | "true" => Scalar::Bool(true),
            "f" | "false" => Scalar::Bool(false),
            _ => return Err(PgError::Type(format!("Invalid BOOL: {}", text))),
        },

        Oid::INT2 => text
            .parse::<i16>()
            .map(|v| Scalar::Int(v.into()))
            .map_err(|e| PgError::Type(format!("Invalid INT2: {}", e)))?,

        Oid::INT4 => text
            .parse::<i32>()
            .map(|v| Scalar::Int(v.into()))
            .map_err(|e| PgError::Type(format!("Invalid INT4: {}", e)))?,

        Oid::INT8 | Oid::OID_TYPE => text
            .parse::<i64>()
            .map(Scalar::Int)
            .map_err(|e| PgError::Type(format!("Invalid INT8: {}", e)))?,

        Oid::FLOAT4 | Oid::FLOAT8 | Oid::NUMERIC => text
            .parse::<f64>()
            .map(Scalar::Float)
            .map_err(|e| PgError::Type(format!("Invalid FLOAT: {}", e)))?,

        Oid::BYTEA => Scalar::Bytes(decode_bytea_hex(text)?),

        Oid::UUID => Uuid::parse_str(text)
            .map(Scalar::Uuid)
            .map_err(|e| PgError::Type(format!("Invalid UUID: {}", e)))?,

        Oid::DATE => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Scalar::Date)
            .map_err(|e| PgError::Type(format!("Invalid DATE: {}", e)))?,

        Oid::TIMESTAMP => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
            .map(Scalar::Timestamp)
            .map_err(|e| PgError::Type(format!("Invalid TIMESTAMP: {}", e)))?,

        Oid::TIMESTAMPTZ => DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z")
            .map(|d| Scalar::TimestampTz(d.with_timezone(&Utc)))
            .map_err(|e| PgError::Type(format!("Invalid TIMESTAMPTZ: {}", e)))?,

        Oid::INTERVAL => Scalar::Interval(parse_interval(text)?),

        Oid::JSON | Oid::JSONB => {
            return serde_json::from_str(text)
                .map(Cell::from_json)
                .map_err(|e| PgError::Type(format!("Invalid JSON: {}", e)));
        }

        // Text types and anything we don't know: keep the text
        _ => Scalar::Text(text.to_string()),
    };

    Ok(Cell::Scalar(scalar))
}

/// `bytea` in hex output format (`\x0a1b...`).
fn decode_bytea_hex(text: &str) -> PgResult<Vec<u8>> {
    let hex = text
        .strip_prefix("\\x")
        .ok_or_else(|| PgError::Type("BYTEA must use hex output format".to_string()))?;
    if hex.len() % 2 != 0 {
        return Err(PgError::Type(format!("Odd BYTEA hex length: {}", hex.len())));
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|p| u8::from_str_radix(p, 16).ok())
                .ok_or_else(|| PgError::Type(format!("Invalid BYTEA hex: {}", text)))
        })
        .collect()
}

/// Interval in the default `postgres` output style, e.g.
/// `1 year 2 mons -3 days +04:05:06.5`.
fn parse_interval(text: &str) -> PgResult<Interval> {
    let invalid = || PgError::Type(format!("Invalid INTERVAL: {}", text));
    let mut interval = Interval::default();
    let mut tokens = text.split_whitespace();

    while let Some(token) = tokens.next() {
        if token.contains(':') {
            interval.microseconds = parse_clock(token)
                .and_then(|us| interval.microseconds.checked_add(us))
                .ok_or_else(invalid)?;
            continue;
        }
        let amount: i32 = token.parse().map_err(|_| invalid())?;
        let unit = tokens.next().ok_or_else(invalid)?;
        let applied = match unit.trim_end_matches('s') {
            "year" => amount
                .checked_mul(12)
                .and_then(|m| interval.months.checked_add(m))
                .map(|m| interval.months = m),
            "mon" => interval.months.checked_add(amount).map(|m| interval.months = m),
            "day" => interval.days.checked_add(amount).map(|d| interval.days = d),
            _ => return Err(invalid()),
        };
        applied.ok_or_else(invalid)?;
    }

    Ok(interval)
}

/// `[+-]HH:MM:SS[.ffffff]` to microseconds.
fn parse_clock(token: &str) -> Option<i64> {
    let (sign, body) = match token.as_bytes().first()? {
        b'-' => (-1, &token[1..]),
        b'+' => (1, &token[1..]),
        _ => (1, token),
    };
    let mut parts = body.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds = parts.next().unwrap_or("0");
    if parts.next().is_some() {
        return None;
    }
    let (whole, frac) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: i64 = whole.parse().ok()?;
    let micros: i64 = if frac.is_empty() {
        0
    } else {
        if frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        format!("{:0<6}", frac).parse().ok()?
    };
    let seconds = hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(whole)?;
    seconds
        .checked_mul(1_000_000)?
        .checked_add(micros)?
        .checked_mul(sign)
}

/// One-dimensional array literal, e.g. `{1,2,NULL}` or `{"a b","c\"d"}`.
fn decode_array(elem: Oid, text: &str) -> PgResult<Cell> {
    // Skip explicit bounds decoration like `[0:2]={...}`
    let body = match text.find('=') {
        Some(pos) if text.starts_with('[') => &text[pos + 1..],
        _ => text,
    };
    let inner = body
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .ok_or_else(|| PgError::Type(format!("Invalid array literal: {}", text)))?;

    let mut cells = Vec::new();
    for item in split_array_items(inner)? {
        let cell = match item {
            None => Cell::Null,
            Some(raw) => decode_str(elem, &raw)?,
        };
        cells.push(cell);
    }
    Ok(Cell::Array(cells))
}

/// Split the inside of an array literal into items; unquoted `NULL` is `None`.
fn split_array_items(inner: &str) -> PgResult<Vec<Option<String>>> {
    let mut items = Vec::new();
    if inner.trim().is_empty() {
        return Ok(items);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let item = match chars.peek() {
            Some('{') => {
                return Err(PgError::Type(
                    "Multi-dimensional arrays are not supported".to_string(),
                ))
            }
            Some('"') => {
                chars.next();
                let mut out = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(c) => out.push(c),
                            None => break,
                        },
                        Some('"') => break,
                        Some(c) => out.push(c),
                        None => {
                            return Err(PgError::Type("Unterminated quoted array item".to_string()))
                        }
                    }
                }
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                Some(out)
            }
            _ => {
                let mut out = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    out.push(c);
                }
                let out = out.trim_end().to_string();
                if out.eq_ignore_ascii_case("NULL") {
                    None
                } else {
                    Some(out)
                }
            }
        };
        items.push(item);

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(c) => {
                return Err(PgError::Type(format!(
                    "Unexpected '{}' in array literal",
                    c
                )))
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_element_types() {
        assert_eq!(Oid::TEXT_ARRAY.element(), Some(Oid::TEXT));
        assert_eq!(Oid::INT4_ARRAY.element(), Some(Oid::INT4));
        assert_eq!(Oid::TEXT.element(), None);
    }

    #[test]
    fn test_clock_parsing() {
        assert_eq!(parse_clock("00:00:01"), Some(1_000_000));
        assert_eq!(parse_clock("-01:00:00"), Some(-3_600_000_000));
        assert_eq!(parse_clock("00:00:00.25"), Some(250_000));
        assert_eq!(parse_clock("00:00:00.1234567"), None);
        assert_eq!(parse_clock("bad"), None);
    }

    #[test]
    fn test_split_items() {
        let items = split_array_items(r#"a, "b c" ,NULL,"NULL","q\"x""#).unwrap();
        assert_eq!(
            items,
            vec![
                Some("a".to_string()),
                Some("b c".to_string()),
                None,
                Some("NULL".to_string()),
                Some("q\"x".to_string()),
            ]
        );
        assert!(split_array_items("").unwrap().is_empty());
        assert!(split_array_items("{1},{2}").is_err());
    }
}
