//! Lightweight type sniffing for `describe`: guess what a field holds by
//! trying the narrow shapes first.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::format::parse_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Int,
    Float,
    Date,
    Datetime,
    Duration,
    Text,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Int => "integer",
            Kind::Float => "float",
            Kind::Date => "date",
            Kind::Datetime => "datetime",
            Kind::Duration => "duration",
            Kind::Text => "string",
        };
        f.write_str(name)
    }
}

pub fn sniff(value: &str) -> Kind {
    let value = value.trim();
    if value.is_empty() {
        return Kind::Null;
    }
    if value.parse::<i64>().is_ok() {
        return Kind::Int;
    }
    if value.parse::<f64>().is_ok() {
        return Kind::Float;
    }
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return Kind::Date;
    }
    if DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok()
    {
        return Kind::Datetime;
    }
    if parse_duration(value).is_some() {
        return Kind::Duration;
    }
    Kind::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(sniff(""), Kind::Null);
        assert_eq!(sniff("42"), Kind::Int);
        assert_eq!(sniff("4.2"), Kind::Float);
        assert_eq!(sniff("2024-03-01"), Kind::Date);
        assert_eq!(sniff("2024-03-01 10:00:00"), Kind::Datetime);
        assert_eq!(sniff("2024-03-01T10:00:00Z"), Kind::Datetime);
        assert_eq!(sniff("1h30m"), Kind::Duration);
        assert_eq!(sniff("carrot"), Kind::Text);
    }
}
