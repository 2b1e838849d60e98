//! Per-column formatters.
//!
//! A formatter spec is `"index:kind:pattern"` (split on the first two colons,
//! so strftime patterns keep theirs). Formatters rewrite their column in
//! place, in declaration order, before selection and filtering. Every spec is
//! validated when the registry is built; at row time the only possible
//! failure is a value the kind cannot parse, which aborts the stream.

use std::collections::HashMap;
use std::fmt;
use std::fs;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rand::seq::SliceRandom;

/// Errors raised while building or running a formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// Configuration-time: malformed spec, unknown kind or pattern,
    /// unusable column index, unreadable enum file
    Spec(String),
    /// Row-time: the input value does not parse as the declared kind
    Value { kind: String, value: String },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Spec(msg) => write!(f, "invalid formatter: {}", msg),
            FormatError::Value { kind, value } => {
                write!(f, "can not format '{}' as {}", value, kind)
            }
        }
    }
}

impl std::error::Error for FormatError {}

type Transform = Box<dyn Fn(&str) -> Result<String, FormatError>>;

/// A column rewrite: 0-based index plus the text transform to run.
pub struct Formatter {
    pub index: usize,
    transform: Transform,
}

impl Formatter {
    pub fn apply(&self, value: &str) -> Result<String, FormatError> {
        (self.transform)(value)
    }
}

/// Build the formatter registry from `"index:kind:pattern"` specs.
pub fn parse_specs(specs: &[String]) -> Result<Vec<Formatter>, FormatError> {
    let mut formatters = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut parts = spec.splitn(3, ':');
        let column = parts.next().unwrap_or("");
        let kind = parts.next().unwrap_or("");
        let pattern = parts.next().unwrap_or("");

        let index = column
            .parse::<usize>()
            .map_err(|_| FormatError::Spec(format!("bad column index '{}'", column)))?;
        if index == 0 {
            return Err(FormatError::Spec("column index must be positive".to_string()));
        }
        let transform = build_transform(&kind.to_lowercase(), pattern)?;
        formatters.push(Formatter {
            index: index - 1,
            transform,
        });
    }
    Ok(formatters)
}

fn build_transform(kind: &str, pattern: &str) -> Result<Transform, FormatError> {
    match kind {
        "date" => Ok(date_transform(
            pattern,
            &["%Y-%m-%d", "%Y/%m/%d", "%Y-%j", "%Y/%j"],
            false,
        )),
        "datetime" => Ok(date_transform(pattern, &["%Y-%m-%d %H:%M:%S"], true)),
        "duration" => duration_transform(pattern),
        "timestamp" => Ok(timestamp_transform(pattern)),
        "int" => int_transform(pattern),
        "float" | "double" | "number" => float_transform(pattern),
        "bool" | "boolean" => Ok(bool_transform(pattern)),
        "string" => string_transform(pattern),
        "base64" => Ok(base64_transform(pattern)),
        "size" => size_transform(pattern),
        "enum" => enum_transform(pattern),
        other => Err(FormatError::Spec(format!("unknown column kind '{}'", other))),
    }
}

fn value_error(kind: &str, value: &str) -> FormatError {
    FormatError::Value {
        kind: kind.to_string(),
        value: value.to_string(),
    }
}

fn date_transform(pattern: &str, inputs: &'static [&'static str], with_time: bool) -> Transform {
    let pattern = pattern.to_string();
    let kind = if with_time { "datetime" } else { "date" };
    Box::new(move |v| {
        if pattern.is_empty() {
            return Ok(v.to_string());
        }
        for input in inputs {
            let parsed = if with_time {
                NaiveDateTime::parse_from_str(v, input).ok()
            } else {
                NaiveDate::parse_from_str(v, input)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            };
            if let Some(when) = parsed {
                return Ok(when.format(&pattern).to_string());
            }
        }
        Err(value_error(kind, v))
    })
}

fn duration_transform(resolution: &str) -> Result<Transform, FormatError> {
    match resolution {
        "" | "seconds" | "minutes" => {}
        other => {
            return Err(FormatError::Spec(format!(
                "unknown duration resolution '{}'",
                other
            )))
        }
    }
    let minutes = resolution == "minutes";
    Ok(Box::new(move |v| {
        let seconds = parse_duration(v).ok_or_else(|| value_error("duration", v))?;
        if minutes {
            return Ok(format!("{:.0}", seconds / 60.0));
        }
        // Sub-second inputs are reported as one second, never zero.
        let seconds = if seconds < 1.0 { 1.0 } else { seconds };
        Ok(format!("{:.0}", seconds))
    }))
}

fn timestamp_transform(pattern: &str) -> Transform {
    let pattern = pattern.to_string();
    Box::new(move |v| {
        let epoch = v
            .trim()
            .parse::<i64>()
            .map_err(|_| value_error("timestamp", v))?;
        if pattern.is_empty() {
            return Ok(v.to_string());
        }
        let when = DateTime::from_timestamp(epoch, 0).ok_or_else(|| value_error("timestamp", v))?;
        Ok(when.format(&pattern).to_string())
    })
}

fn int_transform(pattern: &str) -> Result<Transform, FormatError> {
    if pattern == "seconds" {
        return Ok(Box::new(|v| {
            let i = parse_int_auto(v).ok_or_else(|| value_error("int", v))?;
            Ok(human_duration(i))
        }));
    }
    let pattern = if pattern.is_empty() { "%d" } else { pattern };
    let directive = printf::parse(pattern, "dxXob")?;
    Ok(Box::new(move |v| {
        let i = parse_int_auto(v).ok_or_else(|| value_error("int", v))?;
        Ok(directive.render_int(i))
    }))
}

fn float_transform(pattern: &str) -> Result<Transform, FormatError> {
    if pattern == "percent" {
        return Ok(Box::new(|v| {
            let f = v.trim().parse::<f64>().map_err(|_| value_error("float", v))?;
            Ok(format!("{:.2}%", f * 100.0))
        }));
    }
    let pattern = if pattern.is_empty() { "%f" } else { pattern };
    let directive = printf::parse(pattern, "feEg")?;
    Ok(Box::new(move |v| {
        let f = v.trim().parse::<f64>().map_err(|_| value_error("float", v))?;
        Ok(directive.render_float(f))
    }))
}

fn bool_transform(method: &str) -> Transform {
    let (yes, no) = match method {
        "onoff" => ("on", "off"),
        "yesno" => ("yes", "no"),
        "status" => ("enabled", "disabled"),
        "vx" => ("v", "x"),
        _ => ("true", "false"),
    };
    Box::new(move |v| match crate::value::parse_bool(v.trim()) {
        Some(true) => Ok(yes.to_string()),
        Some(false) => Ok(no.to_string()),
        None => Err(value_error("bool", v)),
    })
}

fn string_transform(method: &str) -> Result<Transform, FormatError> {
    match method {
        "" | "title" | "upper" | "lower" | "base" | "dir" | "ext" | "file" | "random" => {}
        other => {
            return Err(FormatError::Spec(format!(
                "unknown string method '{}'",
                other
            )))
        }
    }
    let method = method.to_string();
    Ok(Box::new(move |v| {
        let out = match method.as_str() {
            "title" => crate::functions::title_case(v),
            "upper" => v.to_uppercase(),
            "lower" => v.to_lowercase(),
            "base" => path_base(v).to_string(),
            "dir" => path_dir(v),
            "ext" => path_ext(v).to_string(),
            "file" => {
                let base = path_base(v);
                base.strip_suffix(path_ext(v)).unwrap_or(base).to_string()
            }
            "random" => {
                let mut bytes = v.as_bytes().to_vec();
                bytes.shuffle(&mut rand::thread_rng());
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => v.to_string(),
        };
        Ok(out.trim().to_string())
    }))
}

fn base64_transform(method: &str) -> Transform {
    let url = method == "url";
    Box::new(move |v| {
        let encoded = if url {
            URL_SAFE.encode(v.as_bytes())
        } else {
            STANDARD.encode(v.as_bytes())
        };
        Ok(encoded)
    })
}

fn size_transform(method: &str) -> Result<Transform, FormatError> {
    let iec = match method {
        "" | "si" => false,
        "iec" | "bin" => true,
        other => {
            return Err(FormatError::Spec(format!("unknown size notation '{}'", other)))
        }
    };
    Ok(Box::new(move |v| {
        let f = v.trim().parse::<f64>().map_err(|_| value_error("size", v))?;
        Ok(human_size(f, iec))
    }))
}

fn enum_transform(pattern: &str) -> Result<Transform, FormatError> {
    let mapping = if let Some(path) = pattern.strip_prefix('@') {
        enum_from_file(path)?
    } else {
        enum_from_inline(pattern)
    };
    Ok(Box::new(move |v| {
        Ok(mapping.get(v).cloned().unwrap_or_else(|| v.to_string()))
    }))
}

fn enum_from_inline(pattern: &str) -> HashMap<String, String> {
    let tokens: Vec<&str> = pattern
        .split(|c| c == '=' || c == ',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    let mut mapping = HashMap::new();
    for pair in tokens.chunks(2) {
        if let [key, value] = pair {
            mapping.insert(key.to_string(), value.to_string());
        }
    }
    mapping
}

// One mapping per line: `key value`. A line with only a key aliases it to
// the previous mapping's value. `#` starts a comment line.
fn enum_from_file(path: &str) -> Result<HashMap<String, String>, FormatError> {
    let content = fs::read_to_string(path)
        .map_err(|e| FormatError::Spec(format!("enum file '{}': {}", path, e)))?;
    let mut mapping = HashMap::new();
    let mut last_key: Option<String> = None;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        let key = match words.next() {
            Some(k) => k.to_string(),
            None => continue,
        };
        match words.next() {
            Some(value) => {
                mapping.insert(key.clone(), value.to_string());
                last_key = Some(key);
            }
            None => {
                let value = last_key
                    .as_ref()
                    .and_then(|k| mapping.get(k))
                    .cloned()
                    .unwrap_or_default();
                mapping.insert(key, value);
            }
        }
    }
    Ok(mapping)
}

fn path_base(v: &str) -> &str {
    v.trim_end_matches('/').rsplit('/').next().unwrap_or(v)
}

fn path_dir(v: &str) -> String {
    match v.trim_end_matches('/').rfind('/') {
        Some(0) => "/".to_string(),
        Some(at) => v[..at].to_string(),
        None => ".".to_string(),
    }
}

fn path_ext(v: &str) -> &str {
    let base = path_base(v);
    match base.rfind('.') {
        Some(at) if at > 0 => &base[at..],
        _ => "",
    }
}

/// Parse a compound duration literal (`1h2m3s`, `300ms`, `1.5h`) into
/// seconds. `0` alone is accepted; negative durations clamp to zero.
pub fn parse_duration(v: &str) -> Option<f64> {
    let mut rest = v.trim();
    if rest.is_empty() {
        return None;
    }
    let negative = rest.starts_with('-');
    if negative || rest.starts_with('+') {
        rest = &rest[1..];
    }
    if rest == "0" {
        return Some(0.0);
    }
    let mut total = 0.0;
    let mut matched = false;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let number: f64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let (scale, used) = if rest.starts_with("ns") {
            (1e-9, 2)
        } else if rest.starts_with("us") || rest.starts_with("µs") {
            (1e-6, if rest.starts_with("µs") { "µs".len() } else { 2 })
        } else if rest.starts_with("ms") {
            (1e-3, 2)
        } else if rest.starts_with('s') {
            (1.0, 1)
        } else if rest.starts_with('m') {
            (60.0, 1)
        } else if rest.starts_with('h') {
            (3600.0, 1)
        } else {
            return None;
        };
        total += number * scale;
        rest = &rest[used..];
        matched = true;
    }
    if !matched {
        return None;
    }
    Some(if negative { 0.0 } else { total })
}

/// Render whole seconds the way durations are usually written: `1h0m30s`,
/// `1m1s`, `45s`.
fn human_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "0s".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

fn human_size(value: f64, iec: bool) -> String {
    let (base, units): (f64, &[&str]) = if iec {
        (1024.0, &["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"])
    } else {
        (1000.0, &["B", "kB", "MB", "GB", "TB", "PB", "EB"])
    };
    let mut scaled = value;
    let mut unit = units[0];
    for next in &units[1..] {
        if scaled.abs() < base {
            break;
        }
        scaled /= base;
        unit = next;
    }
    let mut text = format!("{:.1}", scaled);
    if let Some(stripped) = text.strip_suffix(".0") {
        text = stripped.to_string();
    }
    format!("{}{}", text, unit)
}

// Base prefixes the way strconv reads them: 0x hex, 0b binary, 0o or a bare
// leading zero octal, otherwise decimal.
fn parse_int_auto(v: &str) -> Option<i64> {
    let trimmed = v.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() {
        return None;
    }
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -parsed } else { parsed })
}

mod printf {
    //! A printf-style directive: literal text around one `%` verb with
    //! optional zero/left flags, width and precision. Just enough of the
    //! classic syntax for column patterns like `%05d` or `%8.2f`.

    use super::FormatError;

    pub struct Directive {
        prefix: String,
        suffix: String,
        zero: bool,
        left: bool,
        width: usize,
        precision: Option<usize>,
        verb: char,
    }

    pub fn parse(pattern: &str, verbs: &str) -> Result<Directive, FormatError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut at = 0;
        let mut prefix = String::new();
        while at < chars.len() {
            if chars[at] == '%' {
                if chars.get(at + 1) == Some(&'%') {
                    prefix.push('%');
                    at += 2;
                    continue;
                }
                break;
            }
            prefix.push(chars[at]);
            at += 1;
        }
        if at >= chars.len() {
            return Err(FormatError::Spec(format!("pattern '{}' has no verb", pattern)));
        }
        at += 1; // '%'
        let mut zero = false;
        let mut left = false;
        while at < chars.len() && (chars[at] == '0' || chars[at] == '-') {
            match chars[at] {
                '0' => zero = true,
                _ => left = true,
            }
            at += 1;
        }
        let mut width = 0usize;
        while at < chars.len() && chars[at].is_ascii_digit() {
            width = width * 10 + chars[at] as usize - '0' as usize;
            at += 1;
        }
        let mut precision = None;
        if at < chars.len() && chars[at] == '.' {
            at += 1;
            let mut p = 0usize;
            while at < chars.len() && chars[at].is_ascii_digit() {
                p = p * 10 + chars[at] as usize - '0' as usize;
                at += 1;
            }
            precision = Some(p);
        }
        let verb = match chars.get(at) {
            Some(v) if verbs.contains(*v) => *v,
            Some(v) => {
                return Err(FormatError::Spec(format!(
                    "unsupported verb '%{}' in pattern '{}'",
                    v, pattern
                )))
            }
            None => {
                return Err(FormatError::Spec(format!("pattern '{}' has no verb", pattern)))
            }
        };
        at += 1;
        let suffix: String = chars[at..].iter().collect::<String>().replace("%%", "%");
        Ok(Directive {
            prefix,
            suffix,
            zero,
            left,
            width,
            precision,
            verb,
        })
    }

    impl Directive {
        pub fn render_int(&self, value: i64) -> String {
            let body = match self.verb {
                'x' => format!("{:x}", value),
                'X' => format!("{:X}", value),
                'o' => format!("{:o}", value),
                'b' => format!("{:b}", value),
                _ => format!("{}", value),
            };
            self.assemble(body)
        }

        pub fn render_float(&self, value: f64) -> String {
            let body = match self.verb {
                'e' => format!("{:e}", value),
                'E' => format!("{:E}", value),
                'g' => format!("{}", value),
                _ => format!("{:.*}", self.precision.unwrap_or(6), value),
            };
            self.assemble(body)
        }

        fn assemble(&self, body: String) -> String {
            let padded = if body.len() >= self.width {
                body
            } else if self.left {
                format!("{:<width$}", body, width = self.width)
            } else if self.zero {
                // Zeroes go between the sign and the digits.
                let (sign, digits) = match body.strip_prefix('-') {
                    Some(rest) => ("-", rest),
                    None => ("", body.as_str()),
                };
                format!("{}{:0>width$}", sign, digits, width = self.width - sign.len())
            } else {
                format!("{:>width$}", body, width = self.width)
            };
            format!("{}{}{}", self.prefix, padded, self.suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_splits_on_first_two_colons() {
        let fs = parse_specs(&["1:datetime:%H:%M:%S".to_string()]).unwrap();
        assert_eq!(fs[0].index, 0);
        assert_eq!(fs[0].apply("2024-03-01 10:20:30").unwrap(), "10:20:30");
    }

    #[test]
    fn unknown_kind_fails_at_configuration() {
        assert!(matches!(
            parse_specs(&["1:fancy:".to_string()]),
            Err(FormatError::Spec(_))
        ));
        assert!(matches!(
            parse_specs(&["0:int:".to_string()]),
            Err(FormatError::Spec(_))
        ));
    }

    #[test]
    fn int_patterns() {
        let fs = parse_specs(&["1:int:%05d".to_string()]).unwrap();
        assert_eq!(fs[0].apply("42").unwrap(), "00042");
        let fs = parse_specs(&["1:int:%x".to_string()]).unwrap();
        assert_eq!(fs[0].apply("255").unwrap(), "ff");
        let fs = parse_specs(&["1:int:seconds".to_string()]).unwrap();
        assert_eq!(fs[0].apply("3630").unwrap(), "1h0m30s");
    }

    #[test]
    fn float_percent() {
        let fs = parse_specs(&["1:float:percent".to_string()]).unwrap();
        assert_eq!(fs[0].apply("0.25").unwrap(), "25.00%");
    }

    #[test]
    fn duration_resolutions() {
        let fs = parse_specs(&["1:duration:".to_string()]).unwrap();
        assert_eq!(fs[0].apply("2m30s").unwrap(), "150");
        assert_eq!(fs[0].apply("300ms").unwrap(), "1");
        let fs = parse_specs(&["1:duration:minutes".to_string()]).unwrap();
        assert_eq!(fs[0].apply("2h").unwrap(), "120");
    }

    #[test]
    fn sizes() {
        assert_eq!(human_size(999.0, false), "999B");
        assert_eq!(human_size(1500.0, false), "1.5kB");
        assert_eq!(human_size(1536.0, true), "1.5KiB");
        assert_eq!(human_size(1000.0, false), "1kB");
    }

    #[test]
    fn enum_inline_mapping() {
        let fs = parse_specs(&["1:enum:a=alpha, b=beta".to_string()]).unwrap();
        assert_eq!(fs[0].apply("a").unwrap(), "alpha");
        assert_eq!(fs[0].apply("b").unwrap(), "beta");
        assert_eq!(fs[0].apply("c").unwrap(), "c");
    }

    #[test]
    fn bool_methods() {
        let fs = parse_specs(&["1:bool:yesno".to_string()]).unwrap();
        assert_eq!(fs[0].apply("true").unwrap(), "yes");
        assert_eq!(fs[0].apply("0").unwrap(), "no");
        assert!(fs[0].apply("maybe").is_err());
    }

    #[test]
    fn date_inputs() {
        let fs = parse_specs(&["1:date:%d/%m/%Y".to_string()]).unwrap();
        assert_eq!(fs[0].apply("2024-03-01").unwrap(), "01/03/2024");
        assert_eq!(fs[0].apply("2024/03/01").unwrap(), "01/03/2024");
        assert_eq!(fs[0].apply("2024-061").unwrap(), "01/03/2024");
        assert!(fs[0].apply("yesterday").is_err());
    }

    #[test]
    fn base64_alphabets() {
        let fs = parse_specs(&["1:base64:".to_string()]).unwrap();
        assert_eq!(fs[0].apply("hi").unwrap(), "aGk=");
    }
}
