use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-entered quantity that may have been stored as a number or as text.
///
/// Set weights, reps and cardio durations come straight from form input, so
/// both `100` and `"100"` (or `"20 min"`) show up in stored documents. The
/// original representation is kept so a document round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(serde_json::Number),
    Text(String),
}

impl Measure {
    /// Numeric value, parsing text the way a lenient form field would.
    ///
    /// Returns `None` for text that does not start with a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Measure::Number(n) => n.as_f64(),
            Measure::Text(s) => leading_number(s.trim()).and_then(|n| n.parse().ok()),
        }
    }

    /// Integer value with `0` as the fallback for anything unparseable.
    ///
    /// Fractions are truncated toward zero: `"12.7g"` becomes `12`.
    pub fn to_int_or_zero(&self) -> i64 {
        match self.as_f64() {
            Some(v) if v.is_finite() => v.trunc() as i64,
            _ => 0,
        }
    }
}

impl From<i64> for Measure {
    fn from(value: i64) -> Self {
        Measure::Number(value.into())
    }
}

impl From<i32> for Measure {
    fn from(value: i32) -> Self {
        Measure::Number(value.into())
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(Measure::Number)
            .unwrap_or_else(|| Measure::Text(value.to_string()))
    }
}

impl From<&str> for Measure {
    fn from(value: &str) -> Self {
        Measure::Text(value.to_string())
    }
}

impl From<String> for Measure {
    fn from(value: String) -> Self {
        Measure::Text(value)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Number(n) => write!(f, "{}", n),
            Measure::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Longest prefix of `s` that looks like a decimal number (`-12.5` in `-12.5kg`).
fn leading_number(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > end + 1 {
            end = frac_end;
        }
    }
    if end == digits_start {
        return None;
    }
    Some(&s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_text_parse() {
        assert_eq!(Measure::from(80).as_f64(), Some(80.0));
        assert_eq!(Measure::from("62.5").as_f64(), Some(62.5));
        assert_eq!(Measure::from(" 10 reps").as_f64(), Some(10.0));
        assert_eq!(Measure::from("heavy").as_f64(), None);
        assert_eq!(Measure::from("").as_f64(), None);
    }

    #[test]
    fn test_to_int_or_zero() {
        assert_eq!(Measure::from("12.7g").to_int_or_zero(), 12);
        assert_eq!(Measure::from(350).to_int_or_zero(), 350);
        assert_eq!(Measure::from(9.9).to_int_or_zero(), 9);
        assert_eq!(Measure::from("abc").to_int_or_zero(), 0);
        assert_eq!(Measure::from("-4").to_int_or_zero(), -4);
    }

    #[test]
    fn test_untagged_json_keeps_representation() {
        let parsed: Vec<Measure> = serde_json::from_str(r#"[100, "100", 2.5]"#).unwrap();
        assert!(matches!(parsed[0], Measure::Number(_)));
        assert_eq!(parsed[1], Measure::Text("100".to_string()));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"[100,"100",2.5]"#);
    }
}
