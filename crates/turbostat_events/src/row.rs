use crate::error::RowError;
use crate::metric::{LineProtocol, Metric};

/// Sanitized keys whose columns identify a CPU rather than measure it.
pub const TAG_KEYS: [&str; 4] = ["cpu", "core", "apic", "x2apic"];

pub fn is_tag_key(key: &str) -> bool {
    TAG_KEYS.contains(&key)
}

/// Returns whether a value has the shape of a tag.
///
/// `turbostat` only uses unsigned integers and `-` (summary rows) there. An
/// empty column counts as a tag too.
pub fn is_tag_value(value: &str) -> bool {
    value == "-" || value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    /// Value exactly as printed by `turbostat`.
    pub raw: String,
    pub value: f64,
}

/// One classified data row. Tags and fields keep the column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tags: Vec<Tag>,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    pub fn field(&self, key: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value)
    }

    /// Text form, e.g. `turbostat,cpu=0 busy_percent=0.53`.
    pub fn line_protocol(&self) -> LineProtocol<'_> {
        LineProtocol::new(self)
    }

    pub fn to_metric(&self) -> Metric {
        Metric::from_record(self)
    }
}

/// Pairs `values` with sanitized `keys` positionally and classifies them.
///
/// Fewer values than keys is fine; the trailing columns are simply absent.
pub fn classify_row<K: AsRef<str>>(keys: &[K], values: &[&str]) -> Result<Record, RowError> {
    if values.len() > keys.len() {
        return Err(RowError::TooManyValues {
            keys: owned(keys),
            values: owned(values),
        });
    }

    let mut tags = Vec::new();
    let mut fields = Vec::new();
    for (key, value) in keys.iter().map(AsRef::as_ref).zip(values.iter().copied()) {
        if is_tag_key(key) {
            if !is_tag_value(value) {
                return Err(RowError::InvalidTag {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
            tags.push(Tag {
                key: key.to_string(),
                value: value.to_string(),
            });
        } else {
            let parsed = value
                .parse::<f64>()
                .map_err(|_| RowError::InvalidField {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
            fields.push(Field {
                key: key.to_string(),
                raw: value.to_string(),
                value: parsed,
            });
        }
    }

    if fields.is_empty() {
        return Err(RowError::NoField {
            keys: owned(keys),
            values: owned(values),
        });
    }
    Ok(Record { tags, fields })
}

fn owned<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|item| item.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_shape() {
        assert!(is_tag_value("0"));
        assert!(is_tag_value("12"));
        assert!(is_tag_value("-"));
        assert!(!is_tag_value("abc"));
        assert!(!is_tag_value("*"));
        assert!(is_tag_value(""));
        assert!(!is_tag_value("--"));
        assert!(!is_tag_value("-1"));
    }

    #[test]
    fn splits_tags_and_fields() {
        let keys = ["cpu", "core", "busy_percent", "c1"];
        let record = classify_row(&keys, &["0", "1", "0.53", "634"]).unwrap();

        assert_eq!(record.tag("cpu"), Some("0"));
        assert_eq!(record.tag("core"), Some("1"));
        assert_eq!(record.field("busy_percent"), Some(0.53));
        assert_eq!(record.field("c1"), Some(634.0));
        assert_eq!(record.tags.len(), 2);
        assert_eq!(record.fields.len(), 2);
    }

    #[test]
    fn missing_trailing_values_are_allowed() {
        let keys = ["cpu", "core", "busy_percent", "pkg_watt"];
        let record = classify_row(&keys, &["0", "8", "0.26"]).unwrap();
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.field("pkg_watt"), None);
    }

    #[test]
    fn too_many_values() {
        let err = classify_row(&["cpu"], &["0", "1"]).unwrap_err();
        assert_eq!(
            err,
            RowError::TooManyValues {
                keys: vec!["cpu".to_string()],
                values: vec!["0".to_string(), "1".to_string()],
            }
        );
    }

    #[test]
    fn invalid_tag() {
        let err = classify_row(&["cpu", "busy_percent"], &["?", "0.53"]).unwrap_err();
        assert!(matches!(err, RowError::InvalidTag { ref value, .. } if value == "?"));
    }

    #[test]
    fn invalid_field() {
        let err = classify_row(&["cpu", "busy_percent"], &["0", "bar"]).unwrap_err();
        assert!(matches!(err, RowError::InvalidField { ref key, .. } if key == "busy_percent"));
    }

    #[test]
    fn empty_tag_column_is_kept() {
        let keys = ["cpu", "core", "busy_percent"];
        let record = classify_row(&keys, &["0", "", "0.5"]).unwrap();
        assert_eq!(record.tag("cpu"), Some("0"));
        assert_eq!(record.tag("core"), Some(""));
        assert_eq!(record.field("busy_percent"), Some(0.5));
    }

    #[test]
    fn infinities_and_nan_are_numbers() {
        let keys = ["a", "b", "c"];
        let record = classify_row(&keys, &["inf", "-Infinity", "NaN"]).unwrap();
        assert_eq!(record.field("a"), Some(f64::INFINITY));
        assert_eq!(record.field("b"), Some(f64::NEG_INFINITY));
        assert!(record.field("c").is_some_and(f64::is_nan));
        assert_eq!(record.fields[2].raw, "NaN");
    }

    #[test]
    fn signed_and_integer_fields_parse() {
        let record = classify_row(&["a", "b", "c"], &["-3", "42", "+0.5"]).unwrap();
        assert_eq!(record.field("a"), Some(-3.0));
        assert_eq!(record.field("b"), Some(42.0));
        assert_eq!(record.field("c"), Some(0.5));
    }

    #[test]
    fn row_of_only_tags_is_rejected() {
        let keys = ["cpu", "core", "busy_percent"];
        let err = classify_row(&keys, &["0", "1"]).unwrap_err();
        assert!(matches!(err, RowError::NoField { .. }));
    }
}
