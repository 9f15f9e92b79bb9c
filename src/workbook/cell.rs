use serde_json::Value;

/// Value held by a single cell.
///
/// Built once when a row is ingested; the encoder never re-inspects raw input.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Written as an empty string cell. Absent values and non-finite numbers land here.
    #[default]
    Empty,
    /// Always finite.
    Number(f64),
    Text(String),
}

pub type Row = Vec<CellValue>;

impl CellValue {
    pub fn num(v: f64) -> Self {
        v.into()
    }

    pub fn text(v: impl Into<String>) -> Self {
        CellValue::Text(v.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Converts a dynamically typed value.
    ///
    /// `null` is empty, numbers stay numbers, strings stay text. Booleans,
    /// arrays and objects are written as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Number(n) => n.as_f64().map(CellValue::from).unwrap_or_default(),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Number(v)
        } else {
            CellValue::Empty
        }
    }
}

impl From<f32> for CellValue {
    fn from(v: f32) -> Self {
        f64::from(v).into()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CellValue {
                fn from(v: $t) -> Self {
                    CellValue::Number(v as f64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<&String> for CellValue {
    fn from(v: &String) -> Self {
        CellValue::Text(v.clone())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

impl From<&Value> for CellValue {
    fn from(v: &Value) -> Self {
        CellValue::from_json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_finite_numbers_are_empty() {
        assert_eq!(CellValue::from(f64::NAN), CellValue::Empty);
        assert_eq!(CellValue::from(f64::INFINITY), CellValue::Empty);
        assert_eq!(CellValue::from(f32::NEG_INFINITY), CellValue::Empty);
        assert_eq!(CellValue::from(1.5f64), CellValue::Number(1.5));
    }

    #[test]
    fn options_map_none_to_empty() {
        assert_eq!(CellValue::from(None::<i32>), CellValue::Empty);
        assert_eq!(CellValue::from(Some("x")), CellValue::text("x"));
    }

    #[test]
    fn json_values_classify() {
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Empty);
        assert_eq!(CellValue::from_json(&json!(42)), CellValue::Number(42.0));
        assert_eq!(CellValue::from_json(&json!("a")), CellValue::text("a"));
        assert_eq!(CellValue::from_json(&json!(true)), CellValue::text("true"));
    }
}
