use calamine::Data;
use serde_json::Value;

/// A decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::String(String::new()),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(String::new())),
            Cell::Bool(b) => Value::Bool(*b),
        }
    }

    /// Same as [`Cell::to_json`], but an empty cell yields `fallback`.
    pub fn to_json_or(&self, fallback: Value) -> Value {
        if self.is_empty() {
            fallback
        } else {
            self.to_json()
        }
    }

    /// Text used when the cell names a document key.
    pub fn to_key(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

// Excel stores every number as a double.
fn number_cell(f: f64) -> Cell {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Cell::Int(f as i64)
    } else {
        Cell::Float(f)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => number_cell(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) => Cell::Text(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => number_cell(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}
