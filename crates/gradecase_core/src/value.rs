//! Dynamic values passed to and returned from runtime functions.

use std::fmt;

use crate::faults::Fault;

/// A dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Name of the value's type, as used in `TypeError` messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    /// Quoted representation, used in assertion messages.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i64, Fault> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(Fault::type_error(format!("expected int, got {}", other.type_name()))),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(Fault::type_error(format!("expected bool, got {}", other.type_name()))),
        }
    }

    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(Fault::type_error(format!("expected str, got {}", other.type_name()))),
        }
    }

    /// Python-style truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_python_like() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::from(true).to_string(), "True");
        assert_eq!(Value::from(2.0).to_string(), "2.0");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::from("a")]).to_string(),
            "[1, 'a']"
        );
    }

    #[test]
    fn test_as_int_type_error() {
        let err = Value::from("x").as_int().unwrap_err();
        assert_eq!(err.to_string(), "TypeError: expected int, got str");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
    }
}
