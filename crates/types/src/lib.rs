use std::cmp::Ordering;

/// The four attribute types a schema can declare.
///
/// `String` carries its declared fixed length (`n` in `STRING[n]`), since
/// the record layout needs it at pack/unpack time without consulting the
/// owning schema twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Int,
    Float,
    Bool,
    String(u16),
}

impl DataType {
    /// Width in bytes of one packed attribute of this type.
    pub fn width(self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float => 15,
            DataType::Bool => 1,
            DataType::String(n) => n as usize,
        }
    }
}

/// A typed runtime value, tagged by variant rather than carried
/// alongside a separate type descriptor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i32),
    Float(f64),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(s) => DataType::String(s.len() as u16),
        }
    }

    /// Compares two values of matching type. Mixed-type comparisons have
    /// no defined ordering and return `None` here rather than panic.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        self.cmp_same_type(other).map(|o| o == Ordering::Equal)
    }
}
