/// A polymorphic decoded value tree, shaped by the schema rather than any
/// type fixed in this crate.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f32),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    Record(Vec<(String, Value)>),
}

impl Value {
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f as f64),
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => Some(*u as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.get_field(name).and_then(Value::as_str)
    }

    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.get_field(name).and_then(Value::as_f64)
    }

    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.get_field(name).and_then(Value::as_bool)
    }

    pub fn field_seq(&self, name: &str) -> &[Value] {
        self.get_field(name).and_then(Value::as_seq).unwrap_or(&[])
    }
}
