use super::Value;

use std::hash::{Hash, Hasher};

/// An order-sensitive identity built from the components contributed while
/// it is constructed.
///
/// Two keys are equal when their component sequences are equal element-wise.
/// The null key ([`CacheKey::null`]) stands for "not enough information to
/// identify a row": it compares unequal to every key, itself included, and
/// ignores further updates. Callers must not use a null key as a map key;
/// check [`CacheKey::is_null`] first.
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    parts: Vec<KeyPart>,
    null: bool,
}

/// One component of a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Bytes(Vec<u8>),
    /// Floats compare by bit pattern
    F64(u64),
    I64(i64),
    String(String),
    List(Vec<KeyPart>),
    /// Object identity
    Object(usize),
    /// A nested key
    Key(Vec<KeyPart>),
}

impl CacheKey {
    pub fn new() -> CacheKey {
        CacheKey::default()
    }

    /// The key that matches nothing.
    pub fn null() -> CacheKey {
        CacheKey {
            parts: vec![],
            null: true,
        }
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Appends a component. Updating the null key has no effect.
    pub fn update(&mut self, part: impl Into<KeyPart>) {
        if !self.null {
            self.parts.push(part.into());
        }
    }

    /// Number of components contributed so far.
    pub fn update_count(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        !self.null && !other.null && self.parts == other.parts
    }
}

// Reflexivity does not hold for the null key. It is never stored in a map.
impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.null.hash(state);
        self.parts.hash(state);
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.null {
            return f.write_str("NULL_CACHE_KEY");
        }

        f.write_str("[")?;
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{part:?}")?;
        }
        f.write_str("]")
    }
}

impl From<&Value> for KeyPart {
    fn from(value: &Value) -> KeyPart {
        match value {
            Value::Null => KeyPart::Null,
            Value::Bool(v) => KeyPart::Bool(*v),
            Value::Bytes(v) => KeyPart::Bytes(v.clone()),
            Value::F64(v) => KeyPart::F64(v.to_bits()),
            // Integer widths do not affect identity
            Value::I16(_) | Value::I32(_) | Value::I64(_) => {
                KeyPart::I64(value.as_i64().unwrap_or_default())
            }
            Value::String(v) => KeyPart::String(v.clone()),
            Value::List(items) => KeyPart::List(items.iter().map(KeyPart::from).collect()),
            Value::Object(object) => KeyPart::Object(object.addr()),
        }
    }
}

impl From<Value> for KeyPart {
    fn from(value: Value) -> KeyPart {
        KeyPart::from(&value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> KeyPart {
        KeyPart::String(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> KeyPart {
        KeyPart::String(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> KeyPart {
        KeyPart::String(value.clone())
    }
}

impl From<&CacheKey> for KeyPart {
    fn from(key: &CacheKey) -> KeyPart {
        if key.null {
            KeyPart::Null
        } else {
            KeyPart::Key(key.parts.clone())
        }
    }
}
