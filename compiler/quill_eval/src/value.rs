//! Runtime values.
//!
//! `Value` is a closed tagged variant. Capability checks ("pop and require
//! a Number") are matches on the tag, see `StackFrame::pop_number` and
//! friends. Every value is cheap to clone: aggregates and text sit behind
//! `Arc`.
//!
//! `Null` is a unit variant, so there is exactly one null and nothing can
//! destroy or replace it.
//!
//! # Identity
//!
//! Equality and hashing are structural for numbers, text, words and
//! vectors, and by reference for functions, hashes and host objects.
//! Numbers compare with NaN equal to itself and `-0.0 == 0.0` so that
//! `Value` can be a hash key.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use quill_ir::{escape_text, format_number, Annotation, Word};
use rustc_hash::FxHashMap;

use crate::Function;

/// Dynamic type tag of a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Number,
    Text,
    Word,
    Function,
    Vector,
    Hash,
    Null,
    Annotation,
    Type,
    Host,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Number => "Number",
            ValueType::Text => "Text",
            ValueType::Word => "Word",
            ValueType::Function => "Function",
            ValueType::Vector => "Vector",
            ValueType::Hash => "Hash",
            ValueType::Null => "Null",
            ValueType::Annotation => "Annotation",
            ValueType::Type => "Type",
            ValueType::Host => "Host",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upcasting support for host objects. Implemented for every eligible type.
pub trait HostAny {
    fn as_any(&self) -> &dyn Any;
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> HostAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// An opaque value owned by the embedding application (a path, an image,
/// a file handle). The runtime only moves it around.
pub trait HostObject: HostAny + fmt::Debug + Send + Sync {
    /// Type name reported in type-mismatch errors.
    fn type_name(&self) -> &str;

    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }
}

/// Key/value mapping built from a `#[ ... ]` literal.
///
/// Entries keep insertion order; a repeated key overwrites the earlier
/// value in place.
#[derive(Clone, Debug, Default)]
pub struct HashValue {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<Value, usize>,
}

impl HashValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Word keys are stored as text so `a.b` finds them.
    pub fn insert(&mut self, key: Value, value: Value) {
        let key = key.into_key();
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let slot = match key {
            Value::Word(word) => *self.index.get(&Value::Text(word.shared_text()))?,
            other => *self.index.get(other)?,
        };
        Some(&self.entries[slot].1)
    }

    /// Look up by name, yielding `Null` for a missing key.
    pub fn get_or_null(&self, key: &Value) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Value, Value)> for HashValue {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut hash = HashValue::new();
        for (key, value) in iter {
            hash.insert(key, value);
        }
        hash
    }
}

/// A runtime datum.
#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Text(Arc<str>),
    /// A quoted, unevaluated word.
    Word(Word),
    Function(Function),
    Vector(Arc<[Value]>),
    Hash(Arc<HashValue>),
    Null,
    Annotation(Annotation),
    Type(ValueType),
    Host(Arc<dyn HostObject>),
}

impl Value {
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Value::Text(text.into())
    }

    pub fn vector(values: Vec<Value>) -> Self {
        Value::Vector(values.into())
    }

    pub fn from_hash(hash: HashValue) -> Self {
        Value::Hash(Arc::new(hash))
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Arc::new(object))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Word(_) => ValueType::Word,
            Value::Function(_) => ValueType::Function,
            Value::Vector(_) => ValueType::Vector,
            Value::Hash(_) => ValueType::Hash,
            Value::Null => ValueType::Null,
            Value::Annotation(_) => ValueType::Annotation,
            Value::Type(_) => ValueType::Type,
            Value::Host(_) => ValueType::Host,
        }
    }

    /// Name used in diagnostics. Host objects report their own type name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Host(object) => object.type_name(),
            other => other.value_type().name(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashValue> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(values) => Some(values),
            _ => None,
        }
    }

    /// Render in literal syntax: text is quoted, words carry their `'`.
    pub fn render(&self) -> String {
        match self {
            Value::Text(text) => escape_text(text),
            Value::Word(word) => format!("'{word}"),
            other => other.to_string(),
        }
    }

    fn into_key(self) -> Value {
        match self {
            Value::Word(word) => Value::Text(word.shared_text()),
            other => other,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(Arc::from(text))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(Arc::from(text))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Option<Value>> for Value {
    fn from(value: Option<Value>) -> Self {
        value.unwrap_or(Value::Null)
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => numbers_equal(*a, *b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Word(a), Value::Word(b)) => a.text() == b.text(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => Arc::ptr_eq(a, b),
            (Value::Null, Value::Null) => true,
            (Value::Annotation(a), Value::Annotation(b)) => a.text() == b.text(),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().hash(state);
        match self {
            Value::Number(n) => number_bits(*n).hash(state),
            Value::Text(text) => text.hash(state),
            Value::Word(word) => word.text().hash(state),
            Value::Function(function) => function.addr().hash(state),
            Value::Vector(values) => values.hash(state),
            Value::Hash(hash) => Arc::as_ptr(hash).hash(state),
            Value::Null => {}
            Value::Annotation(annotation) => annotation.text().hash(state),
            Value::Type(tag) => tag.hash(state),
            Value::Host(object) => Arc::as_ptr(object).cast::<()>().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(text) => f.write_str(text),
            Value::Word(word) => write!(f, "{word}"),
            Value::Function(function) => write!(f, "{function}"),
            Value::Vector(values) if values.is_empty() => f.write_str("[ ]"),
            Value::Vector(values) => {
                f.write_str("[")?;
                for value in values.iter() {
                    write!(f, " {}", value.render())?;
                }
                f.write_str(" ]")
            }
            Value::Hash(hash) if hash.is_empty() => f.write_str("#[ ]"),
            Value::Hash(hash) => {
                f.write_str("#[")?;
                for (key, value) in hash.iter() {
                    write!(f, " {} {}", key.render(), value.render())?;
                }
                f.write_str(" ]")
            }
            Value::Null => f.write_str("null"),
            Value::Annotation(annotation) => write!(f, "{annotation}"),
            Value::Type(tag) => write!(f, "{tag}"),
            Value::Host(object) => f.write_str(&object.describe()),
        }
    }
}
