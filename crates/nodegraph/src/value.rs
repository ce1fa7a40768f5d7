//! Runtime values flowing through ports
//!
//! `Value` is the tagged union every function consumes and produces.
//! Equality and hashing are structural; floats compare by bit pattern so
//! that values can be used as map keys.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{NodeGraphError, Result};
use crate::port::PortType;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }
}

/// A backend-specific object the engine passes through untouched
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the payload as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_name)
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl Serialize for OpaqueValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.type_name)
    }
}

/// A runtime value
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Point(Point),
    Color(Color),
    Object(OpaqueValue),
    List(Vec<Value>),
}

impl Value {
    /// Name of the value's type, matching the port type vocabulary
    pub fn type_name(&self) -> &str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Point(_) => "point",
            Value::Color(_) => "color",
            Value::Object(obj) => obj.type_name(),
            Value::List(_) => "list",
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(NodeGraphError::type_mismatch("int", other.type_name())),
        }
    }

    /// Numeric view; ints widen to floats.
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(NodeGraphError::type_mismatch("float", other.type_name())),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(NodeGraphError::type_mismatch("string", other.type_name())),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(NodeGraphError::type_mismatch("boolean", other.type_name())),
        }
    }

    pub fn as_point(&self) -> Result<Point> {
        match self {
            Value::Point(p) => Ok(*p),
            other => Err(NodeGraphError::type_mismatch("point", other.type_name())),
        }
    }

    pub fn as_color(&self) -> Result<Color> {
        match self {
            Value::Color(c) => Ok(*c),
            other => Err(NodeGraphError::type_mismatch("color", other.type_name())),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(NodeGraphError::type_mismatch("list", other.type_name())),
        }
    }

    /// Convert this value to the representation required by `target`.
    pub fn coerce(self, target: &PortType) -> Result<Value> {
        match (target, self) {
            (PortType::Any | PortType::Custom(_), v) => Ok(v),
            (PortType::List, Value::List(items)) => Ok(Value::List(items)),
            (PortType::List, v) => Ok(Value::List(vec![v])),
            (PortType::Point, Value::List(items)) if items.len() == 2 => {
                let x = items[0].as_float()?;
                let y = items[1].as_float()?;
                Ok(Value::Point(Point::new(x, y)))
            }
            // A single-element list stands in for its element.
            (_, Value::List(mut items)) if items.len() == 1 => {
                let item = items.remove(0);
                item.coerce(target)
            }
            (PortType::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (PortType::Int, Value::Float(f)) => Ok(Value::Int(f.round() as i64)),
            (PortType::Float, Value::Float(f)) => Ok(Value::Float(f)),
            (PortType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (PortType::String, Value::String(s)) => Ok(Value::String(s)),
            (PortType::String, v @ (Value::Int(_) | Value::Float(_) | Value::Boolean(_))) => {
                Ok(Value::String(v.to_string()))
            }
            (PortType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (PortType::Point, Value::Point(p)) => Ok(Value::Point(p)),
            (PortType::Color, Value::Color(c)) => Ok(Value::Color(c)),
            (target, v) => Err(NodeGraphError::type_mismatch(target, v.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Point(a), Value::Point(b)) => {
                a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
            }
            (Value::Color(a), Value::Color(b)) => {
                a.r.to_bits() == b.r.to_bits()
                    && a.g.to_bits() == b.g.to_bits()
                    && a.b.to_bits() == b.b.to_bits()
                    && a.a.to_bits() == b.a.to_bits()
            }
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Boolean(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Point(p) => {
                p.x.to_bits().hash(state);
                p.y.to_bits().hash(state);
            }
            Value::Color(c) => {
                for component in [c.r, c.g, c.b, c.a] {
                    component.to_bits().hash(state);
                }
            }
            Value::Object(obj) => obj.type_name.hash(state),
            Value::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => f.write_str(s),
            Value::Point(p) => write!(f, "{:?},{:?}", p.x, p.y),
            Value::Color(c) => write!(f, "rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
