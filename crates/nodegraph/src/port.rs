//! Port definitions
//!
//! A port is an immutable, typed slot on a node. Input ports carry the value
//! used when the port is not connected; output ports carry the value readers
//! fall back to when the node is short-circuited by a cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NodeGraphError, Result};
use crate::value::{Color, Point, Value};

/// Type vocabulary for ports and function arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Int,
    Float,
    String,
    Boolean,
    Point,
    Color,
    List,
    /// Accepts any value without conversion
    Any,
    /// Backend-specific object type, passed through unchanged
    Custom(String),
}

impl PortType {
    /// Parse a type name; unknown names become custom types.
    pub fn parse(name: &str) -> Self {
        match name {
            "int" => PortType::Int,
            "float" => PortType::Float,
            "string" => PortType::String,
            "boolean" => PortType::Boolean,
            "point" => PortType::Point,
            "color" => PortType::Color,
            "list" => PortType::List,
            "any" => PortType::Any,
            other => PortType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PortType::Int => "int",
            PortType::Float => "float",
            PortType::String => "string",
            PortType::Boolean => "boolean",
            PortType::Point => "point",
            PortType::Color => "color",
            PortType::List => "list",
            PortType::Any => "any",
            PortType::Custom(name) => name,
        }
    }

    /// Zero value for standard types; `None` for `Any` and custom types.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            PortType::Int => Some(Value::Int(0)),
            PortType::Float => Some(Value::Float(0.0)),
            PortType::String => Some(Value::String(String::new())),
            PortType::Boolean => Some(Value::Boolean(false)),
            PortType::Point => Some(Value::Point(Point::ZERO)),
            PortType::Color => Some(Value::Color(Color::BLACK)),
            PortType::List => Some(Value::List(Vec::new())),
            PortType::Any | PortType::Custom(_) => None,
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Whether an input accepts one upstream value or gathers many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
}

/// An immutable port definition with its stored value
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    name: String,
    port_type: PortType,
    direction: PortDirection,
    cardinality: Cardinality,
    value: Option<Value>,
}

impl Port {
    /// Create an input port holding the type's default value
    pub fn new(name: impl Into<String>, port_type: PortType) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NodeGraphError::InvalidPort("port name cannot be empty".into()));
        }
        if name.contains('/') || name.contains('.') {
            return Err(NodeGraphError::InvalidPort(format!(
                "port name {name} may not contain '/' or '.'"
            )));
        }
        let value = port_type.default_value();
        Ok(Self {
            name,
            port_type,
            direction: PortDirection::Input,
            cardinality: Cardinality::Single,
            value,
        })
    }

    pub fn for_type(name: impl Into<String>, port_type: &str) -> Result<Self> {
        Self::new(name, PortType::parse(port_type))
    }

    pub fn int(name: impl Into<String>, value: i64) -> Result<Self> {
        Self::new(name, PortType::Int)?.with_value(Value::Int(value))
    }

    pub fn float(name: impl Into<String>, value: f64) -> Result<Self> {
        Self::new(name, PortType::Float)?.with_value(Value::Float(value))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        Self::new(name, PortType::String)?.with_value(Value::String(value.into()))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Result<Self> {
        Self::new(name, PortType::Boolean)?.with_value(Value::Boolean(value))
    }

    pub fn point(name: impl Into<String>, value: Point) -> Result<Self> {
        Self::new(name, PortType::Point)?.with_value(Value::Point(value))
    }

    pub fn color(name: impl Into<String>, value: Color) -> Result<Self> {
        Self::new(name, PortType::Color)?.with_value(Value::Color(value))
    }

    /// Port for a backend-specific object type; starts without a value.
    pub fn custom(name: impl Into<String>, type_name: impl Into<String>) -> Result<Self> {
        Self::new(name, PortType::Custom(type_name.into()))
    }

    /// Turn this into an output port
    pub fn output(mut self) -> Self {
        self.direction = PortDirection::Output;
        self
    }

    /// Turn this into a gathering input port
    pub fn multiple(mut self) -> Self {
        self.cardinality = Cardinality::Multiple;
        self
    }

    /// Replace the stored value, coercing it to the port type
    pub fn with_value(mut self, value: Value) -> Result<Self> {
        self.value = Some(value.coerce(&self.port_type)?);
        Ok(self)
    }

    pub fn without_value(mut self) -> Self {
        self.value = None;
        self
    }

    pub(crate) fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port_type(&self) -> &PortType {
        &self.port_type
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    pub fn is_multiple(&self) -> bool {
        self.cardinality == Cardinality::Multiple
    }
}
