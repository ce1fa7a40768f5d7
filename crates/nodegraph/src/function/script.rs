//! Script function libraries
//!
//! A script library is a JavaScript source whose completion value (its last
//! top-level expression) is an array of `{ name, fn }` entries:
//!
//! ```js
//! function double(x) { return x * 2; }
//! [
//!     { name: "double", fn: double },
//!     { name: "greet", fn: function (who) { return "hello " + who; } },
//! ]
//! ```
//!
//! The interpreter context is not `Send`, so each library owns a worker
//! thread that holds the context; calls are forwarded over a channel and the
//! caller blocks until the reply arrives.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use boa_engine::object::builtins::JsArray;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsError, JsObject, JsString, JsValue, Source};
use thiserror::Error;

use super::{Argument, Arity, Function, FunctionLibrary};
use crate::error::{BoxError, NodeGraphError, Result};
use crate::port::PortType;
use crate::value::{Color, Point, Value};

/// Errors raised while calling into a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script error: {0}")]
    Js(String),

    #[error("Cannot convert value: {0}")]
    Conversion(String),

    #[error("Script worker is no longer running")]
    WorkerGone,
}

impl From<JsError> for ScriptError {
    fn from(err: JsError) -> Self {
        ScriptError::Js(err.to_string())
    }
}

struct Call {
    index: usize,
    args: Vec<Value>,
    reply: mpsc::Sender<std::result::Result<Option<Value>, ScriptError>>,
}

/// Signature of a loaded script function: its name and declared parameter count
type Signature = (String, usize);

/// A function library loaded from JavaScript source
pub struct ScriptLibrary {
    namespace: String,
    resource: String,
    functions: BTreeMap<String, Arc<ScriptFunction>>,
}

impl ScriptLibrary {
    /// Load a script file. The namespace is the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let resource = path.display().to_string();
        let namespace = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| NodeGraphError::load(&resource, "Cannot derive a namespace from the file name"))?
            .to_string();
        let source = std::fs::read_to_string(path)
            .map_err(|e| NodeGraphError::load(&resource, e.to_string()))?;
        Self::from_source(namespace, resource, source)
    }

    /// Evaluate `source` and collect the functions it exposes.
    pub fn from_source(
        namespace: impl Into<String>,
        resource: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let resource = resource.into();
        let source = source.into();

        let (init_tx, init_rx) = mpsc::channel();
        let (call_tx, call_rx) = mpsc::channel::<Call>();
        thread::Builder::new()
            .name(format!("script-{namespace}"))
            .spawn(move || run_worker(source, init_tx, call_rx))
            .map_err(|e| NodeGraphError::load(&resource, e.to_string()))?;

        let signatures = init_rx
            .recv()
            .map_err(|_| NodeGraphError::load(&resource, "Script worker exited during load"))?
            .map_err(|cause| NodeGraphError::load(&resource, cause))?;

        let worker = Arc::new(call_tx);
        let mut functions = BTreeMap::new();
        for (index, (name, length)) in signatures.into_iter().enumerate() {
            let arguments = (1..=length)
                .map(|i| Argument::new(format!("any{i}"), PortType::Any))
                .collect();
            let function = ScriptFunction {
                name: name.clone(),
                index,
                arguments,
                worker: Arc::clone(&worker),
            };
            functions.insert(name, Arc::new(function));
        }

        log::info!(
            "Loaded script library {} from {} ({} functions)",
            namespace,
            resource,
            functions.len()
        );
        Ok(Self {
            namespace,
            resource,
            functions,
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl FunctionLibrary for ScriptLibrary {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn link(&self) -> String {
        format!("script:{}", self.resource)
    }

    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions
            .get(name)
            .map(|f| Arc::clone(f) as Arc<dyn Function>)
    }

    fn function_names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

/// A JavaScript function living on its library's worker thread
pub struct ScriptFunction {
    name: String,
    index: usize,
    arguments: Vec<Argument>,
    worker: Arc<mpsc::Sender<Call>>,
}

impl Function for ScriptFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn arity(&self) -> Arity {
        Arity::Exact(self.arguments.len())
    }

    fn invoke(&self, args: &[Value]) -> std::result::Result<Option<Value>, BoxError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.worker
            .send(Call {
                index: self.index,
                args: args.to_vec(),
                reply: reply_tx,
            })
            .map_err(|_| ScriptError::WorkerGone)?;
        let result = reply_rx.recv().map_err(|_| ScriptError::WorkerGone)??;
        Ok(result)
    }
}

fn run_worker(
    source: String,
    init: mpsc::Sender<std::result::Result<Vec<Signature>, String>>,
    calls: mpsc::Receiver<Call>,
) {
    let mut context = Context::default();
    let functions = match load_functions(&source, &mut context) {
        Ok(functions) => functions,
        Err(cause) => {
            let _ = init.send(Err(cause));
            return;
        }
    };
    let signatures = functions
        .iter()
        .map(|(name, _, length)| (name.clone(), *length))
        .collect();
    if init.send(Ok(signatures)).is_err() {
        return;
    }

    // Runs until the library and all its functions are dropped.
    while let Ok(call) = calls.recv() {
        let result = match functions.get(call.index) {
            Some((_, callable, _)) => call_function(callable, &call.args, &mut context),
            None => Err(ScriptError::Js(format!("no function at index {}", call.index))),
        };
        let _ = call.reply.send(result);
    }
    log::debug!("Script worker shutting down");
}

fn load_functions(
    source: &str,
    context: &mut Context,
) -> std::result::Result<Vec<(String, JsObject, usize)>, String> {
    let completion = context
        .eval(Source::from_bytes(source.as_bytes()))
        .map_err(|e| e.to_string())?;

    let malformed = || "The script must evaluate to an array of { name, fn } entries".to_string();
    let object = completion.as_object().map(|o| o.clone()).ok_or_else(malformed)?;
    if !object.is_array() {
        return Err(malformed());
    }
    let array = JsArray::from_object(object).map_err(|e| e.to_string())?;
    let length = array.length(context).map_err(|e| e.to_string())?;

    // The script controls `length`; grow as entries convert.
    let mut functions = Vec::new();
    for i in 0..length {
        let entry = array.get(i, context).map_err(|e| e.to_string())?;
        let entry = entry
            .as_object()
            .map(|o| o.clone())
            .ok_or_else(|| format!("Entry {i} is not an object"))?;

        let name = entry
            .get(js_string!("name"), context)
            .map_err(|e| e.to_string())?;
        let name = name
            .as_string()
            .map(|s| s.to_std_string_escaped())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("Entry {i} has no string name"))?;

        let callable = entry
            .get(js_string!("fn"), context)
            .map_err(|e| e.to_string())?;
        let callable = callable
            .as_object()
            .map(|o| o.clone())
            .filter(|o| o.is_callable())
            .ok_or_else(|| format!("Function {name} is not callable"))?;

        let length = callable
            .get(js_string!("length"), context)
            .map_err(|e| e.to_string())?
            .as_number()
            .unwrap_or(0.0) as usize;
        functions.push((name, callable, length));
    }
    Ok(functions)
}

fn call_function(
    callable: &JsObject,
    args: &[Value],
    context: &mut Context,
) -> std::result::Result<Option<Value>, ScriptError> {
    let js_args = args
        .iter()
        .map(|arg| to_js(arg, context))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let result = callable.call(&JsValue::undefined(), &js_args, context)?;
    from_js(&result, context)
}

fn to_js(value: &Value, context: &mut Context) -> std::result::Result<JsValue, ScriptError> {
    let js = match value {
        Value::Boolean(b) => JsValue::from(*b),
        Value::Int(i) => JsValue::from(*i as f64),
        Value::Float(f) => JsValue::from(*f),
        Value::String(s) => JsValue::from(JsString::from(s.as_str())),
        Value::Point(p) => {
            let object = ObjectInitializer::new(context)
                .property(js_string!("x"), p.x, Attribute::all())
                .property(js_string!("y"), p.y, Attribute::all())
                .build();
            JsValue::from(object)
        }
        Value::Color(c) => {
            let object = ObjectInitializer::new(context)
                .property(js_string!("r"), c.r, Attribute::all())
                .property(js_string!("g"), c.g, Attribute::all())
                .property(js_string!("b"), c.b, Attribute::all())
                .property(js_string!("a"), c.a, Attribute::all())
                .build();
            JsValue::from(object)
        }
        Value::List(items) => {
            let values = items
                .iter()
                .map(|item| to_js(item, context))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            JsValue::from(JsArray::from_iter(values, context))
        }
        Value::Object(obj) => {
            return Err(ScriptError::Conversion(format!(
                "{} objects cannot be passed to scripts",
                obj.type_name()
            )))
        }
    };
    Ok(js)
}

fn from_js(value: &JsValue, context: &mut Context) -> std::result::Result<Option<Value>, ScriptError> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    if let Some(b) = value.as_boolean() {
        return Ok(Some(Value::Boolean(b)));
    }
    if let Some(n) = value.as_number() {
        return Ok(Some(Value::Float(n)));
    }
    if let Some(s) = value.as_string() {
        return Ok(Some(Value::String(s.to_std_string_escaped())));
    }
    let Some(object) = value.as_object().map(|o| o.clone()) else {
        return Err(ScriptError::Conversion(format!(
            "unsupported script value {}",
            value.display()
        )));
    };

    if object.is_array() {
        let array = JsArray::from_object(object)?;
        let length = array.length(context)?;
        let mut items = Vec::new();
        for i in 0..length {
            let item = array.get(i, context)?;
            match from_js(&item, context)? {
                Some(v) => items.push(v),
                None => {
                    return Err(ScriptError::Conversion(
                        "lists cannot contain undefined or null".into(),
                    ))
                }
            }
        }
        return Ok(Some(Value::List(items)));
    }
    if object.is_callable() {
        return Err(ScriptError::Conversion("functions cannot leave a script".into()));
    }

    let x = number_property(&object, "x", context)?;
    let y = number_property(&object, "y", context)?;
    if let (Some(x), Some(y)) = (x, y) {
        return Ok(Some(Value::Point(Point::new(x, y))));
    }
    let r = number_property(&object, "r", context)?;
    let g = number_property(&object, "g", context)?;
    let b = number_property(&object, "b", context)?;
    if let (Some(r), Some(g), Some(b)) = (r, g, b) {
        let a = number_property(&object, "a", context)?.unwrap_or(1.0);
        return Ok(Some(Value::Color(Color::rgba(r, g, b, a))));
    }
    Err(ScriptError::Conversion(
        "objects must be points {x, y} or colors {r, g, b, a}".into(),
    ))
}

fn number_property(
    object: &JsObject,
    key: &str,
    context: &mut Context,
) -> std::result::Result<Option<f64>, ScriptError> {
    let value = object.get(JsString::from(key), context)?;
    Ok(value.as_number())
}
