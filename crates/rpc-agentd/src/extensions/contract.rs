//! Types every extension implements: methods, params, schemas and metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RpcError;

use super::loader::ExtensionLoadError;

/// Callable signature for a method handler.
pub type HandlerFn = dyn Fn(&Params) -> Result<Value, RpcError> + Send + Sync;

/// Shared handle to a method handler.
pub type Handler = Arc<HandlerFn>;

/// Named params passed to a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Wraps a JSON object.
    #[must_use]
    pub const fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Raw value for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value for `field`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidParams` error when the field is absent or not a
    /// string.
    pub fn require_str(&self, field: &str) -> Result<&str, RpcError> {
        match self.0.get(field) {
            Some(Value::String(text)) => Ok(text),
            Some(other) => Err(RpcError::param_type_mismatch(
                field,
                ParamType::String.as_str(),
                json_type_name(other),
            )),
            None => Err(RpcError::missing_param(field, ParamType::String.as_str())),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

/// Primitive JSON types a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON `true` or `false`.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl ParamType {
    /// Name used in error details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Returns `true` when `value` has this type.
    #[must_use]
    pub const fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Number, Value::Number(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Object, Value::Object(_))
                | (Self::Array, Value::Array(_))
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// JSON type name of `value`, as reported in `received`.
#[must_use]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Required fields a method declares for its params.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    required: Vec<(String, ParamType)>,
}

impl ParamSchema {
    /// Creates a schema with no required fields.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            required: Vec::new(),
        }
    }

    /// Adds a required field.
    #[must_use]
    pub fn require(mut self, field: impl Into<String>, param_type: ParamType) -> Self {
        self.required.push((field.into(), param_type));
        self
    }

    /// Required fields in declaration order.
    #[must_use]
    pub fn required(&self) -> &[(String, ParamType)] {
        &self.required
    }

    /// Checks `params` against the schema.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` naming the first field that is missing or has
    /// the wrong type.
    pub fn check(&self, params: &Params) -> Result<(), RpcError> {
        for (field, expected) in &self.required {
            match params.get(field) {
                None => return Err(RpcError::missing_param(field, expected.as_str())),
                Some(value) if !expected.matches(value) => {
                    return Err(RpcError::param_type_mismatch(
                        field,
                        expected.as_str(),
                        json_type_name(value),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// One callable method within an extension.
pub struct Method {
    name: String,
    schema: Option<ParamSchema>,
    handler: Handler,
}

impl Method {
    /// Creates a method without a param schema.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Params) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            schema: None,
            handler: Arc::new(handler),
        }
    }

    /// Declares the params this method requires.
    #[must_use]
    pub fn with_schema(mut self, schema: ParamSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Method name without the namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared param schema, if any.
    #[must_use]
    pub const fn schema(&self) -> Option<&ParamSchema> {
        self.schema.as_ref()
    }

    /// Shared handle to the handler, for running it on another thread.
    #[must_use]
    pub fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }

    /// Invokes the handler on the calling thread.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn call(&self, params: &Params) -> Result<Value, RpcError> {
        (self.handler)(params)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Method")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of an extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStatus {
    /// Accepting calls.
    #[default]
    Active,
    /// Registered but switched off.
    Inactive,
    /// Failed during initialisation.
    Error,
}

impl ExtensionStatus {
    /// Lowercase label used in logs and listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ExtensionStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Per-extension settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Disabled extensions stay listed but reject calls.
    pub enabled: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Descriptive metadata reported by `extensions.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtensionMetadata {
    /// Semantic version string.
    pub version: String,
    /// One-line description.
    pub description: String,
    /// Additional free-form fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named group of methods.
#[derive(Debug, Clone)]
pub struct Extension {
    name: String,
    status: ExtensionStatus,
    config: ExtensionConfig,
    metadata: ExtensionMetadata,
    methods: BTreeMap<String, Arc<Method>>,
}

impl Extension {
    /// Starts building an extension called `name`.
    pub fn builder(name: impl Into<String>) -> ExtensionBuilder {
        ExtensionBuilder::new(name)
    }

    /// Namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ExtensionStatus {
        self.status
    }

    /// Settings.
    #[must_use]
    pub const fn config(&self) -> ExtensionConfig {
        self.config
    }

    /// Descriptive metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ExtensionMetadata {
        &self.metadata
    }

    /// Looks up a method by its unqualified name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<Arc<Method>> {
        self.methods.get(name).map(Arc::clone)
    }

    /// Method names in sorted order.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Returns `true` when calls may be routed to this extension.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        self.status == ExtensionStatus::Active && self.config.enabled
    }

    pub(crate) const fn set_status(&mut self, status: ExtensionStatus) {
        self.status = status;
    }

    /// Checks the shape the registry relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionLoadError`] when the name is empty or dotted, or
    /// when no methods are declared.
    pub fn validate(&self) -> Result<(), ExtensionLoadError> {
        if self.name.trim().is_empty() {
            return Err(ExtensionLoadError::EmptyName);
        }
        if self.name.contains('.') {
            return Err(ExtensionLoadError::DottedName {
                name: self.name.clone(),
            });
        }
        if self.methods.is_empty() {
            return Err(ExtensionLoadError::NoMethods {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Builder for [`Extension`].
#[derive(Debug)]
pub struct ExtensionBuilder {
    extension: Extension,
}

impl ExtensionBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            extension: Extension {
                name: name.into(),
                status: ExtensionStatus::Active,
                config: ExtensionConfig::default(),
                metadata: ExtensionMetadata::default(),
                methods: BTreeMap::new(),
            },
        }
    }

    /// Sets the version string.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.extension.metadata.version = version.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.extension.metadata.description = description.into();
        self
    }

    /// Adds a free-form metadata field.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extension.metadata.extra.insert(key.into(), value.into());
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn status(mut self, status: ExtensionStatus) -> Self {
        self.extension.status = status;
        self
    }

    /// Enables or disables the extension.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.extension.config.enabled = enabled;
        self
    }

    /// Adds a method, replacing any earlier method with the same name.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.extension
            .methods
            .insert(method.name().to_owned(), Arc::new(method));
        self
    }

    /// Adds a schema-less method from a closure.
    #[must_use]
    pub fn handler<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Params) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.method(Method::new(name, handler))
    }

    /// Finishes the extension.
    #[must_use]
    pub fn build(self) -> Extension {
        self.extension
    }
}
