//! The host runtime port.
//!
//! Everything the bootstrap needs from the process it runs in goes through
//! [`HostRuntime`]. It is the only place where classes, fields and methods are
//! located by name; the bootstrap itself never reaches into the host any
//! other way.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Failures of the structural host operations (class and field lookup,
/// classpath changes).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostFault {
    #[error("class {0} not found")]
    ClassNotFound(String),

    #[error("class {class} has no static field {field}")]
    NoSuchField { class: String, field: String },

    #[error("access to {0} denied by the host")]
    AccessDenied(String),

    #[error("host rejected classpath entry {path}: {reason}")]
    ClasspathRejected { path: String, reason: String },
}

/// Why a by-name invocation failed. The three reflective causes stay
/// distinguishable all the way up to the log line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvocationFault {
    /// The method does not exist with the requested shape. Usually a host
    /// library that is too old.
    #[error("method {method} does not exist on the target")]
    MissingMethod { method: String },

    /// The host's security policy refused the call.
    #[error("access to method {method} was denied")]
    AccessDenied { method: String },

    /// The method ran and threw; `cause` is the unwrapped underlying error.
    #[error("method {method} threw: {cause}")]
    Threw { method: String, cause: String },

    /// The call succeeded but returned something of the wrong shape.
    #[error("method {method} returned {found}, expected {expected}")]
    UnexpectedReturn {
        method: String,
        found: &'static str,
        expected: &'static str,
    },
}

/// A value crossing the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostValue<O> {
    Null,
    Str(String),
    Int(i32),
    Object(O),
}

impl<O> HostValue<O> {
    /// Short type label used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Object(_) => "object",
        }
    }
}

impl<O> From<Option<String>> for HostValue<O> {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Str)
    }
}

/// One parameter of a method signature, used to pick an overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType<C> {
    Class(C),
    Str,
    Int,
}

/// Operations the host process exposes to the bootstrap.
///
/// `Class`, `Object` and `Scope` are opaque handles owned by the host. A
/// `Scope` is the class-loading scope that defined a class; two classes with
/// the same name from different scopes are different classes.
pub trait HostRuntime {
    type Class: Clone + fmt::Debug;
    type Object: Clone + fmt::Debug;
    type Scope: fmt::Debug;

    /// Resolve a class through the host's own class-resolution facility.
    fn resolve_class(&self, name: &str) -> Result<Self::Class, HostFault>;

    /// Read a static field, forcing accessibility when it is not public.
    /// `Ok(None)` means the field holds null.
    fn read_static_field(
        &self,
        class: &Self::Class,
        field: &str,
    ) -> Result<Option<Self::Object>, HostFault>;

    /// The scope that defined `class`.
    fn defining_scope(&self, class: &Self::Class) -> Self::Scope;

    /// Resolve `name` as seen from `scope`, without initializing it.
    fn resolve_in_scope(&self, scope: &Self::Scope, name: &str) -> Option<Self::Class>;

    /// Whether `object` is an instance of `class`.
    fn is_instance(&self, class: &Self::Class, object: &Self::Object) -> bool;

    /// Fully qualified name of `class`.
    fn class_name(&self, class: &Self::Class) -> String;

    /// Every class currently resident in the process, in any scope.
    fn resident_classes(&self) -> Vec<Self::Class>;

    /// Append an artifact to the primary application classpath. There is no
    /// inverse operation.
    fn append_to_primary_classpath(&self, artifact: &Path) -> Result<(), HostFault>;

    /// Resolve and initialize `name` through the primary application scope.
    fn load_primary(&self, name: &str) -> Option<Self::Class>;

    /// Invoke a public instance method by name.
    fn invoke(
        &self,
        target: &Self::Object,
        method: &str,
        args: &[HostValue<Self::Object>],
    ) -> Result<HostValue<Self::Object>, InvocationFault>;

    /// Invoke a static method picked by name and exact parameter shape,
    /// forcing accessibility.
    fn invoke_static(
        &self,
        class: &Self::Class,
        method: &str,
        shape: &[ParamType<Self::Class>],
        args: Vec<HostValue<Self::Object>>,
    ) -> Result<HostValue<Self::Object>, InvocationFault>;
}
