//! In-memory host runtime for bootstrap tests.
//!
//! Classes are identified by name *and* defining scope, so a class with the
//! right name from the wrong scope is a different class, as in a real host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jdig_agent::{HostFault, HostRuntime, HostValue, InvocationFault, ParamType};

pub const APP: &str = "app";
pub const AGENT: &str = "agent";

pub const CAPABILITY: &str = "org.springframework.context.ApplicationContext";
pub const SERVICE: &str = "io.jdig.server.DigServerManager";
pub const HOLDER: &str = "com.x.Y";
pub const FIELD: &str = "Z";
pub const STARTER: &str = "/a.jar";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Class {
    pub name: String,
    pub scope: &'static str,
}

impl Class {
    pub fn new(name: &str, scope: &'static str) -> Self {
        Self {
            name: name.to_string(),
            scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub id: &'static str,
    pub implements: Vec<Class>,
}

#[derive(Debug, Clone)]
pub enum Behaviour {
    Return(HostValue<Object>),
    Fail(InvocationFault),
}

/// A recorded call on the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ResolveClass(String),
    ResidentScan,
    Append(PathBuf),
    LoadPrimary(String),
    Invoke { target: &'static str, method: String },
    InvokeStatic { method: String, args: Vec<HostValue<Object>> },
}

#[derive(Default)]
pub struct FakeHost {
    host_classes: HashMap<String, Class>,
    scopes: HashMap<&'static str, Vec<Class>>,
    statics: HashMap<(String, String), Option<Object>>,
    methods: HashMap<(&'static str, String), Behaviour>,
    static_methods: HashMap<(Class, String), (Vec<ParamType<Class>>, Behaviour)>,
    artifacts: HashMap<PathBuf, Vec<Class>>,
    rejected_artifacts: Vec<PathBuf>,
    resident: RefCell<Vec<Class>>,
    primary_classpath: RefCell<Vec<PathBuf>>,
    panic_on_resident_scan: bool,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeHost {
    /// A host with a valid context, an environment property, and a starter
    /// artifact carrying the service class. Nothing is resident yet.
    pub fn spring() -> Self {
        let capability = Class::new(CAPABILITY, APP);
        let service = Class::new(SERVICE, APP);
        let mut host = Self::default();
        host.host_classes
            .insert(HOLDER.to_string(), Class::new(HOLDER, APP));
        host.scopes.insert(APP, vec![capability.clone()]);
        host.statics.insert(
            (HOLDER.to_string(), FIELD.to_string()),
            Some(Object {
                id: "ctx",
                implements: vec![capability.clone()],
            }),
        );
        host.methods.insert(
            ("ctx", "getEnvironment".to_string()),
            Behaviour::Return(HostValue::Object(Object {
                id: "env",
                implements: Vec::new(),
            })),
        );
        host.methods.insert(
            ("env", "getProperty".to_string()),
            Behaviour::Return(HostValue::Str("staging".to_string())),
        );
        host.static_methods.insert(
            (service.clone(), "startDigServer".to_string()),
            (
                vec![ParamType::Class(capability), ParamType::Str, ParamType::Int],
                Behaviour::Return(HostValue::Null),
            ),
        );
        host.artifacts.insert(PathBuf::from(STARTER), vec![service]);
        host
    }

    pub fn with_method(mut self, target: &'static str, method: &str, behaviour: Behaviour) -> Self {
        self.methods.insert((target, method.to_string()), behaviour);
        self
    }

    pub fn without_method(mut self, target: &'static str, method: &str) -> Self {
        self.methods.remove(&(target, method.to_string()));
        self
    }

    pub fn with_context(mut self, object: Option<Object>) -> Self {
        self.statics
            .insert((HOLDER.to_string(), FIELD.to_string()), object);
        self
    }

    pub fn with_scope(mut self, scope: &'static str, classes: Vec<Class>) -> Self {
        self.scopes.insert(scope, classes);
        self
    }

    pub fn with_holder_scope(mut self, scope: &'static str) -> Self {
        self.host_classes
            .insert(HOLDER.to_string(), Class::new(HOLDER, scope));
        self
    }

    pub fn with_artifact(mut self, path: &str, classes: Vec<Class>) -> Self {
        self.artifacts.insert(PathBuf::from(path), classes);
        self
    }

    pub fn rejecting_artifact(mut self, path: &str) -> Self {
        self.rejected_artifacts.push(PathBuf::from(path));
        self
    }

    pub fn with_entry_point(mut self, behaviour: Behaviour) -> Self {
        let service = Class::new(SERVICE, APP);
        let capability = Class::new(CAPABILITY, APP);
        self.static_methods.insert(
            (service, "startDigServer".to_string()),
            (
                vec![ParamType::Class(capability), ParamType::Str, ParamType::Int],
                behaviour,
            ),
        );
        self
    }

    pub fn with_resident(self, class: Class) -> Self {
        self.resident.borrow_mut().push(class);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_resident_scan = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn appended(&self) -> Vec<PathBuf> {
        self.primary_classpath.borrow().clone()
    }

    pub fn entry_point_calls(&self) -> Vec<Vec<HostValue<Object>>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::InvokeStatic { args, .. } => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn touched_class_loading(&self) -> bool {
        self.calls.borrow().iter().any(|call| {
            matches!(
                call,
                Call::ResolveClass(_) | Call::ResidentScan | Call::Append(_) | Call::LoadPrimary(_)
            )
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl HostRuntime for FakeHost {
    type Class = Class;
    type Object = Object;
    type Scope = &'static str;

    fn resolve_class(&self, name: &str) -> Result<Class, HostFault> {
        self.record(Call::ResolveClass(name.to_string()));
        self.host_classes
            .get(name)
            .cloned()
            .ok_or_else(|| HostFault::ClassNotFound(name.to_string()))
    }

    fn read_static_field(&self, class: &Class, field: &str) -> Result<Option<Object>, HostFault> {
        self.statics
            .get(&(class.name.clone(), field.to_string()))
            .cloned()
            .ok_or_else(|| HostFault::NoSuchField {
                class: class.name.clone(),
                field: field.to_string(),
            })
    }

    fn defining_scope(&self, class: &Class) -> &'static str {
        class.scope
    }

    fn resolve_in_scope(&self, scope: &&'static str, name: &str) -> Option<Class> {
        self.scopes
            .get(scope)?
            .iter()
            .find(|class| class.name == name)
            .cloned()
    }

    fn is_instance(&self, class: &Class, object: &Object) -> bool {
        object.implements.contains(class)
    }

    fn class_name(&self, class: &Class) -> String {
        class.name.clone()
    }

    fn resident_classes(&self) -> Vec<Class> {
        assert!(!self.panic_on_resident_scan, "resident scan exploded");
        self.record(Call::ResidentScan);
        self.resident.borrow().clone()
    }

    fn append_to_primary_classpath(&self, artifact: &Path) -> Result<(), HostFault> {
        self.record(Call::Append(artifact.to_path_buf()));
        if self.rejected_artifacts.iter().any(|p| p == artifact) {
            return Err(HostFault::ClasspathRejected {
                path: artifact.display().to_string(),
                reason: "not a zip archive".to_string(),
            });
        }
        self.primary_classpath
            .borrow_mut()
            .push(artifact.to_path_buf());
        Ok(())
    }

    fn load_primary(&self, name: &str) -> Option<Class> {
        self.record(Call::LoadPrimary(name.to_string()));
        let classpath = self.primary_classpath.borrow();
        let class = classpath
            .iter()
            .filter_map(|path| self.artifacts.get(path))
            .flatten()
            .find(|class| class.name == name)
            .cloned()?;
        self.resident.borrow_mut().push(class.clone());
        Some(class)
    }

    fn invoke(
        &self,
        target: &Object,
        method: &str,
        _args: &[HostValue<Object>],
    ) -> Result<HostValue<Object>, InvocationFault> {
        self.record(Call::Invoke {
            target: target.id,
            method: method.to_string(),
        });
        match self.methods.get(&(target.id, method.to_string())) {
            Some(Behaviour::Return(value)) => Ok(value.clone()),
            Some(Behaviour::Fail(fault)) => Err(fault.clone()),
            None => Err(InvocationFault::MissingMethod {
                method: method.to_string(),
            }),
        }
    }

    fn invoke_static(
        &self,
        class: &Class,
        method: &str,
        shape: &[ParamType<Class>],
        args: Vec<HostValue<Object>>,
    ) -> Result<HostValue<Object>, InvocationFault> {
        let missing = || InvocationFault::MissingMethod {
            method: method.to_string(),
        };
        let (expected, behaviour) = self
            .static_methods
            .get(&(class.clone(), method.to_string()))
            .ok_or_else(missing)?;
        if expected.as_slice() != shape {
            return Err(missing());
        }
        self.record(Call::InvokeStatic {
            method: method.to_string(),
            args,
        });
        match behaviour {
            Behaviour::Return(value) => Ok(value.clone()),
            Behaviour::Fail(fault) => Err(fault.clone()),
        }
    }
}
