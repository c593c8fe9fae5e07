//! The six bootstrap steps, run in order inside the host.
//!
//! 1. validate the payload's required fields
//! 2. resolve the context object named by the locator
//! 3. check the context against the capability type, in the context's own scope
//! 4. find the service class, extending the classpath only if it is not resident
//! 5. resolve the environment name
//! 6. invoke the service entry point
//!
//! Each step returns early on failure; nothing after a failed step runs.

use std::fmt;
use std::path::Path;

use jdig_common::{AttachParameters, ContextLocator, EnvSource, decode};

use crate::classpath::ExtendedClasspath;
use crate::error::{BootstrapError, InvocationStage};
use crate::runtime::{HostRuntime, HostValue, InvocationFault, ParamType};

/// Names the bootstrap looks for inside the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContract {
    /// Service class shipped in the starter artifact.
    pub service_class: String,
    /// Capability the context object must satisfy.
    pub capability_type: String,
    /// Static entry point on the service class: `(capability, String, int)`.
    pub entry_point: String,
    /// No-arg method on the context returning its environment object.
    pub environment_method: String,
    /// `(String) -> String` lookup on the environment object.
    pub property_method: String,
}

impl Default for AgentContract {
    fn default() -> Self {
        Self {
            service_class: "io.jdig.server.DigServerManager".to_string(),
            capability_type: "org.springframework.context.ApplicationContext".to_string(),
            entry_point: "startDigServer".to_string(),
            environment_method: "getEnvironment".to_string(),
            property_method: "getProperty".to_string(),
        }
    }
}

/// Whether the service class was found already loaded or loaded just now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Resident,
    Loaded,
}

/// The context object plus the scope that defined its holder class.
pub struct ResolvedContext<R: HostRuntime> {
    pub holder: R::Class,
    pub object: R::Object,
    pub scope: R::Scope,
}

// Only the handles need `Debug`; the runtime itself does not.
impl<R: HostRuntime> fmt::Debug for ResolvedContext<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedContext")
            .field("holder", &self.holder)
            .field("object", &self.object)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Handle on the service class. The host keeps it for its whole lifetime.
#[derive(Debug, Clone)]
pub struct LoadedService<C> {
    pub class: C,
    pub residency: Residency,
}

/// One bootstrap run against a host.
pub struct AgentBootstrap<'a, R: HostRuntime> {
    runtime: &'a R,
    contract: &'a AgentContract,
    classpath: &'a ExtendedClasspath,
}

impl<'a, R: HostRuntime> AgentBootstrap<'a, R> {
    #[must_use]
    pub fn new(runtime: &'a R, contract: &'a AgentContract, classpath: &'a ExtendedClasspath) -> Self {
        Self {
            runtime,
            contract,
            classpath,
        }
    }

    /// Run all steps for one delivered payload.
    pub fn run(&self, payload: &str) -> Result<Residency, BootstrapError> {
        let params = Self::validate(payload)?;
        tracing::debug!(ctx = %params.ctx, port = params.port, "payload accepted");

        let context = self.resolve_context(&params.ctx)?;
        let capability = self.validate_capability(&context)?;
        let service = self.resolve_service(Path::new(&params.starter))?;
        tracing::info!(residency = ?service.residency, "service class ready");

        let env = self.resolve_env(&context, &params)?;
        self.invoke_entry_point(&service, capability, &context, env, params.port)?;
        Ok(service.residency)
    }

    /// Step 1.
    pub fn validate(payload: &str) -> Result<AttachParameters, BootstrapError> {
        Ok(decode(payload).into_parameters()?)
    }

    /// Step 2.
    pub fn resolve_context(&self, locator: &str) -> Result<ResolvedContext<R>, BootstrapError> {
        let located = ContextLocator::split(locator)
            .ok_or_else(|| BootstrapError::MalformedLocator(locator.to_string()))?;
        let lookup = |source| BootstrapError::Lookup {
            locator: locator.to_string(),
            source,
        };

        let holder = self
            .runtime
            .resolve_class(located.class_name())
            .map_err(lookup)?;
        let object = self
            .runtime
            .read_static_field(&holder, located.field_name())
            .map_err(lookup)?
            .ok_or_else(|| BootstrapError::NullContext {
                locator: locator.to_string(),
            })?;
        let scope = self.runtime.defining_scope(&holder);
        tracing::debug!(?scope, "context resolved");

        Ok(ResolvedContext {
            holder,
            object,
            scope,
        })
    }

    /// Step 3. Returns the capability class as seen from the context's scope,
    /// which is also the first parameter type of the entry point.
    pub fn validate_capability(
        &self,
        context: &ResolvedContext<R>,
    ) -> Result<R::Class, BootstrapError> {
        let capability_name = &self.contract.capability_type;
        let holder_name = self.runtime.class_name(&context.holder);

        let capability = self
            .runtime
            .resolve_in_scope(&context.scope, capability_name)
            .ok_or_else(|| BootstrapError::CapabilityUnknown {
                capability: capability_name.clone(),
                class: holder_name.clone(),
            })?;
        if !self.runtime.is_instance(&capability, &context.object) {
            return Err(BootstrapError::NotCapable {
                capability: capability_name.clone(),
                class: holder_name,
            });
        }
        Ok(capability)
    }

    /// Step 4. Reuses a resident service class; otherwise extends the primary
    /// classpath (once per artifact per process) and loads it.
    pub fn resolve_service(&self, starter: &Path) -> Result<LoadedService<R::Class>, BootstrapError> {
        let service_name = &self.contract.service_class;
        if let Some(class) = self.find_resident(service_name) {
            return Ok(LoadedService {
                class,
                residency: Residency::Resident,
            });
        }

        let extension = self
            .classpath
            .extend_with(starter, |artifact| {
                self.runtime.append_to_primary_classpath(artifact)
            })
            .map_err(|source| BootstrapError::ClasspathRejected {
                artifact: starter.to_path_buf(),
                source,
            })?;
        tracing::debug!(?extension, artifact = %starter.display(), "primary classpath");

        let class = self
            .runtime
            .load_primary(service_name)
            .ok_or_else(|| BootstrapError::ServiceMissing {
                class: service_name.clone(),
                artifact: starter.to_path_buf(),
            })?;
        Ok(LoadedService {
            class,
            residency: Residency::Loaded,
        })
    }

    /// Step 5.
    pub fn resolve_env(
        &self,
        context: &ResolvedContext<R>,
        params: &AttachParameters,
    ) -> Result<Option<String>, BootstrapError> {
        match params.env_source() {
            EnvSource::Literal(env) => Ok(Some(env.to_string())),
            EnvSource::Unset => Ok(None),
            EnvSource::Property(key) => self
                .read_env_property(&context.object, key)
                .map_err(|fault| BootstrapError::ReflectionInvocation {
                    stage: InvocationStage::Environment,
                    fault,
                }),
        }
    }

    /// Step 6.
    pub fn invoke_entry_point(
        &self,
        service: &LoadedService<R::Class>,
        capability: R::Class,
        context: &ResolvedContext<R>,
        env: Option<String>,
        port: u16,
    ) -> Result<(), BootstrapError> {
        let shape = [ParamType::Class(capability), ParamType::Str, ParamType::Int];
        let args = vec![
            HostValue::Object(context.object.clone()),
            HostValue::from(env),
            HostValue::Int(i32::from(port)),
        ];
        self.runtime
            .invoke_static(&service.class, &self.contract.entry_point, &shape, args)
            .map_err(|fault| BootstrapError::ReflectionInvocation {
                stage: InvocationStage::EntryPoint,
                fault,
            })?;
        Ok(())
    }

    fn find_resident(&self, name: &str) -> Option<R::Class> {
        self.runtime
            .resident_classes()
            .into_iter()
            .find(|class| self.runtime.class_name(class) == name)
    }

    fn read_env_property(
        &self,
        context: &R::Object,
        key: &str,
    ) -> Result<Option<String>, InvocationFault> {
        let environment_method = &self.contract.environment_method;
        let property_method = &self.contract.property_method;

        let environment = match self.runtime.invoke(context, environment_method, &[])? {
            HostValue::Object(environment) => environment,
            other => {
                return Err(InvocationFault::UnexpectedReturn {
                    method: environment_method.clone(),
                    found: other.kind(),
                    expected: "object",
                });
            }
        };
        match self
            .runtime
            .invoke(&environment, property_method, &[HostValue::Str(key.to_string())])?
        {
            HostValue::Str(value) => Ok(Some(value)),
            HostValue::Null => Ok(None),
            other => Err(InvocationFault::UnexpectedReturn {
                method: property_method.clone(),
                found: other.kind(),
                expected: "string",
            }),
        }
    }
}
