//! Bootstrap failure taxonomy.

use std::error::Error as _;
use std::fmt;
use std::path::PathBuf;

use jdig_common::PayloadError;
use thiserror::Error;

use crate::runtime::{HostFault, InvocationFault};

/// Which reflective call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStage {
    /// Reading the environment name from the context.
    Environment,
    /// Calling the service's startup entry point.
    EntryPoint,
}

impl fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str("environment resolution"),
            Self::EntryPoint => f.write_str("service entry point"),
        }
    }
}

/// Coarse failure category carried by an [`InjectionResult`](crate::InjectionResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Lookup,
    TypeValidation,
    ClassLoad,
    ReflectionInvocation,
    /// The host adapter panicked; the panic was contained.
    Panic,
}

/// Everything that can abort a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("payload rejected: {0}")]
    Configuration(#[from] PayloadError),

    #[error("context locator '{0}' has no '#' separator")]
    MalformedLocator(String),

    #[error("cannot resolve context {locator}")]
    Lookup {
        locator: String,
        #[source]
        source: HostFault,
    },

    #[error("static field {locator} holds null")]
    NullContext { locator: String },

    #[error("capability {capability} is not visible from the scope that defined {class}")]
    CapabilityUnknown { capability: String, class: String },

    #[error("context held by {class} is not a {capability}")]
    NotCapable { capability: String, class: String },

    #[error("host rejected starter artifact {}", artifact.display())]
    ClasspathRejected {
        artifact: PathBuf,
        #[source]
        source: HostFault,
    },

    #[error("service class {class} not found after adding {}", artifact.display())]
    ServiceMissing { class: String, artifact: PathBuf },

    #[error("{stage} failed")]
    ReflectionInvocation {
        stage: InvocationStage,
        #[source]
        fault: InvocationFault,
    },
}

impl BootstrapError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) => FailureKind::Configuration,
            Self::MalformedLocator(_) | Self::Lookup { .. } | Self::NullContext { .. } => {
                FailureKind::Lookup
            }
            Self::CapabilityUnknown { .. } | Self::NotCapable { .. } => {
                FailureKind::TypeValidation
            }
            Self::ClasspathRejected { .. } | Self::ServiceMissing { .. } => FailureKind::ClassLoad,
            Self::ReflectionInvocation { .. } => FailureKind::ReflectionInvocation,
        }
    }

    /// The error and all of its sources joined into one line.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
