//! Step-level bootstrap behaviour.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use jdig_agent::{
    AgentBootstrap, AgentContract, BootstrapError, ExtendedClasspath, FailureKind, HostValue,
    InvocationFault, InvocationStage, Residency,
};
use jdig_common::AttachParameters;

use crate::fake_host::{
    AGENT, APP, Behaviour, CAPABILITY, Call, Class, FakeHost, Object, SERVICE, STARTER,
};

const PAYLOAD: &str = "starter=/a.jar&ctx=com.x.Y#Z&port=9090";

fn params(env: Option<&str>, env_key: Option<&str>) -> AttachParameters {
    AttachParameters {
        starter: STARTER.to_string(),
        ctx: "com.x.Y#Z".to_string(),
        env: env.map(str::to_string),
        env_key: env_key.map(str::to_string),
        port: 9090,
    }
}

// ── Step 1: required fields ──────────────────────────────────────────────────

#[test]
fn missing_required_field_stops_before_any_host_call() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    for payload in [
        "ctx=com.x.Y#Z&port=9090",
        "starter=/a.jar&port=9090",
        "starter=/a.jar&ctx=com.x.Y#Z",
        "starter=/a.jar&ctx=com.x.Y#Z&port=http",
    ] {
        let err = bootstrap.run(payload).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration, "{payload}");
    }
    assert!(host.calls().is_empty());
    assert!(host.entry_point_calls().is_empty());
}

// ── Step 2: context lookup ───────────────────────────────────────────────────

#[test]
fn unknown_holder_class_is_a_lookup_error() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.resolve_context("com.missing.Holder#ctx").unwrap_err();
    assert!(matches!(err, BootstrapError::Lookup { .. }));
    assert_eq!(err.kind(), FailureKind::Lookup);
}

#[test]
fn unknown_field_is_a_lookup_error() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.resolve_context("com.x.Y#nope").unwrap_err();
    assert_eq!(err.kind(), FailureKind::Lookup);
    assert!(err.chain().contains("no static field nope"));
}

#[test]
fn null_context_field_is_a_lookup_error() {
    let host = FakeHost::spring().with_context(None);
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.resolve_context("com.x.Y#Z").unwrap_err();
    assert!(matches!(err, BootstrapError::NullContext { .. }));
}

#[test]
fn locator_without_separator_never_reaches_the_host() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.resolve_context("com.x.Y").unwrap_err();
    assert!(matches!(err, BootstrapError::MalformedLocator(_)));
    assert!(host.calls().is_empty());
}

#[test]
fn resolved_context_debug_shows_the_handles() {
    // FakeHost itself has no Debug impl.
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let shown = format!("{context:?}");
    assert!(shown.starts_with("ResolvedContext"));
    assert!(shown.contains("holder"));
    assert!(shown.contains("scope"));
}

// ── Step 3: capability validation ────────────────────────────────────────────

#[test]
fn capability_is_checked_in_the_context_scope() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let capability = bootstrap.validate_capability(&context).unwrap();
    assert_eq!(capability, Class::new(CAPABILITY, APP));
}

#[test]
fn structurally_identical_context_from_another_scope_is_rejected() {
    // The object implements a capability type with the right name, but the
    // copy defined by the agent scope, not the one its holder's scope sees.
    let host = FakeHost::spring().with_context(Some(Object {
        id: "ctx",
        implements: vec![Class::new(CAPABILITY, AGENT)],
    }));
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let err = bootstrap.validate_capability(&context).unwrap_err();
    assert!(matches!(err, BootstrapError::NotCapable { .. }));
    assert_eq!(err.kind(), FailureKind::TypeValidation);
}

#[test]
fn capability_unknown_in_holder_scope_is_rejected() {
    let host = FakeHost::spring()
        .with_holder_scope(AGENT)
        .with_scope(AGENT, Vec::new());
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let err = bootstrap.validate_capability(&context).unwrap_err();
    assert!(matches!(err, BootstrapError::CapabilityUnknown { .. }));
    assert_eq!(err.kind(), FailureKind::TypeValidation);
}

// ── Step 4: idempotent service resolution ────────────────────────────────────

#[test]
fn service_is_loaded_once_then_reused() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let first = bootstrap.resolve_service(Path::new(STARTER)).unwrap();
    let second = bootstrap.resolve_service(Path::new(STARTER)).unwrap();

    assert_eq!(first.residency, Residency::Loaded);
    assert_eq!(second.residency, Residency::Resident);
    assert_eq!(first.class, second.class);
    assert_eq!(host.appended().len(), 1);
    assert_eq!(ledger.entries().len(), 1);
}

#[test]
fn resident_service_skips_classpath_extension() {
    let host = FakeHost::spring().with_resident(Class::new(SERVICE, AGENT));
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let service = bootstrap.resolve_service(Path::new(STARTER)).unwrap();
    assert_eq!(service.residency, Residency::Resident);
    assert_eq!(service.class, Class::new(SERVICE, AGENT));
    assert!(host.appended().is_empty());
    assert!(!host.calls().iter().any(|c| matches!(c, Call::LoadPrimary(_))));
}

#[test]
fn artifact_without_service_class_is_a_class_load_error() {
    let host = FakeHost::spring().with_artifact("/empty.jar", Vec::new());
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap
        .resolve_service(Path::new("/empty.jar"))
        .unwrap_err();
    assert!(matches!(err, BootstrapError::ServiceMissing { .. }));
    assert_eq!(err.kind(), FailureKind::ClassLoad);
}

#[test]
fn retry_with_same_bad_artifact_does_not_append_twice() {
    let host = FakeHost::spring().with_artifact("/empty.jar", Vec::new());
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let _ = bootstrap.resolve_service(Path::new("/empty.jar"));
    let err = bootstrap
        .resolve_service(Path::new("/empty.jar"))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ClassLoad);
    assert_eq!(host.appended().len(), 1);
}

#[test]
fn rejected_artifact_is_not_recorded() {
    let host = FakeHost::spring().rejecting_artifact(STARTER);
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.resolve_service(Path::new(STARTER)).unwrap_err();
    assert!(matches!(err, BootstrapError::ClasspathRejected { .. }));
    assert!(ledger.entries().is_empty());
}

// ── Step 5: environment resolution ───────────────────────────────────────────

#[test]
fn literal_env_never_consults_the_host() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();

    let env = bootstrap
        .resolve_env(&context, &params(Some("prod"), Some("spring.profiles.active")))
        .unwrap();
    assert_eq!(env.as_deref(), Some("prod"));
    assert!(!host.calls().iter().any(|c| matches!(c, Call::Invoke { .. })));
}

#[test]
fn env_key_reads_the_host_property() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();

    let env = bootstrap
        .resolve_env(&context, &params(None, Some("spring.profiles.active")))
        .unwrap();
    assert_eq!(env.as_deref(), Some("staging"));
}

#[test]
fn unset_property_leaves_env_empty() {
    let host = FakeHost::spring().with_method(
        "env",
        "getProperty",
        Behaviour::Return(HostValue::Null),
    );
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();

    let env = bootstrap
        .resolve_env(&context, &params(None, Some("missing.key")))
        .unwrap();
    assert_eq!(env, None);
}

#[test]
fn missing_environment_method_is_distinguishable_from_a_throwing_getter() {
    let contract = AgentContract::default();

    let old_host = FakeHost::spring().without_method("ctx", "getEnvironment");
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&old_host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let missing = bootstrap
        .resolve_env(&context, &params(None, Some("app.env")))
        .unwrap_err();

    let throwing_host = FakeHost::spring().with_method(
        "env",
        "getProperty",
        Behaviour::Fail(InvocationFault::Threw {
            method: "getProperty".to_string(),
            cause: "IllegalStateException: placeholder".to_string(),
        }),
    );
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&throwing_host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();
    let threw = bootstrap
        .resolve_env(&context, &params(None, Some("app.env")))
        .unwrap_err();

    assert!(matches!(
        missing,
        BootstrapError::ReflectionInvocation {
            stage: InvocationStage::Environment,
            fault: InvocationFault::MissingMethod { .. },
        }
    ));
    assert!(matches!(
        threw,
        BootstrapError::ReflectionInvocation {
            stage: InvocationStage::Environment,
            fault: InvocationFault::Threw { .. },
        }
    ));
    assert!(threw.chain().contains("IllegalStateException"));
}

#[test]
fn access_denied_on_environment_is_reported_as_such() {
    let host = FakeHost::spring().with_method(
        "ctx",
        "getEnvironment",
        Behaviour::Fail(InvocationFault::AccessDenied {
            method: "getEnvironment".to_string(),
        }),
    );
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();

    let err = bootstrap
        .resolve_env(&context, &params(None, Some("app.env")))
        .unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::ReflectionInvocation {
            fault: InvocationFault::AccessDenied { .. },
            ..
        }
    ));
}

#[test]
fn non_string_property_is_an_unexpected_return() {
    let host = FakeHost::spring().with_method(
        "env",
        "getProperty",
        Behaviour::Return(HostValue::Int(3)),
    );
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);
    let context = bootstrap.resolve_context("com.x.Y#Z").unwrap();

    let err = bootstrap
        .resolve_env(&context, &params(None, Some("app.env")))
        .unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::ReflectionInvocation {
            fault: InvocationFault::UnexpectedReturn { found: "int", .. },
            ..
        }
    ));
}

// ── Step 6: entry point ──────────────────────────────────────────────────────

#[test]
fn entry_point_receives_context_env_and_port() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let residency = bootstrap
        .run("starter=/a.jar&ctx=com.x.Y#Z&port=9090&env=prod")
        .unwrap();

    assert_eq!(residency, Residency::Loaded);
    let calls = host.entry_point_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][1], HostValue::Str("prod".to_string()));
    assert_eq!(calls[0][2], HostValue::Int(9090));
    assert!(matches!(&calls[0][0], HostValue::Object(o) if o.id == "ctx"));
}

#[test]
fn unset_env_is_passed_as_null() {
    let host = FakeHost::spring();
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    bootstrap.run(PAYLOAD).unwrap();
    assert_eq!(host.entry_point_calls()[0][1], HostValue::Null);
}

#[test]
fn throwing_entry_point_surfaces_its_cause() {
    let host = FakeHost::spring().with_entry_point(Behaviour::Fail(InvocationFault::Threw {
        method: "startDigServer".to_string(),
        cause: "BindException: Address already in use".to_string(),
    }));
    let contract = AgentContract::default();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.run(PAYLOAD).unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::ReflectionInvocation {
            stage: InvocationStage::EntryPoint,
            ..
        }
    ));
    assert!(err.chain().contains("Address already in use"));
}

#[test]
fn unknown_entry_point_is_a_missing_method() {
    let contract = AgentContract {
        entry_point: "startServer".to_string(),
        ..AgentContract::default()
    };
    let host = FakeHost::spring();
    let ledger = ExtendedClasspath::new();
    let bootstrap = AgentBootstrap::new(&host, &contract, &ledger);

    let err = bootstrap.run(PAYLOAD).unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::ReflectionInvocation {
            fault: InvocationFault::MissingMethod { .. },
            ..
        }
    ));
}
