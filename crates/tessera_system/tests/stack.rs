//! Resource graph tests for `tessera_system`.
//!
//! These cover concurrent registration, provider inheritance through nested
//! components and the run loop's failure accounting.

use std::sync::{Arc, Barrier};
use std::thread;

use tessera_system::prelude::*;

const COMPONENT: ResourceType = ResourceType::from_static("tessera:docker:Redis");
const IMAGE: ResourceType = ResourceType::from_static("docker:index:RemoteImage");

/// Concurrent registrations of the same sibling: exactly one succeeds.
#[test]
fn concurrent_duplicate_registration() {
    let stack = Stack::new("dev");
    let parent = stack
        .register_resource(COMPONENT, "redis", &ResourceOptions::new())
        .unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stack = stack.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                stack.register_resource(IMAGE, "redis-image", &ResourceOptions::new().with_parent(parent))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ResourceError::DuplicateName { .. }))
    );
    assert_eq!(stack.children(parent).len(), 1);
}

/// Distinct names registered from many threads all land in the arena.
#[test]
fn concurrent_distinct_registration() {
    let stack = Stack::new("dev");
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let stack = stack.clone();
            thread::spawn(move || {
                stack
                    .register_resource(COMPONENT, format!("redis-{i}"), &ResourceOptions::new())
                    .unwrap()
            })
        })
        .collect();

    let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(stack.roots().len(), 16);
}

trait Registry: Send + Sync {
    fn endpoint(&self) -> String;
}

struct Fixed(&'static str);
impl Registry for Fixed {
    fn endpoint(&self) -> String {
        self.0.to_string()
    }
}

struct RegistryPlugin;
impl Plugin for RegistryPlugin {
    fn build(&self, stack: &mut StackBuilder) -> Result<(), StackError> {
        let default: Arc<dyn Registry> = Arc::new(Fixed("docker.io"));
        let mirror: Arc<dyn Registry> = Arc::new(Fixed("mirror.local"));
        stack.register_provider(ProviderRef::default_for("docker"), default)?;
        stack.register_provider(ProviderRef::new("docker", "mirror"), mirror)?;
        Ok(())
    }
}

/// A provider selected on an outer component reaches resources created by
/// an inner component that never mentions it.
#[tokio::test]
async fn provider_selection_reaches_nested_children() {
    let stack = StackBuilder::new("dev")
        .add_plugins(RegistryPlugin)
        .build()
        .unwrap();

    let outer = stack
        .register_resource(
            COMPONENT,
            "outer",
            &ResourceOptions::new().with_provider(ProviderRef::new("docker", "mirror")),
        )
        .unwrap();
    let inner = stack
        .register_resource(COMPONENT, "inner", &ResourceOptions::new().with_parent(outer))
        .unwrap();
    let image = stack
        .register_resource(IMAGE, "inner-image", &ResourceOptions::new().with_parent(inner))
        .unwrap();
    let standalone = stack
        .register_resource(IMAGE, "standalone-image", &ResourceOptions::new())
        .unwrap();

    let mirrored = stack.provider::<dyn Registry>(image).unwrap();
    let defaulted = stack.provider::<dyn Registry>(standalone).unwrap();

    let endpoint = stack
        .issue(image, async move { Ok(mirrored.endpoint()) })
        .unwrap();
    let default_endpoint = stack
        .issue(standalone, async move { Ok(defaulted.endpoint()) })
        .unwrap();

    assert!(stack.run().await.is_success());
    assert_eq!(endpoint.try_get(), Some(Ok("mirror.local".into())));
    assert_eq!(default_endpoint.try_get(), Some(Ok("docker.io".into())));
}

/// A chain of three dependent operations completes in one run.
#[tokio::test]
async fn dependent_chain_completes() {
    let stack = Stack::new("dev");
    let id = stack
        .register_resource(COMPONENT, "redis", &ResourceOptions::new())
        .unwrap();

    let image = stack.issue(id, async { Ok(String::from("sha256:abc")) }).unwrap();
    let container = stack
        .issue_with(id, &image, |image| async move { Ok(format!("container-of-{image}")) })
        .unwrap();
    let host = stack
        .issue_with(id, &container, |name| async move { Ok(name.to_uppercase()) })
        .unwrap();
    stack
        .register_outputs(id, Outputs::new().with("host", &host))
        .unwrap();

    let summary = stack.run().await;
    assert_eq!(summary.completed(), 3);
    assert_eq!(
        stack.outputs(id).unwrap().snapshot()["host"].as_str(),
        Some("CONTAINER-OF-SHA256:ABC")
    );
}

/// The failure report names the resource whose operation failed.
#[tokio::test]
async fn failures_carry_the_resource_urn() {
    let stack = Stack::new("prod");
    let parent = stack
        .register_resource(COMPONENT, "redis", &ResourceOptions::new())
        .unwrap();
    let image = stack
        .register_resource(IMAGE, "redis-image", &ResourceOptions::new().with_parent(parent))
        .unwrap();

    let _pulled = stack
        .issue::<String, _>(image, async { Err(OutputError::provisioning("redis-image", "manifest unknown")) })
        .unwrap();

    let summary = stack.run().await;
    let failure = &summary.failures()[0];
    assert_eq!(
        failure.urn.as_str(),
        "urn:tessera:prod::tessera:docker:Redis$docker:index:RemoteImage::redis/redis-image"
    );
    assert!(failure.to_string().contains("manifest unknown"));
}
