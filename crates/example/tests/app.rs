//! End-to-end runs of the example program against the simulated backends.

use example::{COMMANDER_IMAGE, COMMANDER_PORT, PUBLISHED_PORT, build};
use tessera_providers::docker::PortMapping;
use tessera_providers::sim::{SimBackends, SimKubernetes};
use tessera_redis::{Backend, RedisError, RedisSettings};
use tessera_system::output::OutputError;
use tessera_system::plugin::PluginGroup;
use tessera_system::stack::{Stack, StackBuilder};

fn stack_with(backends: &SimBackends) -> Stack {
    StackBuilder::new("dev")
        .add_plugins(backends.clone().build())
        .build()
        .unwrap()
}

#[tokio::test]
async fn docker_backend_wires_commander_to_redis_container() {
    let backends = SimBackends::new();
    let stack = stack_with(&backends);

    let app = build(&stack, &RedisSettings::default().with_backend("docker")).unwrap();
    assert_eq!(app.redis.backend(), Backend::Docker);

    let summary = stack.run().await;
    assert!(summary.is_success(), "{:?}", summary.failures());

    let redis_host = app.redis.host().try_get().unwrap().unwrap();
    let containers = backends.docker.containers();
    assert_eq!(containers.len(), 2);

    let commander = containers
        .iter()
        .find(|container| container.image == COMMANDER_IMAGE)
        .unwrap();
    assert_eq!(commander.envs, [format!("REDIS_HOST={redis_host}")]);
    assert_eq!(commander.ports, [PortMapping::new(COMMANDER_PORT, PUBLISHED_PORT)]);

    // Both containers share the one network.
    let networks = backends.docker.networks();
    assert_eq!(networks.len(), 1);
    assert!(containers.iter().all(|container| container.networks == [networks[0].name.clone()]));
}

#[tokio::test]
async fn exports_app_name_and_host() {
    let stack = stack_with(&SimBackends::new());
    let app = build(&stack, &RedisSettings::default().with_backend("managed")).unwrap();
    stack.run().await;

    let exports = stack.exports().snapshot();
    assert_eq!(exports.keys().collect::<Vec<_>>(), ["appName", "host"]);
    assert_eq!(exports["host"].as_str(), Some("http://localhost:3000"));

    let app_name = app.app_name.try_get().unwrap().unwrap();
    assert!(app_name.starts_with("redis-commander-"));
    assert_eq!(exports["appName"].as_str(), Some(app_name.as_str()));
}

#[tokio::test]
async fn unreachable_redis_blocks_commander() {
    let backends = SimBackends::new().with_kubernetes(SimKubernetes::new().with_ingress(vec![]));
    let stack = stack_with(&backends);
    let app = build(&stack, &RedisSettings::default().with_backend("clustered")).unwrap();

    let summary = stack.run().await;

    assert!(matches!(
        app.host.try_get(),
        Some(Err(OutputError::AddressUnavailable { .. }))
    ));
    assert!(backends.docker.containers().is_empty());
    assert_eq!(summary.failures().len(), 1);
    assert!(summary.failures()[0].skipped);
}

#[test]
fn missing_backend_is_reported_before_provisioning() {
    let stack = stack_with(&SimBackends::new());
    let err = build(&stack, &RedisSettings::default()).unwrap_err();

    assert!(matches!(
        err,
        example::AppError::Redis(RedisError::UnknownBackend { requested: None })
    ));
    assert_eq!(stack.queued(), 1);
}

#[test]
fn resource_tree_lists_every_declaration() {
    let stack = stack_with(&SimBackends::new());
    build(&stack, &RedisSettings::default().with_backend("amazon")).unwrap();

    let tree = stack.render_tree();
    for name in ["net", "redis", "redis-ec", "redis-commander-image", "redis-commander"] {
        assert!(tree.contains(name), "{name} missing from:\n{tree}");
    }
}
