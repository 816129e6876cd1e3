//! Resource constructor tests against the simulated backends.

use std::sync::Arc;

use tessera_providers::aws::elasticache::{Cluster, ClusterArgs};
use tessera_providers::docker::{
    Container, ContainerArgs, DockerPlugin, Network, NetworkArgs, PortMapping, RemoteImage,
    RemoteImageArgs, RestartPolicy,
};
use tessera_providers::kubernetes::{Service, ServiceArgs, ServicePort, ServiceType};
use tessera_providers::sim::{SimBackends, SimDocker};
use tessera_system::output::{Output, OutputError, OutputState};
use tessera_system::plugin::PluginGroup;
use tessera_system::provider::ProviderRef;
use tessera_system::resource::{ResourceError, ResourceOptions};
use tessera_system::stack::{Stack, StackBuilder};

fn stack_with(backends: &SimBackends) -> Stack {
    StackBuilder::new("test")
        .add_plugins(backends.clone().build())
        .build()
        .unwrap()
}

#[tokio::test]
async fn container_waits_for_image_and_network() {
    let backends = SimBackends::new();
    let stack = stack_with(&backends);
    let opts = ResourceOptions::new();

    let network = Network::new(&stack, "net", NetworkArgs { name: Some("net".into()) }, &opts).unwrap();
    let image = RemoteImage::new(&stack, "redis-image", RemoteImageArgs::kept("redis:latest"), &opts).unwrap();
    let container = Container::new(
        &stack,
        "redis-container",
        ContainerArgs {
            image: image.name.clone(),
            networks: vec![network.name.clone()],
            envs: vec![Output::resolved("MODE=standalone".to_string())],
            ports: vec![PortMapping::new(6379, 6379)],
            restart: RestartPolicy::OnFailure,
            ..ContainerArgs::default()
        },
        &opts,
    )
    .unwrap();

    assert_eq!(container.name.state(), OutputState::Pending);
    let summary = stack.run().await;
    assert!(summary.is_success(), "{:?}", summary.failures());

    let created = backends.docker.containers();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].image, "redis:latest");
    assert_eq!(created[0].networks, ["net"]);
    assert_eq!(created[0].envs, ["MODE=standalone"]);
    assert_eq!(created[0].restart, RestartPolicy::OnFailure);

    let name = container.name.try_get().unwrap().unwrap();
    assert!(name.starts_with("redis-container-"));
    assert_eq!(container.ports.try_get(), Some(Ok(vec![PortMapping::new(6379, 6379)])));
    assert!(stack.is_ready(container.id));
}

#[tokio::test]
async fn failed_pull_skips_container() {
    let backends = SimBackends::new().with_docker(SimDocker::new().fail_pull("redis:latest", "manifest unknown"));
    let stack = stack_with(&backends);
    let opts = ResourceOptions::new();

    let image = RemoteImage::new(&stack, "redis-image", RemoteImageArgs::kept("redis:latest"), &opts).unwrap();
    let container = Container::new(
        &stack,
        "redis-container",
        ContainerArgs {
            image: image.name.clone(),
            ..ContainerArgs::default()
        },
        &opts,
    )
    .unwrap();

    let summary = stack.run().await;

    assert!(backends.docker.containers().is_empty());
    let Some(Err(OutputError::Provisioning { resource, message })) = container.name.try_get() else {
        panic!("container name should have failed");
    };
    assert!(resource.ends_with("::redis-image"));
    assert_eq!(message, "request rejected: manifest unknown");
    assert_eq!(summary.failures().len(), 2);
}

#[tokio::test]
async fn service_exposes_status() {
    let backends = SimBackends::new();
    let stack = stack_with(&backends);

    let service = Service::new(
        &stack,
        "redis-svc",
        ServiceArgs {
            service_type: ServiceType::LoadBalancer,
            ports: vec![ServicePort {
                port: 6379,
                target_port: 6379,
            }],
            ..ServiceArgs::default()
        },
        &ResourceOptions::new(),
    )
    .unwrap();

    stack.run().await;
    let status = service.status.try_get().unwrap().unwrap();
    assert_eq!(status.load_balancer.ingress[0].address(), Some("203.0.113.10"));
}

#[tokio::test]
async fn cluster_reports_nodes() {
    let backends = SimBackends::new();
    let stack = stack_with(&backends);

    let cluster = Cluster::new(
        &stack,
        "cache",
        ClusterArgs {
            cluster_id: None,
            engine: "redis".into(),
            node_type: "cache.t2.micro".into(),
            num_cache_nodes: 1,
        },
        &ResourceOptions::new(),
    )
    .unwrap();

    stack.run().await;
    assert_eq!(cluster.cache_nodes.try_get().map(|r| r.map(|n| n.len())), Some(Ok(1)));
    assert_eq!(backends.elasticache.clusters()[0].node_type, "cache.t2.micro");
}

#[tokio::test]
async fn named_provider_instance_is_used() {
    let primary = Arc::new(SimDocker::new());
    let secondary = Arc::new(SimDocker::new());
    let stack = StackBuilder::new("test")
        .add_plugins(DockerPlugin::new(primary.clone()))
        .add_plugins(DockerPlugin::new(secondary.clone()).named("secondary"))
        .build()
        .unwrap();

    let opts = ResourceOptions::new().with_provider(ProviderRef::new("docker", "secondary"));
    RemoteImage::new(&stack, "redis-image", RemoteImageArgs::kept("redis:latest"), &opts).unwrap();
    stack.run().await;

    assert!(primary.images().is_empty());
    assert_eq!(secondary.images().len(), 1);
}

#[test]
fn missing_provider_is_a_construction_error() {
    let stack = Stack::new("test");
    let error = RemoteImage::new(
        &stack,
        "redis-image",
        RemoteImageArgs::kept("redis:latest"),
        &ResourceOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(error, ResourceError::Provider(_)));
    assert!(stack.is_empty());

    // The name stays free for a later attempt.
    let error = RemoteImage::new(
        &stack,
        "redis-image",
        RemoteImageArgs::kept("redis:latest"),
        &ResourceOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(error, ResourceError::Provider(_)));
}
