//! Backend selection from the environment.

use serde::{Deserialize, Serialize};
use tessera_system::output::Output;

use crate::args::{Backend, DockerRedisArgs, RedisArgs};
use crate::error::RedisError;

/// Name of the Docker network the composition root creates by default.
pub const DEFAULT_NETWORK: &str = "net";

const BACKEND_VAR: &str = "TESSERA_REDIS_BACKEND";
const NETWORK_VAR: &str = "TESSERA_DOCKER_NETWORK";

/// Which backend to provision Redis on, as configured by the operator.
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | `TESSERA_REDIS_BACKEND` | unset | `docker`, `kubernetes`, `amazon` or an alias |
/// | `TESSERA_DOCKER_NETWORK` | `net` | network name for the Docker backend |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Requested backend name, unparsed.
    pub backend: Option<String>,
    /// Docker network name.
    pub network: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            backend: None,
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

impl RedisSettings {
    /// Reads the settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`. Empty values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            backend: read(BACKEND_VAR),
            network: read(NETWORK_VAR).unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
        }
    }

    /// Sets the requested backend.
    #[must_use]
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Parses the requested backend.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::UnknownBackend`] if none is requested or the name
    /// is not recognized.
    pub fn backend(&self) -> Result<Backend, RedisError> {
        self.backend
            .as_deref()
            .ok_or_else(RedisError::none_selected)?
            .parse()
    }

    /// Builds the arguments for [`Redis::create`](crate::Redis::create).
    /// `network` is only used by the Docker backend.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError::UnknownBackend`] if the backend cannot be parsed.
    pub fn args(&self, network: &Output<String>) -> Result<RedisArgs, RedisError> {
        Ok(match self.backend()? {
            Backend::Docker => RedisArgs::docker(DockerRedisArgs::on_network(network.clone())),
            Backend::Kubernetes => RedisArgs::kubernetes(),
            Backend::Amazon => RedisArgs::amazon(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = RedisSettings::from_lookup(lookup(&[]));
        assert_eq!(settings, RedisSettings::default());
        assert_eq!(settings.network, "net");
        assert_eq!(settings.backend().unwrap_err(), RedisError::none_selected());
    }

    #[test]
    fn reads_backend_and_network() {
        let settings = RedisSettings::from_lookup(lookup(&[
            ("TESSERA_REDIS_BACKEND", "managed"),
            ("TESSERA_DOCKER_NETWORK", "backend-net"),
        ]));
        assert_eq!(settings.backend().unwrap(), Backend::Amazon);
        assert_eq!(settings.network, "backend-net");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = RedisSettings::from_lookup(lookup(&[
            ("TESSERA_REDIS_BACKEND", "  "),
            ("TESSERA_DOCKER_NETWORK", ""),
        ]));
        assert_eq!(settings, RedisSettings::default());
    }

    #[test]
    fn args_match_backend() {
        let network = Output::resolved("net".to_string());
        let args = RedisSettings::default()
            .with_backend("docker")
            .args(&network)
            .unwrap();
        assert_eq!(args.populated(), vec![Backend::Docker]);
        assert!(args.docker.and_then(|docker| docker.network).is_some());

        let err = RedisSettings::default()
            .with_backend("memcached")
            .args(&network)
            .unwrap_err();
        assert_eq!(
            err,
            RedisError::UnknownBackend {
                requested: Some("memcached".into())
            }
        );
    }
}
