//! Deployment-mode detection.
//!
//! The restricted ("cloud") deployment mode tightens a few validation rules.
//! The mode is owned by the environment, so the probe is read on every
//! validation call and never cached here.

use std::collections::BTreeMap;

/// Env var: deployment mode reported by the hosting platform.
pub const ENV_DEPLOYMENT_MODE: &str = "DEPLOYMENT_MODE";
/// Deployment mode value that enables the restricted rules.
pub const RESTRICTED_DEPLOYMENT_MODE: &str = "cloud";

/// Answers whether the process runs in the restricted deployment mode.
pub trait DeploymentProbe {
    /// Returns true when restricted-mode rules apply.
    fn is_restricted(&self) -> bool;
}

impl<F> DeploymentProbe for F
where
    F: Fn() -> bool,
{
    fn is_restricted(&self) -> bool {
        self()
    }
}

/// Returns true when a raw `DEPLOYMENT_MODE` value selects restricted mode.
#[must_use]
pub fn is_restricted_deployment_mode(value: Option<&str>) -> bool {
    value.is_some_and(|mode| mode.trim().eq_ignore_ascii_case(RESTRICTED_DEPLOYMENT_MODE))
}

#[derive(Debug, Clone)]
enum EnvSource {
    Process,
    Map(BTreeMap<String, String>),
}

/// Probe backed by the `DEPLOYMENT_MODE` environment variable.
#[derive(Debug, Clone)]
pub struct EnvDeploymentProbe {
    source: EnvSource,
}

impl EnvDeploymentProbe {
    /// Read the live process environment on every call.
    #[must_use]
    pub const fn from_std_env() -> Self {
        Self {
            source: EnvSource::Process,
        }
    }

    /// Read from an explicit variable map (tests, embedding callers).
    #[must_use]
    pub const fn from_map(map: BTreeMap<String, String>) -> Self {
        Self {
            source: EnvSource::Map(map),
        }
    }
}

impl DeploymentProbe for EnvDeploymentProbe {
    fn is_restricted(&self) -> bool {
        match &self.source {
            EnvSource::Process => {
                is_restricted_deployment_mode(std::env::var(ENV_DEPLOYMENT_MODE).ok().as_deref())
            },
            EnvSource::Map(map) => {
                is_restricted_deployment_mode(map.get(ENV_DEPLOYMENT_MODE).map(String::as_str))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(value: &str) -> EnvDeploymentProbe {
        EnvDeploymentProbe::from_map(BTreeMap::from([(
            ENV_DEPLOYMENT_MODE.to_string(),
            value.to_string(),
        )]))
    }

    #[test]
    fn cloud_mode_is_restricted_case_insensitively() {
        assert!(probe("cloud").is_restricted());
        assert!(probe(" CLOUD ").is_restricted());
    }

    #[test]
    fn other_modes_are_unrestricted() {
        assert!(!probe("oss").is_restricted());
        assert!(!probe("").is_restricted());
        assert!(!EnvDeploymentProbe::from_map(BTreeMap::new()).is_restricted());
    }

    #[test]
    fn closures_act_as_probes() {
        let restricted = || true;
        assert!(restricted.is_restricted());
    }
}
