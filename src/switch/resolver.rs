// ABOUTME: Works out which half of the blue/green pair is serving traffic.
// ABOUTME: Compares the routing target set with the blue fleet's instances.

use std::collections::BTreeSet;

use crate::gateway::{GatewayError, InfrastructureGateway};
use crate::types::{Environment, EnvironmentPair, InstanceId};

/// Decide the active environment from a target set snapshot.
///
/// `None` means nothing has ever been routed. Any overlap with blue's
/// instances makes blue active; otherwise green is.
pub fn resolve_from(
    target_set: &BTreeSet<InstanceId>,
    blue_instances: &BTreeSet<InstanceId>,
) -> Option<Environment> {
    if target_set.is_empty() {
        return None;
    }
    if target_set.intersection(blue_instances).next().is_some() {
        Some(Environment::Blue)
    } else {
        Some(Environment::Green)
    }
}

/// Resolves the active environment through the gateway.
pub struct ActiveEnvironmentResolver<'a, G: ?Sized> {
    gateway: &'a G,
    pair: &'a EnvironmentPair,
}

impl<'a, G: InfrastructureGateway + ?Sized> ActiveEnvironmentResolver<'a, G> {
    pub fn new(gateway: &'a G, pair: &'a EnvironmentPair) -> Self {
        Self { gateway, pair }
    }

    /// Read failures are returned, never mapped to a default environment.
    pub async fn resolve(&self) -> Result<Option<Environment>, GatewayError> {
        let target_set = self.gateway.target_set_members().await?;
        if target_set.is_empty() {
            return Ok(None);
        }
        let blue = self.gateway.fleet_state(&self.pair.blue).await?;
        Ok(resolve_from(&target_set, &blue.instance_ids()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<InstanceId> {
        values.iter().map(|v| InstanceId::from(*v)).collect()
    }

    #[test]
    fn empty_target_set_is_unknown() {
        assert_eq!(resolve_from(&ids(&[]), &ids(&["i-1"])), None);
    }

    #[test]
    fn overlap_with_blue_means_blue() {
        assert_eq!(
            resolve_from(&ids(&["i-1", "i-9"]), &ids(&["i-1", "i-2"])),
            Some(Environment::Blue)
        );
    }

    #[test]
    fn no_overlap_means_green() {
        assert_eq!(
            resolve_from(&ids(&["i-7"]), &ids(&["i-1", "i-2"])),
            Some(Environment::Green)
        );
        assert_eq!(resolve_from(&ids(&["i-7"]), &ids(&[])), Some(Environment::Green));
    }
}
