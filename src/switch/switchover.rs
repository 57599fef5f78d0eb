// ABOUTME: Generic switchover struct parameterized by state marker.
// ABOUTME: Holds the environment pair and which side is being retired.

use std::marker::PhantomData;

use crate::types::{Environment, EnvironmentPair, FleetName};

use super::state::Planned;

/// A blue/green switch in progress, parameterized by its current state.
///
/// Steps can only be taken in protocol order; calling a step from the wrong
/// state does not compile:
///
/// ```compile_fail
/// use fleetkeeper::gateway::InMemoryFleet;
/// use fleetkeeper::switch::Switchover;
/// use fleetkeeper::types::{Environment, EnvironmentPair, FleetName};
///
/// # async fn run() {
/// let pair = EnvironmentPair::new(
///     FleetName::new("ci-blue").unwrap(),
///     FleetName::new("ci-green").unwrap(),
/// );
/// let gateway = InMemoryFleet::new();
/// let planned = Switchover::plan(pair, Some(Environment::Blue));
/// // Traffic cannot move before the new fleet is up and validated.
/// let _ = planned.switch_traffic(&gateway).await;
/// # }
/// ```
#[derive(Debug)]
pub struct Switchover<S> {
    pub(crate) pair: EnvironmentPair,
    pub(crate) old: Environment,
    pub(crate) _state: PhantomData<S>,
}

impl Switchover<Planned> {
    /// Plan a switch away from `active`.
    ///
    /// With no active environment, blue is treated as active and green as
    /// the target.
    pub fn plan(pair: EnvironmentPair, active: Option<Environment>) -> Self {
        let old = match active {
            Some(env) => env,
            None => {
                tracing::warn!("no active environment, treating blue as active");
                Environment::Blue
            }
        };
        Switchover {
            pair,
            old,
            _state: PhantomData,
        }
    }
}

impl<S> Switchover<S> {
    /// Environment being retired.
    pub fn old(&self) -> Environment {
        self.old
    }

    /// Environment being brought up.
    pub fn new_environment(&self) -> Environment {
        self.old.opposite()
    }

    pub fn old_fleet(&self) -> &FleetName {
        self.pair.fleet(self.old)
    }

    pub fn new_fleet(&self) -> &FleetName {
        self.pair.fleet(self.new_environment())
    }

    pub fn pair(&self) -> &EnvironmentPair {
        &self.pair
    }
}
