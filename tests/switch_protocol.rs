// ABOUTME: Integration tests for the blue/green switch protocol.
// ABOUTME: Drives the orchestrator against the in-memory fleet through success, rollback, and failures.

mod support;

use fleetkeeper::gateway::memory::Operation;
use fleetkeeper::gateway::{CapacityBounds, InMemoryFleet, InstanceHealth};
use fleetkeeper::notify::{MemoryNotifier, SWITCH_SUBJECT};
use fleetkeeper::switch::{
    HealthStatus, SwitchError, SwitchErrorKind, SwitchOrchestrator, SwitchOutcome, SwitchRequest,
};
use fleetkeeper::types::Environment;
use support::{SickAfterHealthy, blue_green, fast_switch, init_tracing};

mod switching {
    use super::*;

    #[tokio::test]
    async fn moves_traffic_to_the_standby_fleet() {
        init_tracing();
        let (gateway, pair) = blue_green();
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Switched);
        assert_eq!(result.active_environment, Some(Environment::Green));
        assert_eq!(result.message, "Deployment switch completed: blue -> green");
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.green));
        assert_eq!(gateway.bounds(&pair.green), Some(CapacityBounds::ACTIVE));
        assert_eq!(gateway.bounds(&pair.blue), Some(CapacityBounds::DORMANT));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, SWITCH_SUBJECT);
    }

    #[tokio::test]
    async fn switching_twice_returns_to_blue() {
        let (gateway, pair) = blue_green();
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        orchestrator.run(SwitchRequest::switch()).await.unwrap();
        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.active_environment, Some(Environment::Blue));
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.blue));
        assert_eq!(gateway.bounds(&pair.green), Some(CapacityBounds::DORMANT));
    }

    #[tokio::test]
    async fn unknown_active_environment_switches_from_blue() {
        let pair = support::pair();
        let gateway = InMemoryFleet::new();
        gateway.add_fleet(&pair.blue, CapacityBounds::ACTIVE);
        gateway.add_fleet(&pair.green, CapacityBounds::DORMANT);
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Switched);
        assert_eq!(result.active_environment, Some(Environment::Green));
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.green));
    }

    #[tokio::test]
    async fn instances_warming_up_are_waited_for() {
        let (gateway, pair) = blue_green();
        gateway.set_warmup_reads(&pair.green, 3);
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Switched);
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.green));
    }
}

mod timeout {
    use super::*;

    #[tokio::test]
    async fn is_returned_as_an_error_without_moving_traffic() {
        init_tracing();
        let (gateway, pair) = blue_green();
        gateway.set_launch_health(&pair.green, InstanceHealth::Unhealthy);
        let blue_before = gateway.instance_ids(&pair.blue);
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let err = orchestrator.run(SwitchRequest::switch()).await.unwrap_err();

        assert_eq!(err.kind(), SwitchErrorKind::HealthTimeout);
        assert!(matches!(err, SwitchError::HealthTimeout { ref fleet, .. } if *fleet == pair.green));
        assert_eq!(gateway.target_set(), blue_before);
        assert_eq!(gateway.bounds(&pair.blue), Some(CapacityBounds::ACTIVE));
        assert!(notifier.contains("Deployment switch failed"));
    }
}

mod rollback {
    use super::*;

    #[tokio::test]
    async fn failed_validation_rolls_back_to_the_old_fleet() {
        init_tracing();
        let (gateway, pair) = blue_green();
        let sick = SickAfterHealthy::new(&gateway, &pair.green);
        let blue_before = gateway.instance_ids(&pair.blue);
        let notifier = MemoryNotifier::new();
        let orchestrator = SwitchOrchestrator::new(&sick, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::RolledBack);
        assert_eq!(result.active_environment, Some(Environment::Blue));
        assert_eq!(
            result.message,
            "Deployment rolled back due to health check failures"
        );
        assert!(result.errors[0].contains("failed validation"));
        assert_eq!(gateway.target_set(), blue_before);
        assert_eq!(gateway.bounds(&pair.blue), Some(CapacityBounds::ACTIVE));
        assert_eq!(gateway.bounds(&pair.green), Some(CapacityBounds::DORMANT));
        assert!(notifier.contains("rolled back"));
    }

    #[tokio::test]
    async fn rollback_that_cannot_retire_the_new_fleet_is_a_failure() {
        let (gateway, pair) = blue_green();
        let sick = SickAfterHealthy::new(&gateway, &pair.green).then_fail(Operation::SetCapacity);
        let notifier = MemoryNotifier::new();
        let orchestrator = SwitchOrchestrator::new(&sick, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Failed);
        assert!(result.message.starts_with("Rollback failed: "));
        assert!(result.message.contains("retire ci-green"));
        assert_eq!(result.errors.len(), 2);
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.blue));
    }
}

mod gateway_failures {
    use super::*;

    #[tokio::test]
    async fn scale_up_failure_changes_nothing() {
        let (gateway, pair) = blue_green();
        gateway.fail(Operation::SetCapacity, Some(&pair.green));
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Failed);
        assert_eq!(result.active_environment, Some(Environment::Blue));
        assert!(result.message.starts_with("Deployment switch failed: scale up new fleet failed"));
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.blue));
        assert!(gateway.history().is_empty());
    }

    #[tokio::test]
    async fn traffic_switch_failure_keeps_the_old_fleet_active() {
        let (gateway, pair) = blue_green();
        gateway.fail(Operation::SetTargetSet, None);
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Failed);
        assert_eq!(result.active_environment, Some(Environment::Blue));
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.blue));
    }

    #[tokio::test]
    async fn scale_down_failure_leaves_traffic_on_the_new_fleet() {
        let (gateway, pair) = blue_green();
        gateway.fail(Operation::SetCapacity, Some(&pair.blue));
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Failed);
        assert_eq!(result.active_environment, Some(Environment::Green));
        assert_eq!(gateway.target_set(), gateway.instance_ids(&pair.green));
        assert_eq!(gateway.bounds(&pair.blue), Some(CapacityBounds::ACTIVE));
    }

    #[tokio::test]
    async fn unreadable_target_set_fails_before_touching_fleets() {
        let (gateway, pair) = blue_green();
        gateway.fail(Operation::TargetSetMembers, None);
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::switch()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::Failed);
        assert_eq!(result.active_environment, None);
        assert!(gateway.history().is_empty());
    }
}

mod health_check {
    use super::*;

    #[tokio::test]
    async fn reports_the_active_fleet_without_changes() {
        let (gateway, pair) = blue_green();
        let notifier = MemoryNotifier::new();
        let orchestrator =
            SwitchOrchestrator::new(&gateway, &notifier, pair.clone(), fast_switch());

        let result = orchestrator.run(SwitchRequest::check()).await.unwrap();

        assert_eq!(result.outcome, SwitchOutcome::HealthCheckReport);
        assert_eq!(result.active_environment, Some(Environment::Blue));
        let health = result.health.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!((health.healthy_count, health.total_count), (1, 1));
        assert!(result.message.starts_with("Health check: blue (ci-blue) is healthy"));
        assert!(gateway.history().is_empty());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn unhealthy_instances_are_degraded() {
        let (gateway, pair) = blue_green();
        gateway.set_instance_health(&pair.blue, InstanceHealth::Unhealthy);
        let notifier = MemoryNotifier::new();
        let orchestrator = SwitchOrchestrator::new(&gateway, &notifier, pair, fast_switch());

        let result = orchestrator.run(SwitchRequest::check()).await.unwrap();

        let health = result.health.unwrap();
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.percentage, 0.0);
    }

    #[tokio::test]
    async fn no_routed_instances_is_unknown() {
        let (gateway, pair) = blue_green();
        gateway.route_to(&pair.green);
        let notifier = MemoryNotifier::new();
        let orchestrator = SwitchOrchestrator::new(&gateway, &notifier, pair, fast_switch());

        let result = orchestrator.run(SwitchRequest::check()).await.unwrap();

        assert_eq!(result.active_environment, None);
        assert_eq!(result.health.unwrap().status, HealthStatus::Unknown);
    }

    #[tokio::test]
    async fn failed_read_is_an_error_status() {
        let (gateway, pair) = blue_green();
        gateway.fail(Operation::FleetState, Some(&pair.blue));
        let notifier = MemoryNotifier::new();
        let orchestrator = SwitchOrchestrator::new(&gateway, &notifier, pair, fast_switch());

        let result = orchestrator.run(SwitchRequest::check()).await.unwrap();

        assert_eq!(result.active_environment, None);
        let health = result.health.unwrap();
        assert_eq!(health.status, HealthStatus::Error);
        assert!(health.message.unwrap().contains("injected failure"));
    }
}
