// tests/lifecycle_properties.rs

use std::time::Duration;

use proptest::prelude::*;
use stackguard::lifecycle::{OpOutcome, PollStep, StopPolicy};
use stackguard::types::StackState;
use stackguard_test_utils::builders::{fake_coordinator, stack_fixture};
use stackguard_test_utils::fake_executor::{FakeExecutor, FakeResponse};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

/// Probe reply that makes `store` record the given non-running state.
fn probe_for(state: StackState) -> Option<FakeResponse> {
    match state {
        StackState::Stopped => Some(FakeResponse::none_running()),
        StackState::Unknown => Some(FakeResponse::exit(125, "daemon unavailable")),
        // NotFound comes from a missing compose file, not from the tool.
        _ => None,
    }
}

proptest! {
    #[test]
    fn schedule_is_bounded_and_sums_to_worst_case(
        settle_ms in 0u64..5_000,
        interval_ms in 0u64..5_000,
        attempts in 0u32..10,
    ) {
        let policy = StopPolicy {
            settle: Duration::from_millis(settle_ms),
            attempts,
            interval: Duration::from_millis(interval_ms),
        };
        let steps: Vec<PollStep> = policy.schedule().collect();

        let polls = steps.iter().filter(|s| matches!(s, PollStep::Poll(_))).count();
        prop_assert_eq!(polls as u32, attempts);
        prop_assert_eq!(steps.len(), 1 + 2 * attempts as usize);
        prop_assert_eq!(
            policy.worst_case_wait(),
            Duration::from_millis(settle_ms + interval_ms * attempts as u64)
        );
    }

    #[test]
    fn smart_ops_never_touch_stacks_that_were_not_running(
        state in prop_oneof![Just(StackState::Stopped), Just(StackState::Unknown)],
        name in "[a-z]{1,12}",
    ) {
        let (_dir, stack) = stack_fixture(&name);
        let mut executor = FakeExecutor::new();
        if let Some(reply) = probe_for(state) {
            executor = executor.on("ps", reply);
        }
        let (mut coordinator, executor, sleeper) = fake_coordinator(executor, false);

        let (stop, start) = block_on(async {
            let _ = coordinator.store(&name, &stack).await;
            let stop = coordinator.smart_stop(&name, &stack).await;
            let start = coordinator.smart_start(&name, &stack).await;
            (stop, start)
        });

        prop_assert_eq!(stop.unwrap(), OpOutcome::Skipped(state));
        prop_assert_eq!(start.unwrap(), OpOutcome::Skipped(state));
        prop_assert_eq!(executor.mutating_calls(), 0);
        prop_assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn dry_run_always_succeeds_without_mutating(
        running in proptest::bool::ANY,
        name in "[a-z]{1,12}",
    ) {
        let (_dir, stack) = stack_fixture(&name);
        let reply = if running {
            FakeResponse::running(&["svc"])
        } else {
            FakeResponse::none_running()
        };
        let (mut coordinator, executor, _sleeper) =
            fake_coordinator(FakeExecutor::new().on("ps", reply), true);

        let results = block_on(async {
            let _ = coordinator.store(&name, &stack).await;
            vec![
                coordinator.smart_stop(&name, &stack).await,
                coordinator.smart_start(&name, &stack).await,
                coordinator.force_start(&name, &stack).await,
            ]
        });

        for result in results {
            prop_assert!(result.is_ok());
        }
        prop_assert_eq!(executor.mutating_calls(), 0);
    }
}
