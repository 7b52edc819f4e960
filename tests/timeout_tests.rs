//! Timeout and external-cancellation races.

#![cfg(feature = "tokio")]

use poolsource::{
    CancelCause, CancellationToken, CompletionPool, CompletionStatus, PoolConfig, SourceError,
    TimeoutController, WatchError,
};
use std::time::Duration;
use tokio::time::sleep;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn cancel_after(token: &CancellationToken, after: Duration) {
    let token = token.clone();
    tokio::spawn(async move {
        sleep(after).await;
        token.cancel();
    });
}

#[tokio::test(start_paused = true)]
async fn test_timeout_beats_later_external_signal() {
    let pool = CompletionPool::<u32>::new();
    let external = CancellationToken::new();
    cancel_after(&external, ms(50));

    let handle = pool.create();
    let err = pool
        .wait_with_timeout(handle, ms(10), Some(&external))
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.cancel_cause(), Some(&CancelCause::Timeout(ms(10))));

    // The external signal still fires later, against nothing
    sleep(ms(100)).await;
    assert!(external.is_cancelled());

    let stats = pool.stats();
    assert_eq!(stats.canceled, 1);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.live_registrations, 0);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn test_external_signal_beats_timeout() {
    let pool = CompletionPool::<u32>::new();
    let external = CancellationToken::new();
    cancel_after(&external, ms(5));

    let handle = pool.create();
    let err = pool
        .wait_with_timeout(handle, ms(50), Some(&external))
        .unwrap()
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Canceled(CancelCause::External)));

    sleep(ms(100)).await;
    let stats = pool.stats();
    assert_eq!(stats.timeouts, 0);
    assert_eq!(stats.live_registrations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_producer_beats_timeout() {
    let pool = CompletionPool::<u32>::new();
    let handle = pool.create();
    let completer = pool.completer(handle);
    tokio::spawn(async move {
        sleep(ms(5)).await;
        completer.try_set_result(7);
    });

    let value = pool
        .wait_with_timeout(handle, ms(50), None)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(pool.stats().live_registrations, 0);

    sleep(ms(100)).await;
    let stats = pool.stats();
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.canceled, 0);
    assert_eq!(stats.stale_rejections, 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_with_silent_signal() {
    let pool = CompletionPool::<u32>::new();
    let never = CancellationToken::new();
    let idle_before = pool.idle_count();

    let handle = pool.create();
    let err = pool
        .wait_with_timeout(handle, Duration::ZERO, Some(&never))
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.cancel_cause(), Some(&CancelCause::Timeout(Duration::ZERO)));

    assert_eq!(pool.stats().live_registrations, 0);
    assert_eq!(pool.in_flight_count(), 0);
    assert_eq!(pool.idle_count(), idle_before);

    let next = pool.create();
    assert_eq!(next.raw_index(), handle.raw_index());
    assert_eq!(pool.status(next), CompletionStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_external_signal_cancels_at_registration() {
    let pool = CompletionPool::<u32>::new();
    let external = CancellationToken::new();
    external.cancel();

    let handle = pool.create_with_timeout(Duration::from_secs(1), Some(&external)).unwrap();
    assert_eq!(pool.status(handle), CompletionStatus::Canceled);
    assert_eq!(pool.stats().live_registrations, 0);

    let err = pool.consume(handle).unwrap_err();
    assert_eq!(err.cancel_cause(), Some(&CancelCause::External));
}

#[tokio::test(start_paused = true)]
async fn test_late_completion_after_timeout_is_rejected() {
    let pool = CompletionPool::<u32>::new();
    let handle = pool.create_with_timeout(ms(10), None).unwrap();
    let completer = pool.completer(handle);

    sleep(ms(20)).await;
    assert_eq!(pool.status(handle), CompletionStatus::Canceled);
    assert!(!completer.try_set_result(1));
    assert!(pool.consume(handle).unwrap_err().cancel_cause().unwrap().is_timeout());
    assert!(completer.is_stale());
}

#[tokio::test(start_paused = true)]
async fn test_default_timeout_from_config() {
    let pool = CompletionPool::<u32>::with_config(PoolConfig::default().with_default_timeout(ms(30)));
    let fast = pool.create();
    let slow = pool.create();
    pool.try_set_result(fast, 1);
    assert_eq!(pool.stats().live_registrations, 1);

    assert_eq!(pool.awaitable(fast).await.unwrap(), 1);
    let err = pool.awaitable(slow).await.unwrap_err();
    assert_eq!(err.cancel_cause(), Some(&CancelCause::Timeout(ms(30))));
}

#[tokio::test(start_paused = true)]
async fn test_controller_compose_with_external() {
    let pool = CompletionPool::<u32>::new();
    let external = CancellationToken::new();
    let handle = pool.create();

    let mut controller = TimeoutController::current().unwrap();
    let signal = controller.arm(ms(40));
    assert!(controller.compose_with(&pool, handle, Some(&external)).unwrap());
    assert_eq!(pool.stats().live_registrations, 2);

    external.cancel();
    let err = pool.awaitable(handle).await.unwrap_err();
    assert_eq!(err.cancel_cause(), Some(&CancelCause::External));

    // Tearing down the registration dropped the controller and disarmed it
    sleep(ms(100)).await;
    assert!(!signal.is_cancelled());
    assert_eq!(pool.stats().live_registrations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_controller_reset_and_replace() {
    let mut controller = TimeoutController::current().unwrap();
    controller.arm(ms(10));
    assert!(controller.reset());
    assert!(!controller.is_armed());

    let signal = controller.arm(ms(10));
    signal.cancelled().await;
    assert!(controller.is_fired());
    assert!(!controller.reset());

    let mut replacement = TimeoutController::current().unwrap();
    let fresh = replacement.arm(ms(10));
    assert!(!fresh.is_cancelled());
}

#[tokio::test]
#[should_panic(expected = "PS005")]
async fn test_rearming_fired_controller_panics() {
    let mut controller = TimeoutController::current().unwrap();
    controller.arm(Duration::ZERO);
    controller.arm(ms(10));
}

#[test]
fn test_watchers_need_a_runtime() {
    let pool = CompletionPool::<u32>::with_config(PoolConfig::minimal());
    let handle = pool.create();

    assert_eq!(pool.register_timeout(handle, ms(10)), Err(WatchError::NoRuntime));
    assert_eq!(
        pool.register_external(handle, &CancellationToken::new()),
        Err(WatchError::NoRuntime)
    );
    assert_eq!(pool.status(handle), CompletionStatus::Pending);

    assert_eq!(pool.create_with_timeout(ms(10), None), Err(WatchError::NoRuntime));
    assert_eq!(pool.in_flight_count(), 1);
}

#[test]
fn test_configured_runtime_drives_watchers() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    let pool = CompletionPool::<u32>::with_config(
        PoolConfig::minimal().with_runtime(runtime.handle().clone()),
    );
    let handle = pool.create_with_timeout(ms(10), None).unwrap();

    let err = runtime.block_on(pool.awaitable(handle)).unwrap_err();
    assert!(err.cancel_cause().unwrap().is_timeout());
}
