//! One-shot timeout signal driven by a Tokio timer.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ::tokio::runtime::Handle as RuntimeHandle;
use ::tokio::task::JoinHandle;
use ::tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::error::{CancelCause, WatchError};
use crate::api::handle::Handle;
use crate::api::pool::CompletionPool;
use crate::core::registration::RegistrationKind;

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const DISARMED: u8 = 2;

/// State of a single `arm()` call. The timer task and `disarm()` race on it
/// with a compare-exchange, so a disarmed timer can never cancel the signal.
struct Arm {
    state: Arc<AtomicU8>,
    timer: Option<JoinHandle<()>>,
    duration: Duration,
}

/// Cancels a [`CancellationToken`] after a delay unless disarmed first.
///
/// The controller owns one signal for its whole life. Once that signal has
/// fired it stays cancelled, so a fired controller is never re-armed: replace
/// it instead. [`reset`](Self::reset) reports this by returning `false`.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use poolsource::TimeoutController;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let mut controller = TimeoutController::current().unwrap();
/// let signal = controller.arm(Duration::from_millis(10));
///
/// signal.cancelled().await;
/// assert!(controller.is_fired());
/// assert!(!controller.reset());
/// # }
/// ```
pub struct TimeoutController {
    runtime: RuntimeHandle,
    signal: CancellationToken,
    arm: Option<Arm>,
}

impl TimeoutController {
    /// Create an unarmed controller whose timers run on `runtime`.
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            signal: CancellationToken::new(),
            arm: None,
        }
    }

    /// Create an unarmed controller on the ambient Tokio runtime.
    pub fn current() -> Result<Self, WatchError> {
        RuntimeHandle::try_current()
            .map(Self::new)
            .map_err(|_| {
                ps_emit!(PS201);
                WatchError::NoRuntime
            })
    }

    /// Schedule the signal to fire after `duration`.
    ///
    /// Arming again before the timer fires replaces the previous timer. A
    /// zero duration fires synchronously, before this call returns.
    ///
    /// # Panics
    ///
    /// Panics if the controller has already fired.
    pub fn arm(&mut self, duration: Duration) -> CancellationToken {
        if self.is_fired() {
            ps_violation!(PS005, "armed for {:?}", duration);
        }
        self.disarm();

        let state = Arc::new(AtomicU8::new(ARMED));
        if duration.is_zero() {
            state.store(FIRED, Ordering::Release);
            self.signal.cancel();
            self.arm = Some(Arm {
                state,
                timer: None,
                duration,
            });
            return self.signal.clone();
        }

        // Deadline is fixed now, not when the timer task is first polled
        let deadline = {
            let _context = self.runtime.enter();
            Instant::now() + duration
        };
        let timer_state = Arc::clone(&state);
        let signal = self.signal.clone();
        let timer = self.runtime.spawn(async move {
            ::tokio::time::sleep_until(deadline).await;
            if timer_state
                .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                signal.cancel();
            }
        });

        self.arm = Some(Arm {
            state,
            timer: Some(timer),
            duration,
        });
        self.signal.clone()
    }

    /// Stop a pending timer. Returns true if a timer was stopped.
    pub fn disarm(&mut self) -> bool {
        let Some(arm) = self.arm.as_mut() else {
            return false;
        };
        if arm
            .state
            .compare_exchange(ARMED, DISARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if let Some(timer) = arm.timer.take() {
            timer.abort();
        }
        true
    }

    /// Clear the armed timer so the controller can be armed again.
    ///
    /// Returns false if the signal has already fired; the controller must
    /// then be replaced.
    pub fn reset(&mut self) -> bool {
        if self.is_fired() {
            return false;
        }
        self.disarm();
        self.arm = None;
        true
    }

    /// True once the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// True while a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.arm
            .as_ref()
            .is_some_and(|arm| arm.state.load(Ordering::Acquire) == ARMED)
    }

    /// Duration of the most recent arm, if any.
    pub fn duration(&self) -> Option<Duration> {
        self.arm.as_ref().map(|arm| arm.duration)
    }

    /// The signal this controller cancels.
    pub fn signal(&self) -> CancellationToken {
        self.signal.clone()
    }

    pub(crate) fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    /// Race this controller's signal and an optional external signal against
    /// one cycle of `pool`.
    ///
    /// Whichever fires first cancels the cycle, with
    /// [`CancelCause::Timeout`] or [`CancelCause::External`]; the other is a
    /// no-op. The controller moves into the cycle's timeout registration and
    /// is dropped, disarming its timer, when the cycle finishes.
    ///
    /// Returns true if both watchers are attached to a still pending cycle.
    pub fn compose_with<T: Send + 'static>(
        self,
        pool: &CompletionPool<T>,
        handle: Handle<T>,
        external: Option<&CancellationToken>,
    ) -> Result<bool, WatchError> {
        let signal = self.signal();
        let cause = CancelCause::Timeout(self.duration().unwrap_or_default());
        let timed = pool.watch(handle, &signal, RegistrationKind::Timeout, cause, Some(self))?;

        let watched = match external {
            Some(external) => pool.register_external(handle, external)?,
            None => timed,
        };
        Ok(timed && watched)
    }
}

impl Drop for TimeoutController {
    fn drop(&mut self) {
        self.disarm();
    }
}

impl fmt::Debug for TimeoutController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutController")
            .field("armed", &self.is_armed())
            .field("fired", &self.is_fired())
            .field("duration", &self.duration())
            .finish()
    }
}
