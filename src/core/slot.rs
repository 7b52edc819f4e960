//! Versioned completion slot.
//!
//! A slot is one reusable completion core. Its version is advanced every
//! time the slot is consumed, so a `(index, version)` pair identifies exactly
//! one create→consume cycle. Every mutation compares the caller's version
//! against the live one under the state lock; the atomic copy lets stale
//! callers bail out without touching the lock.

use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::task::Waker;

use crate::api::error::{CancelCause, CompletionStatus, Fault, SourceError};
use crate::core::registration::{Registration, RegistrationKind};
use crate::sync::atomics::PoolCounters;
use crate::sync::mutex::Mutex;

/// Version counter for handle validation.
pub(crate) type Generation = u32;

/// First version handed out by a fresh slot.
pub(crate) const INITIAL_GENERATION: Generation = 1;

/// Terminal state (or lack of one) for the current cycle.
pub(crate) enum Outcome<T> {
    Pending,
    Succeeded(T),
    Faulted(Fault),
    Canceled(CancelCause),
}

impl<T> Outcome<T> {
    pub(crate) fn status(&self) -> CompletionStatus {
        match self {
            Self::Pending => CompletionStatus::Pending,
            Self::Succeeded(_) => CompletionStatus::Succeeded,
            Self::Faulted(_) => CompletionStatus::Faulted,
            Self::Canceled(_) => CompletionStatus::Canceled,
        }
    }

    fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub(crate) fn into_result(self) -> Option<Result<T, SourceError>> {
        match self {
            Self::Pending => None,
            Self::Succeeded(value) => Some(Ok(value)),
            Self::Faulted(fault) => Some(Err(SourceError::Faulted(fault))),
            Self::Canceled(cause) => Some(Err(SourceError::Canceled(cause))),
        }
    }
}

/// The single subscriber of a cycle.
pub(crate) enum Continuation {
    Callback(Box<dyn FnOnce() + Send + 'static>),
    Waker(Waker),
}

impl Continuation {
    fn invoke(self) {
        match self {
            Self::Callback(callback) => callback(),
            Self::Waker(waker) => waker.wake(),
        }
    }
}

/// Which kind of subscriber has claimed the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subscriber {
    None,
    Callback,
    Waker,
}

struct SlotState<T> {
    outcome: Outcome<T>,
    subscriber: Subscriber,
    continuation: Option<Continuation>,
    timeout: Registration,
    external: Registration,
}

impl<T> SlotState<T> {
    fn new() -> Self {
        Self {
            outcome: Outcome::Pending,
            subscriber: Subscriber::None,
            continuation: None,
            timeout: Registration::default(),
            external: Registration::default(),
        }
    }

    fn registration_mut(&mut self, kind: RegistrationKind) -> &mut Registration {
        match kind {
            RegistrationKind::Timeout => &mut self.timeout,
            RegistrationKind::External => &mut self.external,
        }
    }
}

/// One reusable completion core.
pub(crate) struct Slot<T> {
    index: u32,
    version: AtomicU32,
    state: Mutex<SlotState<T>>,
    counters: Arc<PoolCounters>,
}

impl<T> Slot<T> {
    pub(crate) fn new(index: u32, counters: Arc<PoolCounters>) -> Self {
        Self {
            index,
            version: AtomicU32::new(INITIAL_GENERATION),
            state: Mutex::new(SlotState::new()),
            counters,
        }
    }

    pub(crate) fn version(&self) -> Generation {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn is_live(&self, version: Generation) -> bool {
        self.version() == version
    }

    /// Current state of the slot, whatever cycle it is in.
    pub(crate) fn status(&self) -> CompletionStatus {
        self.state.lock().outcome.status()
    }

    /// Attempt the terminal transition for `version`.
    ///
    /// Returns false without side effects if the version is stale or the
    /// cycle already finished. On success both registrations are disposed and
    /// the continuation, if any, runs on the calling thread after the lock is
    /// released.
    pub(crate) fn try_complete(&self, version: Generation, outcome: Outcome<T>) -> bool {
        if !self.is_live(version) {
            self.reject(version);
            return false;
        }

        let status = outcome.status();
        let timed_out = matches!(outcome, Outcome::Canceled(CancelCause::Timeout(_)));

        let (continuation, mut timeout, mut external) = {
            let mut state = self.state.lock();
            if !self.is_live(version) || !state.outcome.is_pending() {
                drop(state);
                self.reject(version);
                return false;
            }
            state.outcome = outcome;
            (
                state.continuation.take(),
                mem::take(&mut state.timeout),
                mem::take(&mut state.external),
            )
        };

        match status {
            CompletionStatus::Succeeded => self.counters.succeeded.increment(),
            CompletionStatus::Faulted => self.counters.faulted.increment(),
            CompletionStatus::Canceled => self.counters.canceled.increment(),
            CompletionStatus::Pending => {}
        }
        if timed_out {
            self.counters.timeouts.increment();
        }
        ps_trace!("slot {} version {} -> {}", self.index, version, status);

        self.dispose_registration(&mut timeout);
        self.dispose_registration(&mut external);

        if let Some(continuation) = continuation {
            continuation.invoke();
        }
        true
    }

    /// Store the one callback subscriber of this cycle.
    ///
    /// If the cycle already finished, the callback runs immediately.
    pub(crate) fn subscribe(&self, version: Generation, callback: Box<dyn FnOnce() + Send + 'static>) {
        let mut state = self.state.lock();
        self.check_subscribe(version, state.subscriber);
        state.subscriber = Subscriber::Callback;

        if state.outcome.is_pending() {
            state.continuation = Some(Continuation::Callback(callback));
        } else {
            drop(state);
            callback();
        }
    }

    /// Register or refresh the waker of an awaiting task.
    ///
    /// Returns true once the cycle has reached a terminal state.
    pub(crate) fn poll_terminal(&self, version: Generation, waker: &Waker) -> bool {
        let mut state = self.state.lock();
        if state.subscriber != Subscriber::Waker {
            self.check_subscribe(version, state.subscriber);
            state.subscriber = Subscriber::Waker;
        } else if !self.is_live(version) {
            drop(state);
            ps_violation!(PS003, "slot {} polled with version {}", self.index, version);
        }

        if !state.outcome.is_pending() {
            return true;
        }

        match &state.continuation {
            Some(Continuation::Waker(current)) if current.will_wake(waker) => {}
            _ => state.continuation = Some(Continuation::Waker(waker.clone())),
        }
        false
    }

    fn check_subscribe(&self, version: Generation, subscriber: Subscriber) {
        if !self.is_live(version) {
            ps_violation!(PS003, "slot {} subscribed with version {}", self.index, version);
        }
        if subscriber != Subscriber::None {
            ps_violation!(
                PS001,
                "slot {} version {} already has a {:?} subscriber",
                self.index,
                version,
                subscriber
            );
        }
    }

    /// Attach a cancellation watcher to the live cycle.
    ///
    /// If the cycle is stale or already terminal the registration is
    /// disposed right away and false is returned. A previous registration of
    /// the same kind is replaced and disposed.
    pub(crate) fn attach(
        &self,
        version: Generation,
        kind: RegistrationKind,
        mut registration: Registration,
    ) -> bool {
        let mut previous = {
            let mut state = self.state.lock();
            if !self.is_live(version) || !state.outcome.is_pending() {
                drop(state);
                registration.dispose();
                return false;
            }
            mem::replace(state.registration_mut(kind), registration)
        };
        self.counters.live_registrations.inc();
        self.dispose_registration(&mut previous);
        true
    }

    /// Take the terminal outcome and reset the slot for its next cycle.
    ///
    /// Clears the subscriber, disposes any leftover registrations and
    /// advances the version, which invalidates every handle of this cycle.
    pub(crate) fn take_terminal(&self, version: Generation) -> Result<T, SourceError> {
        let (outcome, mut timeout, mut external) = {
            let mut state = self.state.lock();
            if !self.is_live(version) {
                drop(state);
                ps_violation!(PS003, "slot {} consumed with version {}", self.index, version);
            }
            if state.outcome.is_pending() {
                drop(state);
                ps_violation!(PS002, "slot {} version {} is still pending", self.index, version);
            }

            let outcome = mem::replace(&mut state.outcome, Outcome::Pending);
            state.subscriber = Subscriber::None;
            state.continuation = None;
            let timeout = mem::take(&mut state.timeout);
            let external = mem::take(&mut state.external);
            self.version
                .store(version.wrapping_add(1), Ordering::Release);
            (outcome, timeout, external)
        };

        self.dispose_registration(&mut timeout);
        self.dispose_registration(&mut external);

        match outcome.into_result() {
            Some(result) => result,
            None => ps_violation!(PS901, "slot {} lost its outcome during reset", self.index),
        }
    }

    fn dispose_registration(&self, registration: &mut Registration) {
        if registration.dispose() {
            self.counters.live_registrations.dec();
        }
    }

    fn reject(&self, version: Generation) {
        self.counters.stale_rejections.increment();
        ps_trace!(
            "[{}] slot {} ignored completion for version {}",
            crate::diagnostics::PS101.code,
            self.index,
            version
        );
    }
}
