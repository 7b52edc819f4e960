//! Timeout and external-signal watchers for completion sources.

use std::sync::Arc;
use std::time::Duration;

use ::tokio::runtime::Handle as RuntimeHandle;
use tokio_util::sync::CancellationToken;

use crate::api::awaitable::Awaitable;
use crate::api::error::{CancelCause, WatchError};
use crate::api::handle::Handle;
use crate::api::pool::CompletionPool;
use crate::core::registration::{Registration, RegistrationKind};
use crate::core::slot::Outcome;

use super::timeout::TimeoutController;

impl<T: Send + 'static> CompletionPool<T> {
    /// Runtime used for timers and watchers: the configured one, else the
    /// ambient one.
    pub(crate) fn runtime(&self) -> Result<RuntimeHandle, WatchError> {
        self.available_runtime().ok_or_else(|| {
            ps_emit!(PS201);
            WatchError::NoRuntime
        })
    }

    fn available_runtime(&self) -> Option<RuntimeHandle> {
        match &self.config().runtime {
            Some(runtime) => Some(runtime.clone()),
            None => RuntimeHandle::try_current().ok(),
        }
    }

    /// Arm the configured default timeout on a freshly created cycle.
    ///
    /// Without a runtime the cycle is left without a timer. That is reported
    /// once per pool as a note, so strict mode does not turn `create()` into
    /// a panic.
    pub(crate) fn arm_default_timeout(&self, handle: Handle<T>, timeout: Duration) {
        if !timeout.is_zero() && self.available_runtime().is_none() {
            if !self.default_timeout_skipped.replace(true) {
                ps_emit!(PS202);
            }
            ps_debug!("slot {} created without its default timeout", handle.index);
            return;
        }
        if let Err(err) = self.register_timeout(handle, timeout) {
            ps_debug!("slot {} created without its default timeout: {}", handle.index, err);
        }
    }

    /// Cancel the cycle with `cause` once `signal` fires.
    ///
    /// A signal that has already fired cancels the cycle right away without
    /// needing a runtime. Otherwise a watcher task holding a weak reference
    /// to the slot is spawned and attached as the `kind` registration;
    /// `guard` is dropped alongside the watcher when that registration is
    /// disposed.
    ///
    /// Returns true if a watcher was attached to a pending cycle.
    pub(crate) fn watch(
        &self,
        handle: Handle<T>,
        signal: &CancellationToken,
        kind: RegistrationKind,
        cause: CancelCause,
        guard: Option<TimeoutController>,
    ) -> Result<bool, WatchError> {
        if !self.is_live(handle) || self.status(handle).is_terminal() {
            return Ok(false);
        }

        let slot = self.slot(handle);
        if signal.is_cancelled() {
            slot.try_complete(handle.version, Outcome::Canceled(cause));
            return Ok(false);
        }

        let runtime = match &guard {
            Some(controller) => controller.runtime().clone(),
            None => self.runtime()?,
        };

        let weak = Arc::downgrade(&slot);
        let version = handle.version;
        let signal = signal.clone();
        let watcher = runtime.spawn(async move {
            signal.cancelled().await;
            if let Some(slot) = weak.upgrade() {
                slot.try_complete(version, Outcome::Canceled(cause));
            }
        });

        let attached = slot.attach(
            version,
            kind,
            Registration::new(move || {
                watcher.abort();
                drop(guard);
            }),
        );
        if attached {
            ps_trace!("slot {} version {} watching {:?}", handle.index, version, kind);
        }
        Ok(attached)
    }

    /// Cancel the cycle with [`CancelCause::Timeout`] after `duration`.
    ///
    /// A zero duration cancels immediately and needs no runtime. Registering
    /// again replaces the previous timeout.
    ///
    /// Returns true if a timer is now watching the pending cycle.
    pub fn register_timeout(&self, handle: Handle<T>, duration: Duration) -> Result<bool, WatchError> {
        if duration.is_zero() {
            let elapsed = CancellationToken::new();
            elapsed.cancel();
            return self.watch(
                handle,
                &elapsed,
                RegistrationKind::Timeout,
                CancelCause::Timeout(duration),
                None,
            );
        }

        if !self.is_live(handle) {
            return Ok(false);
        }
        let mut controller = TimeoutController::new(self.runtime()?);
        controller.arm(duration);
        controller.compose_with(self, handle, None)
    }

    /// Cancel the cycle with [`CancelCause::External`] when `signal` fires.
    ///
    /// An already cancelled signal cancels immediately.
    ///
    /// Returns true if a watcher is now attached to the pending cycle.
    pub fn register_external(
        &self,
        handle: Handle<T>,
        signal: &CancellationToken,
    ) -> Result<bool, WatchError> {
        self.watch(handle, signal, RegistrationKind::External, CancelCause::External, None)
    }

    /// Await the cycle, racing a timeout and an optional external signal.
    ///
    /// The first of producer, timeout and external signal to finish the
    /// cycle wins; the others become no-ops and their watchers are torn down.
    pub fn wait_with_timeout(
        &self,
        handle: Handle<T>,
        duration: Duration,
        external: Option<&CancellationToken>,
    ) -> Result<Awaitable<'_, T>, WatchError> {
        self.register_timeout(handle, duration)?;
        if let Some(external) = external {
            self.register_external(handle, external)?;
        }
        Ok(self.awaitable(handle))
    }

    /// Start a cycle that is canceled after `duration` or when `external`
    /// fires.
    ///
    /// If the watchers cannot be attached the new cycle is disposed before
    /// the error is returned.
    pub fn create_with_timeout(
        &self,
        duration: Duration,
        external: Option<&CancellationToken>,
    ) -> Result<Handle<T>, WatchError> {
        let handle = self.create();
        let watched = self.register_timeout(handle, duration).and_then(|_| match external {
            Some(external) => self.register_external(handle, external),
            None => Ok(true),
        });

        match watched {
            Ok(_) => Ok(handle),
            Err(err) => {
                self.dispose(handle);
                Err(err)
            }
        }
    }
}
