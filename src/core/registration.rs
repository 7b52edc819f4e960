//! Cancelable subscriptions attached to a slot.

/// A teardown action for a timeout or external-cancellation watcher.
///
/// Disposal runs the teardown at most once; later calls are no-ops, so both
/// the firing watcher and the consume path can dispose without coordination.
#[derive(Default)]
pub(crate) struct Registration {
    teardown: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Registration {
    pub(crate) fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.teardown.is_some()
    }

    /// Run the teardown if it has not run yet. Returns true if it ran.
    pub(crate) fn dispose(&mut self) -> bool {
        match self.teardown.take() {
            Some(teardown) => {
                teardown();
                true
            }
            None => false,
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("armed", &self.is_armed())
            .finish()
    }
}

/// Which of the two cancel sources a registration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistrationKind {
    Timeout,
    External,
}
