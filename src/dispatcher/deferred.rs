use std::panic::{catch_unwind, AssertUnwindSafe};

use may::sync::mpsc;
use tracing::{debug, error};

use super::failure::panic_message;
use super::Outcome;
use crate::error::KernelError;
use crate::runtime_config::DEFAULT_STACK_SIZE;

/// Result a deferred value settles with
pub type Settlement = anyhow::Result<Outcome>;

/// An action result that settles later.
///
/// Settles at most once, either through its [`Settler`] or through the
/// computation passed to [`Deferred::spawn`]. The kernel waits for the
/// settlement; it has no timeout of its own.
pub struct Deferred {
    rx: mpsc::Receiver<Settlement>,
}

/// Settles the [`Deferred`] it was created with.
///
/// `resolve` and `reject` consume the settler, so a deferred value can only
/// settle once. Dropping an unsettled settler fails the deferred value.
pub struct Settler {
    tx: mpsc::Sender<Settlement>,
}

impl Deferred {
    /// A pending deferred value and the settler that completes it
    #[must_use]
    pub fn channel() -> (Settler, Deferred) {
        let (tx, rx) = mpsc::channel();
        (Settler { tx }, Deferred { rx })
    }

    /// A deferred value that is already settled with `outcome`
    #[must_use]
    pub fn resolved(outcome: impl Into<Outcome>) -> Self {
        let (settler, deferred) = Self::channel();
        settler.resolve(outcome);
        deferred
    }

    /// A deferred value that is already failed with `err`
    #[must_use]
    pub fn rejected(err: impl Into<anyhow::Error>) -> Self {
        let (settler, deferred) = Self::channel();
        settler.reject(err);
        deferred
    }

    /// Run `f` on a `may` coroutine with the default 64 KB stack.
    ///
    /// A panic inside `f` rejects the deferred value. Use
    /// [`Deferred::spawn_with_stack`] with [`Env::stack_size`](crate::Env)
    /// to honor the kernel's `KERNEL_STACK_SIZE`.
    #[must_use]
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> Settlement + Send + 'static,
    {
        Self::spawn_with_stack(DEFAULT_STACK_SIZE, f)
    }

    /// Run `f` on a `may` coroutine with an explicit stack size.
    #[must_use]
    pub fn spawn_with_stack<F>(stack_size: usize, f: F) -> Self
    where
        F: FnOnce() -> Settlement + Send + 'static,
    {
        let (settler, deferred) = Self::channel();

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure is Send + 'static and reports every outcome, panics included,
        // through the settler, so nothing escapes the coroutine.
        #[allow(unsafe_code)]
        let spawned = unsafe {
            may::coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    let settlement = catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| {
                        Err(KernelError::Panicked(panic_message(panic.as_ref())).into())
                    });
                    settler.settle(settlement);
                })
        };

        // On failure the closure, and the settler with it, is dropped, which
        // fails the deferred value when it is waited on.
        if let Err(e) = spawned {
            error!(
                error = %e,
                stack_size = stack_size,
                "Failed to spawn deferred coroutine"
            );
        }

        deferred
    }

    /// Block until the value settles.
    pub(crate) fn wait(self) -> Settlement {
        match self.rx.recv() {
            Ok(settlement) => settlement,
            Err(_) => Err(KernelError::DeferredDropped.into()),
        }
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Deferred")
    }
}

impl Settler {
    pub fn resolve(self, outcome: impl Into<Outcome>) {
        self.settle(Ok(outcome.into()));
    }

    pub fn reject(self, err: impl Into<anyhow::Error>) {
        self.settle(Err(err.into()));
    }

    pub fn settle(self, settlement: Settlement) {
        if self.tx.send(settlement).is_err() {
            debug!("Deferred value settled after its receiver was dropped");
        }
    }
}
