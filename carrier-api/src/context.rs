use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::panic_store::PanicStore;

/// A lazy sequence of carriers produced by a cooperating worker.
///
/// Modeled as a bounded channel of capacity 1 — the closest analogue tokio's
/// `mpsc` has to an unbuffered, rendezvous-style channel (tokio requires a
/// capacity of at least one slot). A slow consumer still throttles the
/// whole pipeline one item at a time, giving the same backpressure a
/// rendezvous channel would.
pub type Stream<S> = tokio::sync::mpsc::Receiver<S>;
pub type StreamSender<S> = tokio::sync::mpsc::Sender<S>;

/// Capacity used for every stage-to-stage channel in this library.
pub const CHANNEL_CAPACITY: usize = 1;

/// Create a new stage-to-stage channel at the library's standard capacity.
pub fn new_channel<S>() -> (StreamSender<S>, Stream<S>) {
    tokio::sync::mpsc::channel(CHANNEL_CAPACITY)
}

/// A stream that is already closed — yields `None` immediately.
///
/// Substituted by adapters when a stage violates the "never return a null
/// stream" contract, so downstream consumers see a prompt, well-formed
/// end-of-stream instead of hanging.
pub fn closed_stream<S>() -> Stream<S> {
    let (_tx, rx) = tokio::sync::mpsc::channel(1);
    rx
}

/// Cancellation context threaded through every stage.
///
/// Cancelling an ancestor `Context` cancels every `Context` derived from it
/// via [`Context::child`]. A `Context` optionally carries a [`PanicStore`];
/// `Context::background()` starts with none, and [`with_panic_store`]
/// attaches a fresh one for a supervisor to inspect after draining.
#[derive(Clone)]
pub struct Context {
    token: CancellationToken,
    panic_store: Option<Arc<PanicStore>>,
}

impl Context {
    /// The root context: not cancelled, no panic store attached.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            panic_store: None,
        }
    }

    /// Derive a child context that inherits the panic store and is
    /// cancelled whenever `self` (or any of its ancestors) is cancelled.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            panic_store: self.panic_store.clone(),
        }
    }

    /// Derive a child context that cancels itself after `timeout`.
    ///
    /// `timeout <= Duration::ZERO` means no deadline — equivalent to
    /// [`Context::child`].
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let child = self.child();
        if timeout > Duration::ZERO {
            let token = child.token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                token.cancel();
            });
        }
        child
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// The panic store attached to this context, if any.
    pub fn panic_store(&self) -> Option<Arc<PanicStore>> {
        self.panic_store.clone()
    }

    /// The attached panic store, or a throwaway one if none is attached.
    ///
    /// Used internally by workers that must always have *somewhere* to
    /// record a recovered panic; a store created this way is never wired
    /// back into the context, so it stays invisible to supervisors.
    pub fn panic_store_or_ephemeral(&self) -> Arc<PanicStore> {
        self.panic_store
            .clone()
            .unwrap_or_else(|| Arc::new(PanicStore::new()))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

/// Derive a child context with a freshly attached [`PanicStore`].
pub fn with_panic_store(parent: &Context) -> (Context, Arc<PanicStore>) {
    let store = Arc::new(PanicStore::new());
    let ctx = Context {
        token: parent.token.child_token(),
        panic_store: Some(store.clone()),
    };
    (ctx, store)
}

/// Read the panic store attached to a context, if any.
pub fn panic_store_from_context(ctx: &Context) -> Option<Arc<PanicStore>> {
    ctx.panic_store()
}
