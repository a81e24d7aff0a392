use std::sync::OnceLock;

/// A snapshot of the first fatal fault recorded in a [`PanicStore`].
///
/// `load` hands back an owned copy, never a reference into the store, so the
/// stack trace survives independently of the store it came from.
#[derive(Debug, Clone)]
pub struct PanicSnapshot {
    pub value: String,
    pub stack: String,
}

/// Write-once holder for the first recovered fatal fault in a pipeline run.
///
/// Every worker and every stage-construction guard shares one `PanicStore`
/// through the [`Context`](crate::Context) it was spawned with. The first
/// `store` call wins; every call after that is silently ignored, matching
/// the "first panic only" policy in the library's error-handling design —
/// a pipeline only needs to know *that* it faulted and *where*, not how many
/// times downstream workers re-tripped the same fault while draining.
#[derive(Debug, Default)]
pub struct PanicStore(OnceLock<PanicSnapshot>);

impl PanicStore {
    pub fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Record a fault if none has been recorded yet. Ignored otherwise.
    pub fn store(&self, value: impl Into<String>, stack: impl Into<String>) {
        let _ = self.0.set(PanicSnapshot {
            value: value.into(),
            stack: stack.into(),
        });
    }

    /// Read the first recorded fault, if any.
    pub fn load(&self) -> Option<PanicSnapshot> {
        self.0.get().cloned()
    }
}
