use std::fmt;
use std::sync::Arc;

/// A non-fatal, in-band error attached to a carrier.
///
/// In-band errors are data, not control flow: a carrier that picked one up
/// keeps flowing through the pipeline until something (`Try`/`Catch`, a
/// route predicate, ...) inspects [`Carrier::error`](crate::Carrier::error)
/// and acts on it. Attaching a second error to a carrier that already has
/// one joins the two rather than replacing it — see
/// [`Carrier::with_error`](crate::Carrier::with_error).
#[derive(Clone)]
pub struct CarrierError(Vec<Arc<dyn std::error::Error + Send + Sync>>);

impl CarrierError {
    /// Wrap a single error as a fresh in-band error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(vec![Arc::new(err)])
    }

    /// Build an in-band error from a plain message, with no underlying cause.
    pub fn from_message(msg: impl Into<String>) -> Self {
        Self::new(MessageError(msg.into()))
    }

    /// Join two in-band errors, preserving the order they were attached in.
    pub fn join(mut self, other: CarrierError) -> Self {
        self.0.extend(other.0);
        self
    }

    /// The individual causes that make up this (possibly joined) error.
    pub fn causes(&self) -> &[Arc<dyn std::error::Error + Send + Sync>] {
        &self.0
    }
}

impl fmt::Debug for CarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|e| format!("{e:?}")).collect();
        write!(f, "{}", joined.join("; "))
    }
}

impl fmt::Display for CarrierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", joined.join("; "))
    }
}

impl std::error::Error for CarrierError {}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}
