use crate::error::CarrierError;

/// A value-typed handle for one logical token flowing through the pipeline.
///
/// Carriers are cheap, copy-by-value data: every operation takes `self` by
/// value and returns a new instance, so nothing in this trait ever mutates
/// an existing carrier in place. The zero value of every concrete carrier
/// (its [`Default`]) must be a valid *prototype* — `S::default().from_utf8(t)
/// .with_index(i)` always yields a well-formed token, independent of any
/// prior receiver state, because `from_utf8` is an associated function, not
/// a method that could read `self`.
pub trait Carrier: Clone + Send + Sync + 'static {
    /// A UTF-8 rendering of the carrier's current state.
    fn utf8(&self) -> String;

    /// Construct a fresh instance from UTF-8 (or best-effort UTF-8) bytes.
    fn from_utf8(bytes: &[u8]) -> Self
    where
        Self: Sized;

    /// The carrier's ordering hint (token sequence number).
    fn index(&self) -> u64;

    /// Return a copy of this carrier with a new ordering hint.
    fn with_index(self, index: u64) -> Self
    where
        Self: Sized;

    /// The in-band error attached to this carrier, if any.
    fn error(&self) -> Option<&CarrierError>;

    /// Replace this carrier's in-band error wholesale.
    ///
    /// Concrete carriers implement only this; [`Carrier::with_error`] builds
    /// the "join, don't replace" semantics described in the trait docs on
    /// top of it.
    fn set_error(self, error: Option<CarrierError>) -> Self
    where
        Self: Sized;

    /// Deterministic merge of many carriers into one.
    ///
    /// Implementations first stably sort `items` by `(index, utf8())` —
    /// see [`stable_sort_by_index_then_utf8`] — then combine them according
    /// to the concrete carrier's own merge rule (concatenation, JSON array,
    /// newline-joined record list, ...). `aggregate` on a single-element
    /// input is idempotent, and the induced order is commutative: the
    /// result does not depend on the order carriers were passed in, only on
    /// their `(index, utf8())` keys.
    fn aggregate(items: Vec<Self>) -> Self
    where
        Self: Sized;

    /// Attach an in-band error, joining it with any error already present.
    fn with_error(self, error: CarrierError) -> Self
    where
        Self: Sized,
    {
        let merged = match self.error() {
            Some(existing) => existing.clone().join(error),
            None => error,
        };
        self.set_error(Some(merged))
    }

    /// Drop this carrier's in-band error, if any.
    fn clear_error(self) -> Self
    where
        Self: Sized,
    {
        self.set_error(None)
    }

    /// Whether this carrier currently carries an in-band error.
    fn has_error(&self) -> bool {
        self.error().is_some()
    }
}

/// Stably sort carriers by `(index, utf8())`, the tie-break order
/// `aggregate` implementations are required to use for determinism.
pub fn stable_sort_by_index_then_utf8<T: Carrier>(items: &mut [T]) {
    items.sort_by(|a, b| a.index().cmp(&b.index()).then_with(|| a.utf8().cmp(&b.utf8())));
}
