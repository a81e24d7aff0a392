use std::sync::Arc;

use crate::context::Context;

/// `Predicate<S> = (ctx, item) -> bool`, used by `Router` and `If`.
///
/// A `None` predicate in a route or branch means "always matches" — callers
/// build that behavior by simply omitting the predicate, rather than by
/// passing a trivial `|_, _| true` closure.
pub type Predicate<S> = Arc<dyn Fn(&Context, &S) -> bool + Send + Sync>;

/// Build a [`Predicate`] from a plain closure over the carrier alone.
pub fn predicate<S, F>(f: F) -> Predicate<S>
where
    F: Fn(&S) -> bool + Send + Sync + 'static,
{
    Arc::new(move |_ctx, item| f(item))
}

/// A predicate matching carriers that currently carry an in-band error.
pub fn has_error<S: crate::Carrier>() -> Predicate<S> {
    predicate(|item: &S| item.has_error())
}
