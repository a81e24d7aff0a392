use carrier_api::{closed_stream, Carrier, Context, Stream};

/// A stage that maps one lazy sequence of `S` onto another of the same type.
///
/// `apply` is expected to return almost immediately — any real work happens
/// in workers it spawns, not inline.
pub trait Processor<S: Carrier>: Send + Sync {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S>;
}

/// A stage that maps a lazy sequence of `S1` onto one of `S2`.
pub trait Transcoder<S1: Carrier, S2: Carrier>: Send + Sync {
    fn apply(&self, ctx: &Context, input: Stream<S1>) -> Stream<S2>;
}

/// Call a processor's `apply`, guarding against both a wiring panic and a
/// violation of the "never return a null stream" contract.
///
/// Either failure is recorded into `ctx`'s panic store (attaching an
/// ephemeral one if `ctx` doesn't carry one) and a closed stream is handed
/// back so callers see a prompt end-of-stream instead of hanging.
pub fn safe_apply<S, P>(ctx: &Context, stage: &P, input: Stream<S>) -> Stream<S>
where
    S: Carrier,
    P: Processor<S> + ?Sized,
{
    let store = ctx.panic_store_or_ephemeral();
    match carrier_api::panic_capture::catch_and_capture(std::panic::AssertUnwindSafe(|| {
        stage.apply(ctx, input)
    })) {
        Ok(stream) => stream,
        Err((value, stack)) => {
            tracing::error!(panic = %value, "stage wiring panicked, substituting closed stream");
            store.store(value, stack);
            closed_stream()
        }
    }
}

/// Same guard as [`safe_apply`], for a [`Transcoder`].
pub fn safe_apply_transcoder<S1, S2, T>(ctx: &Context, stage: &T, input: Stream<S1>) -> Stream<S2>
where
    S1: Carrier,
    S2: Carrier,
    T: Transcoder<S1, S2> + ?Sized,
{
    let store = ctx.panic_store_or_ephemeral();
    match carrier_api::panic_capture::catch_and_capture(std::panic::AssertUnwindSafe(|| {
        stage.apply(ctx, input)
    })) {
        Ok(stream) => stream,
        Err((value, stack)) => {
            tracing::error!(panic = %value, "stage wiring panicked, substituting closed stream");
            store.store(value, stack);
            closed_stream()
        }
    }
}
