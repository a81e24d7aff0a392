use std::marker::PhantomData;

use carrier_api::{Carrier, Context, Stream};

use crate::stage::{Processor, Transcoder};
use crate::worker::spawn_worker;

/// A [`Processor`] that forwards every item unchanged.
pub struct IdentityProcessor<S: Carrier>(PhantomData<fn() -> S>);

impl<S: Carrier> Processor<S> for IdentityProcessor<S> {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S> {
        spawn_worker(ctx, input, |item| item)
    }
}

pub fn identity_processor<S: Carrier>() -> IdentityProcessor<S> {
    IdentityProcessor(PhantomData)
}

/// A [`Transcoder`] that forwards every item unchanged; only meaningful
/// where `S1 = S2`.
pub struct IdentityTranscoder<S: Carrier>(PhantomData<fn() -> S>);

impl<S: Carrier> Transcoder<S, S> for IdentityTranscoder<S> {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S> {
        spawn_worker(ctx, input, |item| item)
    }
}

pub fn identity_transcoder<S: Carrier>() -> IdentityTranscoder<S> {
    IdentityTranscoder(PhantomData)
}
