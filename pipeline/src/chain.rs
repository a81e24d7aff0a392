use std::sync::Arc;

use carrier_api::{Carrier, Context, Stream};

use crate::stage::{safe_apply, Processor};

/// An ordered list of [`Processor`]s, run one after another.
///
/// `null` entries (`None`) are skipped; an empty chain is a pass-through.
/// Each stage is invoked through [`safe_apply`] so a panic while one stage
/// wires itself up doesn't take the rest of the chain down with it.
pub struct Chain<S: Carrier> {
    stages: Vec<Option<Arc<dyn Processor<S>>>>,
}

impl<S: Carrier> Chain<S> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Build a chain from a fixed list of (possibly null) stages.
    pub fn from_stages(stages: Vec<Option<Arc<dyn Processor<S>>>>) -> Self {
        Self { stages }
    }

    pub fn push(mut self, stage: Arc<dyn Processor<S>>) -> Self {
        self.stages.push(Some(stage));
        self
    }

    pub fn push_optional(mut self, stage: Option<Arc<dyn Processor<S>>>) -> Self {
        self.stages.push(stage);
        self
    }
}

impl<S: Carrier> Default for Chain<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Carrier> Processor<S> for Chain<S> {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S> {
        self.stages
            .iter()
            .flatten()
            .fold(input, |stream, stage| safe_apply(ctx, stage.as_ref(), stream))
    }
}

/// Build a chain from a fixed sequence of stages, as a free function
/// mirroring the library's `new_chain(procs...)` constructor.
pub fn new_chain<S: Carrier>(stages: Vec<Option<Arc<dyn Processor<S>>>>) -> Chain<S> {
    Chain::from_stages(stages)
}

/// `T: S1→S2` followed by `P: S2→S2`, both optional. A null `t` degrades to
/// just `p`'s type requiring `S1 = S2`... so instead each side degrades
/// independently: a null `p` yields `t` unchanged, a null `t` requires the
/// caller not call this combinator (there is no `S1→S2` stage to produce
/// without it). See [`stick_right`] for the symmetric case.
pub fn stick_left<S1, S2, T, P>(t: Arc<T>, p: Option<Arc<P>>) -> Glue<S1, S2>
where
    S1: Carrier,
    S2: Carrier,
    T: crate::stage::Transcoder<S1, S2> + 'static,
    P: Processor<S2> + 'static,
{
    Glue {
        transcoder: t,
        processor: p,
    }
}

/// `P: S1→S1` followed by `T: S1→S2`. A null `p` degrades to `t` alone.
pub fn stick_right<S1, S2, P, T>(p: Option<Arc<P>>, t: Arc<T>) -> RightGlue<S1, S2>
where
    S1: Carrier,
    S2: Carrier,
    P: Processor<S1> + 'static,
    T: crate::stage::Transcoder<S1, S2> + 'static,
{
    RightGlue {
        processor: p,
        transcoder: t,
    }
}

/// A [`Transcoder`] glued to a trailing [`Processor`] over its output type.
pub struct Glue<S1: Carrier, S2: Carrier> {
    transcoder: Arc<dyn crate::stage::Transcoder<S1, S2>>,
    processor: Option<Arc<dyn Processor<S2>>>,
}

impl<S1: Carrier, S2: Carrier> crate::stage::Transcoder<S1, S2> for Glue<S1, S2> {
    fn apply(&self, ctx: &Context, input: Stream<S1>) -> Stream<S2> {
        let mid = crate::stage::safe_apply_transcoder(ctx, self.transcoder.as_ref(), input);
        match &self.processor {
            Some(p) => safe_apply(ctx, p.as_ref(), mid),
            None => mid,
        }
    }
}

/// A leading [`Processor`] glued to a trailing [`Transcoder`].
pub struct RightGlue<S1: Carrier, S2: Carrier> {
    processor: Option<Arc<dyn Processor<S1>>>,
    transcoder: Arc<dyn crate::stage::Transcoder<S1, S2>>,
}

impl<S1: Carrier, S2: Carrier> crate::stage::Transcoder<S1, S2> for RightGlue<S1, S2> {
    fn apply(&self, ctx: &Context, input: Stream<S1>) -> Stream<S2> {
        let mid = match &self.processor {
            Some(p) => safe_apply(ctx, p.as_ref(), input),
            None => input,
        };
        crate::stage::safe_apply_transcoder(ctx, self.transcoder.as_ref(), mid)
    }
}
