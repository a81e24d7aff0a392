use std::sync::Arc;

use carrier_api::{has_error, Carrier, Context, Stream};

use crate::chain::Chain;
use crate::conditional::Conditional;
use crate::stage::Processor;

/// Turns a carrier's in-band error into control flow.
///
/// Built entirely out of [`Conditional`] and [`Chain`] — no new concurrency
/// primitive is introduced. Each `Try` processor is wrapped so it only runs
/// on items that are still error-free (an item that picks up an error
/// partway through skips every remaining `Try` stage); `Catch` then only
/// runs on items that do carry an error; `Finally` runs on everything,
/// unconditionally, last.
pub struct TryCatchFinally<S: Carrier> {
    chain: Chain<S>,
}

impl<S: Carrier> TryCatchFinally<S> {
    fn new(
        try_processors: Vec<Arc<dyn Processor<S>>>,
        catch_processors: Vec<Arc<dyn Processor<S>>>,
        finally_processors: Vec<Arc<dyn Processor<S>>>,
    ) -> Self {
        let guarded_try = try_processors
            .into_iter()
            .map(|p| {
                let guarded: Arc<dyn Processor<S>> =
                    Arc::new(Conditional::if_then(Some(has_error::<S>()), None).else_branch(Some(p)));
                Some(guarded)
            })
            .collect();
        let mut stages: Vec<Option<Arc<dyn Processor<S>>>> =
            vec![Some(Arc::new(Chain::from_stages(guarded_try)) as Arc<dyn Processor<S>>)];

        if !catch_processors.is_empty() {
            let catch_chain: Arc<dyn Processor<S>> =
                Arc::new(Chain::from_stages(catch_processors.into_iter().map(Some).collect()));
            let guarded_catch =
                Conditional::if_then(Some(has_error::<S>()), Some(catch_chain)).else_branch(None);
            stages.push(Some(Arc::new(guarded_catch)));
        }

        if !finally_processors.is_empty() {
            let finally_chain = Chain::from_stages(finally_processors.into_iter().map(Some).collect());
            stages.push(Some(Arc::new(finally_chain)));
        }

        Self {
            chain: Chain::from_stages(stages),
        }
    }
}

impl<S: Carrier> Processor<S> for TryCatchFinally<S> {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S> {
        self.chain.apply(ctx, input)
    }
}

/// Start a `try(procs...).catch(procs...).finally(procs...)` assembly.
pub fn try_block<S: Carrier>(processors: Vec<Arc<dyn Processor<S>>>) -> TryBuilder<S> {
    TryBuilder {
        try_processors: processors,
    }
}

pub struct TryBuilder<S: Carrier> {
    try_processors: Vec<Arc<dyn Processor<S>>>,
}

impl<S: Carrier> TryBuilder<S> {
    pub fn catch(self, processors: Vec<Arc<dyn Processor<S>>>) -> CatchBuilder<S> {
        CatchBuilder {
            try_processors: self.try_processors,
            catch_processors: processors,
        }
    }

    pub fn finally(self, processors: Vec<Arc<dyn Processor<S>>>) -> TryCatchFinally<S> {
        TryCatchFinally::new(self.try_processors, Vec::new(), processors)
    }

    pub fn build(self) -> TryCatchFinally<S> {
        TryCatchFinally::new(self.try_processors, Vec::new(), Vec::new())
    }
}

pub struct CatchBuilder<S: Carrier> {
    try_processors: Vec<Arc<dyn Processor<S>>>,
    catch_processors: Vec<Arc<dyn Processor<S>>>,
}

impl<S: Carrier> CatchBuilder<S> {
    pub fn finally(self, processors: Vec<Arc<dyn Processor<S>>>) -> TryCatchFinally<S> {
        TryCatchFinally::new(self.try_processors, self.catch_processors, processors)
    }

    pub fn build(self) -> TryCatchFinally<S> {
        TryCatchFinally::new(self.try_processors, self.catch_processors, Vec::new())
    }
}
