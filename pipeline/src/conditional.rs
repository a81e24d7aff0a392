use std::sync::Arc;

use carrier_api::{Carrier, Context, Predicate, Stream};

use crate::identity::identity_processor;
use crate::router::{Router, Strategy};
use crate::stage::Processor;

/// `If(pred).Then(p).ElseIf(pred2, p2).Else(fallback)`, built on top of a
/// [`Router`] in [`Strategy::FirstMatch`] mode: branches are routes, and
/// routing's "first eligible wins, pass-through on no match" behavior is
/// exactly If/ElseIf/Else semantics. A `None` branch processor still
/// consumes the match (stopping the ElseIf chain) but passes the item
/// through unchanged.
pub struct Conditional<S: Carrier> {
    router: Router<S>,
}

impl<S: Carrier> Conditional<S> {
    /// Start a conditional with its first, possibly-unconditional, branch.
    pub fn if_then(predicate: Option<Predicate<S>>, then: Option<Arc<dyn Processor<S>>>) -> Self {
        let branch = then.unwrap_or_else(|| Arc::new(identity_processor::<S>()));
        Self {
            router: Router::new(Strategy::FirstMatch).add_route(predicate, Some(branch)),
        }
    }

    pub fn else_if(mut self, predicate: Option<Predicate<S>>, processor: Option<Arc<dyn Processor<S>>>) -> Self {
        let branch = processor.unwrap_or_else(|| Arc::new(identity_processor::<S>()));
        self.router = self.router.add_route(predicate, Some(branch));
        self
    }

    /// Append an always-eligible fallback branch; a missing `Else` means an
    /// unmatched item simply passes through the router unchanged.
    pub fn else_branch(mut self, processor: Option<Arc<dyn Processor<S>>>) -> Self {
        let branch = processor.unwrap_or_else(|| Arc::new(identity_processor::<S>()));
        self.router = self.router.add_route(None, Some(branch));
        self
    }
}

impl<S: Carrier> Processor<S> for Conditional<S> {
    fn apply(&self, ctx: &Context, input: Stream<S>) -> Stream<S> {
        self.router.apply(ctx, input)
    }
}

/// Entry point mirroring the library's `new_if(pred).then(p)` constructor.
pub fn new_if<S: Carrier>(predicate: Option<Predicate<S>>) -> IfBuilder<S> {
    IfBuilder { predicate }
}

pub struct IfBuilder<S: Carrier> {
    predicate: Option<Predicate<S>>,
}

impl<S: Carrier> IfBuilder<S> {
    pub fn then(self, processor: Option<Arc<dyn Processor<S>>>) -> Conditional<S> {
        Conditional::if_then(self.predicate, processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_api::carriers::StringCarrier;
    use carrier_api::new_channel;
    use carrier_api::predicate;

    struct Tag(&'static str);

    impl Processor<StringCarrier> for Tag {
        fn apply(&self, ctx: &Context, input: Stream<StringCarrier>) -> Stream<StringCarrier> {
            let tag = self.0;
            crate::worker::spawn_worker(ctx, input, move |c: StringCarrier| {
                StringCarrier::new(format!("{}:{}", tag, c.value)).with_index(c.index())
            })
        }
    }

    #[tokio::test]
    async fn routes_through_then_or_else_by_predicate() {
        let ctx = Context::background();
        let cond = new_if::<StringCarrier>(Some(predicate(|c: &StringCarrier| c.value == "yes")))
            .then(Some(Arc::new(Tag("then"))))
            .else_branch(Some(Arc::new(Tag("else"))));

        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = cond.apply(&ctx, rx);
        tx.send(StringCarrier::new("yes")).await.unwrap();
        tx.send(StringCarrier::new("no")).await.unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(item) = out.recv().await {
            seen.push(item.value);
        }
        seen.sort();
        assert_eq!(seen, vec!["else:no", "then:yes"]);
    }

    #[tokio::test]
    async fn no_else_is_a_pass_through_for_unmatched_items() {
        let ctx = Context::background();
        let cond = new_if::<StringCarrier>(Some(predicate(|c: &StringCarrier| c.value == "yes")))
            .then(Some(Arc::new(Tag("then"))));

        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = cond.apply(&ctx, rx);
        tx.send(StringCarrier::new("no")).await.unwrap();
        drop(tx);
        assert_eq!(out.recv().await.unwrap().value, "no");
    }

    #[tokio::test]
    async fn null_then_branch_passes_the_match_through() {
        let ctx = Context::background();
        let cond = new_if::<StringCarrier>(Some(predicate(|c: &StringCarrier| c.value == "yes"))).then(None);

        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = cond.apply(&ctx, rx);
        tx.send(StringCarrier::new("yes")).await.unwrap();
        drop(tx);
        assert_eq!(out.recv().await.unwrap().value, "yes");
    }
}
