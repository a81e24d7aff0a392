use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use carrier_api::{new_channel, Carrier, Context, Predicate, Stream, StreamSender};

use crate::stage::{safe_apply, Processor};

/// Dispatch strategy used by [`Router`] to pick eligible routes for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    FirstMatch,
    Broadcast,
    RoundRobin,
    Random,
}

struct RouterState {
    round_robin: u64,
    rng: StdRng,
}

type Route<S> = (Option<Predicate<S>>, Arc<dyn Processor<S>>);

/// Fan-out/fan-in stage: routes each item to zero, one, or many configured
/// routes depending on [`Strategy`], then merges every route's output back
/// into a single stream.
///
/// Items matching no route are forwarded unchanged (pass-through). With no
/// routes configured at all, the whole router is a pass-through stage.
/// Registration (`add_route`/`add_processor`/`set_strategy`) is not
/// concurrency-safe — configure a router fully before calling `apply`.
pub struct Router<S: Carrier> {
    routes: Vec<Route<S>>,
    strategy: Strategy,
    state: Arc<Mutex<RouterState>>,
}

impl<S: Carrier> Router<S> {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            routes: Vec::new(),
            strategy,
            state: Arc::new(Mutex::new(RouterState {
                round_robin: 0,
                rng: StdRng::from_entropy(),
            })),
        }
    }

    /// Register a route. A `None` processor is ignored — no route is added.
    pub fn add_route(mut self, predicate: Option<Predicate<S>>, processor: Option<Arc<dyn Processor<S>>>) -> Self {
        if let Some(processor) = processor {
            self.routes.push((predicate, processor));
        }
        self
    }

    /// Register an always-eligible route.
    pub fn add_processor(self, processor: Arc<dyn Processor<S>>) -> Self {
        self.add_route(None, Some(processor))
    }

    pub fn set_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn select_indices(&self, eligible: &[usize]) -> Vec<usize> {
        match self.strategy {
            Strategy::FirstMatch => vec![eligible[0]],
            Strategy::Broadcast => eligible.to_vec(),
            Strategy::RoundRobin => {
                let mut state = self.state.lock().expect("router state poisoned");
                let idx = (state.round_robin as usize) % eligible.len();
                state.round_robin = state.round_robin.wrapping_add(1);
                vec![eligible[idx]]
            }
            Strategy::Random => {
                let mut state = self.state.lock().expect("router state poisoned");
                let idx = state.rng.gen_range(0..eligible.len());
                vec![eligible[idx]]
            }
        }
    }
}

/// Build a router with a fixed set of always-eligible processors, mirroring
/// the library's `new_router(strategy, procs...)` constructor.
pub fn new_router<S: Carrier>(strategy: Strategy, processors: Vec<Arc<dyn Processor<S>>>) -> Router<S> {
    processors
        .into_iter()
        .fold(Router::new(strategy), |router, p| router.add_processor(p))
}

async fn guarded_send<S: Carrier>(ctx: &Context, tx: &StreamSender<S>, item: S) -> bool {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => false,
        res = tx.send(item) => res.is_ok(),
    }
}

impl<S: Carrier> Processor<S> for Router<S> {
    fn apply(&self, ctx: &Context, mut input: Stream<S>) -> Stream<S> {
        if self.routes.is_empty() {
            return crate::worker::spawn_worker(ctx, input, |item| item);
        }

        let worker_ctx = ctx.child();
        let (merged_tx, merged_rx) = new_channel::<S>();

        let mut predicates = Vec::with_capacity(self.routes.len());
        let mut route_txs = Vec::with_capacity(self.routes.len());
        let mut forwarders = Vec::with_capacity(self.routes.len());

        for (predicate, processor) in &self.routes {
            let (route_tx, route_rx) = new_channel::<S>();
            let mut route_out = safe_apply(ctx, processor.as_ref(), route_rx);
            let route_ctx = worker_ctx.clone();
            let merged_tx_for_route = merged_tx.clone();
            forwarders.push(tokio::spawn(async move {
                loop {
                    let item = tokio::select! {
                        biased;
                        _ = route_ctx.cancelled() => {
                            while route_out.recv().await.is_some() {}
                            break;
                        }
                        item = route_out.recv() => item,
                    };
                    let Some(item) = item else { break };
                    if !guarded_send(&route_ctx, &merged_tx_for_route, item).await {
                        while route_out.recv().await.is_some() {}
                        break;
                    }
                }
            }));
            predicates.push(predicate.clone());
            route_txs.push(route_tx);
        }

        let strategy_state = self.state.clone();
        let strategy = self.strategy;
        let router_for_select = Router {
            routes: Vec::new(),
            strategy,
            state: strategy_state,
        };
        let fanout_ctx = worker_ctx.clone();
        let fanout_merged_tx = merged_tx.clone();

        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    biased;
                    _ = fanout_ctx.cancelled() => break,
                    item = input.recv() => item,
                };
                let Some(item) = item else { break };

                let eligible: Vec<usize> = predicates
                    .iter()
                    .enumerate()
                    .filter(|(_, pred)| pred.as_ref().map(|p| p(&fanout_ctx, &item)).unwrap_or(true))
                    .map(|(i, _)| i)
                    .collect();

                if eligible.is_empty() {
                    if !guarded_send(&fanout_ctx, &fanout_merged_tx, item).await {
                        break;
                    }
                    continue;
                }

                for idx in router_for_select.select_indices(&eligible) {
                    if !guarded_send(&fanout_ctx, &route_txs[idx], item.clone()).await {
                        break;
                    }
                }
            }

            drop(route_txs);
            drop(fanout_merged_tx);
            for forwarder in forwarders {
                let _ = forwarder.await;
            }
            drop(merged_tx);
        });

        merged_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_api::carriers::StringCarrier;
    use carrier_api::predicate;
    use std::collections::HashMap;

    struct Suffix(&'static str);

    impl Processor<StringCarrier> for Suffix {
        fn apply(&self, ctx: &Context, input: Stream<StringCarrier>) -> Stream<StringCarrier> {
            let suffix = self.0;
            crate::worker::spawn_worker(ctx, input, move |c: StringCarrier| {
                StringCarrier::new(format!("{}{}", c.value, suffix)).with_index(c.index())
            })
        }
    }

    #[tokio::test]
    async fn no_routes_is_a_pass_through() {
        let ctx = Context::background();
        let router: Router<StringCarrier> = Router::new(Strategy::FirstMatch);
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        tx.send(StringCarrier::new("same")).await.unwrap();
        drop(tx);
        assert_eq!(out.recv().await.unwrap().value, "same");
    }

    #[tokio::test]
    async fn first_match_dispatches_to_one_route_only() {
        let ctx = Context::background();
        let router = new_router(
            Strategy::FirstMatch,
            vec![
                Arc::new(Suffix("|p1")) as Arc<dyn Processor<StringCarrier>>,
                Arc::new(Suffix("|p2")) as Arc<dyn Processor<StringCarrier>>,
            ],
        );
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        tx.send(StringCarrier::new("x")).await.unwrap();
        drop(tx);
        let item = out.recv().await.unwrap();
        assert_eq!(item.value, "x|p1");
        assert!(out.recv().await.is_none());
    }

    #[tokio::test]
    async fn broadcast_sends_a_copy_to_every_eligible_route() {
        let ctx = Context::background();
        let router = new_router(
            Strategy::Broadcast,
            vec![
                Arc::new(Suffix("|a")) as Arc<dyn Processor<StringCarrier>>,
                Arc::new(Suffix("|b")) as Arc<dyn Processor<StringCarrier>>,
            ],
        );
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        tx.send(StringCarrier::new("x")).await.unwrap();
        drop(tx);
        let mut seen = Vec::new();
        while let Some(item) = out.recv().await {
            seen.push(item.value);
        }
        seen.sort();
        assert_eq!(seen, vec!["x|a", "x|b"]);
    }

    #[tokio::test]
    async fn round_robin_distributes_evenly_starting_at_route_zero() {
        let ctx = Context::background();
        let router = new_router(
            Strategy::RoundRobin,
            vec![
                Arc::new(Suffix("|p1")) as Arc<dyn Processor<StringCarrier>>,
                Arc::new(Suffix("|p2")) as Arc<dyn Processor<StringCarrier>>,
            ],
        );
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        for i in 0..4u64 {
            tx.send(StringCarrier::new(format!("i{i}")).with_index(i))
                .await
                .unwrap();
        }
        drop(tx);

        let mut items = Vec::new();
        while let Some(item) = out.recv().await {
            items.push(item);
        }
        items.sort_by_key(|c| c.index());
        let values: Vec<String> = items.into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["i0|p1", "i1|p2", "i2|p1", "i3|p2"]);
    }

    #[tokio::test]
    async fn unmatched_items_pass_through_unchanged() {
        let ctx = Context::background();
        let router = Router::new(Strategy::FirstMatch).add_route(
            Some(predicate(|c: &StringCarrier| c.value == "special")),
            Some(Arc::new(Suffix("|matched"))),
        );
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        tx.send(StringCarrier::new("ordinary")).await.unwrap();
        drop(tx);
        assert_eq!(out.recv().await.unwrap().value, "ordinary");
    }

    #[tokio::test]
    async fn random_preserves_the_input_multiset() {
        let ctx = Context::background();
        let router = new_router(
            Strategy::Random,
            vec![
                Arc::new(Suffix("")) as Arc<dyn Processor<StringCarrier>>,
                Arc::new(Suffix("")) as Arc<dyn Processor<StringCarrier>>,
                Arc::new(Suffix("")) as Arc<dyn Processor<StringCarrier>>,
            ],
        );
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = router.apply(&ctx, rx);
        for i in 0..30u64 {
            tx.send(StringCarrier::new(format!("v{i}")).with_index(i))
                .await
                .unwrap();
        }
        drop(tx);

        let mut counts: HashMap<String, usize> = HashMap::new();
        while let Some(item) = out.recv().await {
            *counts.entry(item.value).or_default() += 1;
        }
        assert_eq!(counts.len(), 30);
        assert!(counts.values().all(|&c| c == 1));
    }
}
