use carrier_api::{new_channel, panic_capture::catch_and_capture, Carrier, Context, Stream};

/// Cancels a derived context when dropped, so descendants spawned off it
/// release promptly no matter which path the worker takes out of its loop.
struct CancelOnDrop(Context);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Spawn the library's async mapping worker: consumes `input`, applies `f`
/// to each item, and forwards the mapped result to a freshly created output
/// stream that is returned to the caller.
///
/// - one output per input (1:1 mapping)
/// - output channel is unbuffered (capacity 1)
/// - every receive and every send observes `ctx`'s cancellation
/// - a panic inside `f` is recovered, recorded in `ctx`'s panic store
///   (attaching a throwaway one if none is present), and ends the worker —
///   it is never re-raised
pub fn spawn_worker<T1, T2, F>(ctx: &Context, mut input: Stream<T1>, f: F) -> Stream<T2>
where
    T1: Carrier,
    T2: Carrier,
    F: Fn(T1) -> T2 + Send + Sync + 'static,
{
    let worker_ctx = ctx.child();
    let (tx, rx) = new_channel::<T2>();
    let store = ctx.panic_store_or_ephemeral();

    tokio::spawn(async move {
        let _cancel_on_exit = CancelOnDrop(worker_ctx.clone());
        loop {
            let item = tokio::select! {
                biased;
                _ = worker_ctx.cancelled() => break,
                item = input.recv() => item,
            };
            let Some(item) = item else { break };

            match catch_and_capture(std::panic::AssertUnwindSafe(|| f(item))) {
                Ok(mapped) => {
                    let sent = tokio::select! {
                        biased;
                        _ = worker_ctx.cancelled() => false,
                        res = tx.send(mapped) => res.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                }
                Err((value, stack)) => {
                    tracing::error!(panic = %value, "mapping function panicked, closing output");
                    store.store(value, stack);
                    break;
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_api::carriers::StringCarrier;
    use carrier_api::{new_channel, with_panic_store};

    fn carrier(value: &str) -> StringCarrier {
        StringCarrier::new(value)
    }

    #[tokio::test]
    async fn maps_every_item_one_to_one() {
        let ctx = Context::background();
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = spawn_worker(&ctx, rx, |c: StringCarrier| {
            StringCarrier::new(c.value.to_uppercase()).with_index(c.index())
        });

        tokio::spawn(async move {
            for (i, v) in ["a", "b", "c"].into_iter().enumerate() {
                tx.send(carrier(v).with_index(i as u64)).await.unwrap();
            }
        });

        let mut seen = Vec::new();
        while let Some(v) = out.recv().await {
            seen.push(v.value);
        }
        assert_eq!(seen, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn panic_closes_output_and_records_first_fault() {
        let (ctx, store) = with_panic_store(&Context::background());
        let (tx, rx) = new_channel::<StringCarrier>();
        let mut out = spawn_worker(&ctx, rx, |c: StringCarrier| {
            if c.value == "boom" {
                panic!("boom");
            }
            c
        });

        tokio::spawn(async move {
            let _ = tx.send(carrier("ok")).await;
            let _ = tx.send(carrier("boom")).await;
            let _ = tx.send(carrier("unreached")).await;
        });

        let mut seen = Vec::new();
        while let Some(v) = out.recv().await {
            seen.push(v.value);
        }
        assert_eq!(seen, vec!["ok"]);
        let snapshot = store.load().expect("panic recorded");
        assert_eq!(snapshot.value, "boom");
    }

    #[tokio::test]
    async fn cancellation_closes_output_promptly() {
        let ctx = Context::background();
        let (_tx, rx) = new_channel::<StringCarrier>();
        let mut out = spawn_worker(&ctx, rx, |c: StringCarrier| c);
        ctx.cancel();
        assert_eq!(out.recv().await.map(|c| c.value), None);
    }
}
