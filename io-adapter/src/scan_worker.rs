use std::io::Read;
use std::sync::Arc;

use carrier_api::panic_capture::catch_and_capture;
use carrier_api::{Carrier, Context, PanicStore, StreamSender};
use tokenize::{Scanner, SplitFn};

/// Drive `scanner` to completion, turning each token into a carrier via
/// `S::from_utf8(token).with_index(counter)` and sending it on `tx`.
///
/// Mirrors the I/O adapter's startup worker loop: observe cancellation,
/// attempt one scan step, convert and send under cancellation, and stop on
/// the first failure of any of those. `Read::read` itself can't be
/// interrupted mid-syscall, so each scan step runs on a blocking-pool thread
/// and the loop only re-checks cancellation between steps — the same
/// granularity the worker contract asks other stages to honor.
///
/// A panic raised while scanning or constructing a carrier is recovered and
/// recorded into `store`; the loop then ends exactly as it would on a
/// normal scan failure, closing `tx` by dropping it.
pub(crate) fn spawn_scan_worker<S, R>(ctx: Context, store: Arc<PanicStore>, split: SplitFn, reader: R, tx: StreamSender<S>)
where
    S: Carrier,
    R: Read + Send + 'static,
{
    tokio::spawn(async move {
        let mut scanner = Scanner::new(reader, split);
        let mut counter: u64 = 0;

        loop {
            if ctx.is_cancelled() {
                break;
            }

            let outcome = {
                let join = tokio::task::spawn_blocking(move || {
                    let captured = catch_and_capture(std::panic::AssertUnwindSafe(|| scanner.scan()));
                    (scanner, captured)
                })
                .await;
                match join {
                    Ok((returned_scanner, captured)) => {
                        scanner = returned_scanner;
                        captured
                    }
                    Err(join_err) => {
                        // The blocking task itself was cancelled/aborted by the runtime
                        // rather than by our own cooperative cancellation token.
                        tracing::error!(error = %join_err, "scan worker's blocking task was lost");
                        break;
                    }
                }
            };

            let token = match outcome {
                Ok(Ok(Some(token))) => token,
                Ok(Ok(None)) => {
                    tracing::debug!("scan worker reached end of input");
                    break;
                }
                Ok(Err(scan_err)) => {
                    tracing::warn!(error = %scan_err, "scan step failed, ending input stream");
                    break;
                }
                Err((value, stack)) => {
                    tracing::error!(panic = %value, "scan step panicked, closing input stream");
                    store.store(value, stack);
                    break;
                }
            };

            let built = catch_and_capture(std::panic::AssertUnwindSafe(|| {
                S::from_utf8(&token).with_index(counter)
            }));
            let carrier = match built {
                Ok(carrier) => carrier,
                Err((value, stack)) => {
                    tracing::error!(panic = %value, "carrier construction panicked, closing input stream");
                    store.store(value, stack);
                    break;
                }
            };
            counter += 1;

            let sent = tokio::select! {
                biased;
                _ = ctx.cancelled() => false,
                res = tx.send(carrier) => res.is_ok(),
            };
            if !sent {
                // Either cancellation fired or the stage dropped its input
                // receiver. The channel model can't distinguish "stage
                // finished normally" from "stage violated the contract by
                // closing our input" — both look like a closed sender here
                // — so this isn't escalated to the panic store.
                break;
            }
        }

        drop(tx);
    });
}
