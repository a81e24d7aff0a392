use std::io::Read;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carrier_api::{new_channel, panic_store_from_context, with_panic_store, Carrier, Context, PanicStore, Stream};
use pipeline::{safe_apply, safe_apply_transcoder, Processor, Transcoder};
use tokenize::{scan_lines, SplitFn};

use crate::scan_worker::spawn_scan_worker;

/// Pick up a caller-supplied panic store if `parent` already carries one,
/// otherwise attach a fresh one — the "ensure a panic store is attached,
/// reuse caller's if present" startup rule shared by both adapters below.
fn ensure_panic_store(parent: &Context) -> (Context, Arc<PanicStore>) {
    match panic_store_from_context(parent) {
        Some(store) => (parent.child(), store),
        None => with_panic_store(parent),
    }
}

/// Binds an incremental byte reader to a [`Processor`], scanning tokens out
/// of the reader with a [`SplitFn`] and feeding one carrier per token into
/// the processor.
///
/// Configuration (`set_context`, `set_split`) must happen before [`start`];
/// once started, the reader has been consumed and a second `start` call
/// returns an already-closed stream.
///
/// [`start`]: IoReaderProcessor::start
pub struct IoReaderProcessor<S: Carrier, R> {
    processor: Arc<dyn Processor<S>>,
    reader: Mutex<Option<R>>,
    split: SplitFn,
    ctx: Context,
    store: Arc<PanicStore>,
}

impl<S: Carrier, R: Read + Send + 'static> IoReaderProcessor<S, R> {
    /// `processor` over `reader`, with the line splitter and a background
    /// context as defaults — mirrors `new_io_reader_processor(proc, reader)`.
    pub fn new(processor: Arc<dyn Processor<S>>, reader: R) -> Self {
        let (ctx, store) = with_panic_store(&Context::background());
        Self {
            processor,
            reader: Mutex::new(Some(reader)),
            split: scan_lines,
            ctx,
            store,
        }
    }

    /// Replace the base context, reusing its panic store if it has one.
    pub fn set_context(mut self, parent: &Context) -> Self {
        let (ctx, store) = ensure_panic_store(parent);
        self.ctx = ctx;
        self.store = store;
        self
    }

    pub fn set_split(mut self, split: SplitFn) -> Self {
        self.split = split;
        self
    }

    /// Start scanning and wire the scanned stream into the processor.
    ///
    /// Wiring itself is guarded by [`safe_apply`]: a panic during `apply` or
    /// a `None`-shaped stream from a misbehaving processor substitutes a
    /// closed stream rather than propagating or hanging.
    pub fn start(&self) -> Stream<S> {
        self.start_from(self.ctx.clone())
    }

    /// As [`start`](Self::start), but the run is cancelled automatically
    /// after `timeout`. `timeout <= Duration::ZERO` is equivalent to
    /// `start()` — no deadline.
    pub fn start_with_timeout(&self, timeout: Duration) -> Stream<S> {
        if timeout <= Duration::ZERO {
            return self.start();
        }
        self.start_from(self.ctx.with_timeout(timeout))
    }

    fn start_from(&self, run_ctx: Context) -> Stream<S> {
        let Some(reader) = self.reader.lock().expect("reader mutex poisoned").take() else {
            tracing::warn!("IoReaderProcessor::start called more than once, returning a closed stream");
            return carrier_api::closed_stream();
        };

        let (input_tx, input_rx) = new_channel::<S>();
        let output = safe_apply(&run_ctx, self.processor.as_ref(), input_rx);
        spawn_scan_worker(run_ctx, self.store.clone(), self.split, reader, input_tx);
        output
    }

    /// Cancel the adapter's run. Safe to call before `start` — cancelling
    /// before anything is wired just means the first `start` call produces
    /// an immediately-closed output.
    pub fn stop(&self) {
        self.ctx.cancel();
    }

    /// The panic store attached to this adapter's context, for a supervisor
    /// to inspect after draining the output stream.
    pub fn panic_store(&self) -> Arc<PanicStore> {
        self.store.clone()
    }
}

/// As [`IoReaderProcessor`], but wired to a [`Transcoder`] so the scanned
/// carrier type (`S1`) and the adapter's output carrier type (`S2`) differ.
pub struct IoReaderTranscoder<S1: Carrier, S2: Carrier, R> {
    transcoder: Arc<dyn Transcoder<S1, S2>>,
    reader: Mutex<Option<R>>,
    split: SplitFn,
    ctx: Context,
    store: Arc<PanicStore>,
}

impl<S1: Carrier, S2: Carrier, R: Read + Send + 'static> IoReaderTranscoder<S1, S2, R> {
    pub fn new(transcoder: Arc<dyn Transcoder<S1, S2>>, reader: R) -> Self {
        let (ctx, store) = with_panic_store(&Context::background());
        Self {
            transcoder,
            reader: Mutex::new(Some(reader)),
            split: scan_lines,
            ctx,
            store,
        }
    }

    pub fn set_context(mut self, parent: &Context) -> Self {
        let (ctx, store) = ensure_panic_store(parent);
        self.ctx = ctx;
        self.store = store;
        self
    }

    pub fn set_split(mut self, split: SplitFn) -> Self {
        self.split = split;
        self
    }

    pub fn start(&self) -> Stream<S2> {
        self.start_from(self.ctx.clone())
    }

    pub fn start_with_timeout(&self, timeout: Duration) -> Stream<S2> {
        if timeout <= Duration::ZERO {
            return self.start();
        }
        self.start_from(self.ctx.with_timeout(timeout))
    }

    fn start_from(&self, run_ctx: Context) -> Stream<S2> {
        let Some(reader) = self.reader.lock().expect("reader mutex poisoned").take() else {
            tracing::warn!("IoReaderTranscoder::start called more than once, returning a closed stream");
            return carrier_api::closed_stream();
        };

        let (input_tx, input_rx) = new_channel::<S1>();
        let output = safe_apply_transcoder(&run_ctx, self.transcoder.as_ref(), input_rx);
        spawn_scan_worker(run_ctx, self.store.clone(), self.split, reader, input_tx);
        output
    }

    pub fn stop(&self) {
        self.ctx.cancel();
    }

    pub fn panic_store(&self) -> Arc<PanicStore> {
        self.store.clone()
    }
}

/// Build an [`IoReaderProcessor`] — mirrors the library's
/// `new_io_reader_processor(proc, reader)` constructor.
pub fn new_io_reader_processor<S, R>(processor: Arc<dyn Processor<S>>, reader: R) -> IoReaderProcessor<S, R>
where
    S: Carrier,
    R: Read + Send + 'static,
{
    IoReaderProcessor::new(processor, reader)
}

/// Build an [`IoReaderTranscoder`] — mirrors the library's
/// `io_reader_transcoder(proc, reader)` constructor.
pub fn new_io_reader_transcoder<S1, S2, R>(
    transcoder: Arc<dyn Transcoder<S1, S2>>,
    reader: R,
) -> IoReaderTranscoder<S1, S2, R>
where
    S1: Carrier,
    S2: Carrier,
    R: Read + Send + 'static,
{
    IoReaderTranscoder::new(transcoder, reader)
}
