//! The boundary between a raw byte reader and a stage: scans tokens with a
//! [`tokenize`] splitter and feeds one carrier per token into a
//! [`pipeline::Processor`] or [`pipeline::Transcoder`], plus a synchronous
//! one-shot transform helper for callers that don't need incremental
//! scanning at all.

mod reader;
mod scan_worker;
mod transform;

pub use reader::{
    new_io_reader_processor, new_io_reader_transcoder, IoReaderProcessor, IoReaderTranscoder,
};
pub use transform::{transform, Decoder, Encoder, TransformError, Utf8Codec};
