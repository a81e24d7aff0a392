//! Carrier contract, context/cancellation plumbing, and panic containment
//! shared by every stage in the streaming text pipeline.

mod carrier;
pub mod carriers;
mod context;
mod error;
pub mod panic_capture;
mod panic_store;
mod predicate;

pub use carrier::{stable_sort_by_index_then_utf8, Carrier};
pub use context::{
    closed_stream, new_channel, panic_store_from_context, with_panic_store, Context, Stream,
    StreamSender, CHANNEL_CAPACITY,
};
pub use error::CarrierError;
pub use panic_store::{PanicSnapshot, PanicStore};
pub use predicate::{has_error, predicate, Predicate};
