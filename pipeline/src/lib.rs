//! Composable streaming stages built on [`carrier_api::Carrier`]: chains,
//! fan-out/fan-in routers, conditional branching, and try/catch/finally.

mod chain;
mod conditional;
mod identity;
mod router;
mod stage;
mod try_catch;
mod worker;

pub use chain::{new_chain, stick_left, stick_right, Chain, Glue, RightGlue};
pub use conditional::{new_if, Conditional, IfBuilder};
pub use identity::{identity_processor, identity_transcoder, IdentityProcessor, IdentityTranscoder};
pub use router::{new_router, Router, Strategy};
pub use stage::{safe_apply, safe_apply_transcoder, Processor, Transcoder};
pub use try_catch::{try_block, CatchBuilder, TryBuilder, TryCatchFinally};
pub use worker::spawn_worker;
