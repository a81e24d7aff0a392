use std::io::{self, Read, Write};

use carrier_api::{new_channel, Carrier, Context};
use pipeline::{safe_apply, Processor};

/// Decodes an input byte source into the crate's lone UTF-8 working format.
///
/// Character-set decoding between arbitrary byte encodings and UTF-8 is
/// explicitly out of scope for this library (it's thin glue best owned by a
/// caller that knows its actual input encoding); this trait is the seam a
/// caller plugs that decoder into. [`Utf8Codec`] is the only implementation
/// this crate ships, for callers whose input is already UTF-8.
pub trait Decoder: Send + Sync {
    fn decode(&self, input: &mut dyn Read) -> io::Result<String>;
}

/// The output-side counterpart of [`Decoder`].
pub trait Encoder: Send + Sync {
    fn encode(&self, text: &str, output: &mut dyn Write) -> io::Result<()>;
}

/// A no-op codec for callers whose bytes are already UTF-8 in both
/// directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Decoder for Utf8Codec {
    fn decode(&self, input: &mut dyn Read) -> io::Result<String> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl Encoder for Utf8Codec {
    fn encode(&self, text: &str, output: &mut dyn Write) -> io::Result<()> {
        output.write_all(text.as_bytes())
    }
}

/// A failure from either side of [`transform`].
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("decoding input failed: {0}")]
    Decode(#[source] io::Error),
    #[error("encoding output failed: {0}")]
    Encode(#[source] io::Error),
}

/// Synchronous decode -> process -> encode helper binding a single
/// [`Processor`] to a whole byte source and byte sink, with no tokenizer or
/// scanner involved: the entire input becomes exactly one carrier.
///
/// 1. Decode `input` into a UTF-8 `String`.
/// 2. Feed one carrier built from that string into `processor`, then close
///    its input.
/// 3. Encode every carrier the processor emits, in order, into `output`.
/// 4. If encoding fails partway through, cancel the run and drain the rest
///    of the processor's output in the background so it never blocks on a
///    send nobody is receiving, then return the error.
///
/// Both ends are closed (by going out of scope) whether this returns `Ok`
/// or `Err`.
pub async fn transform<S: Carrier>(
    ctx: &Context,
    processor: &dyn Processor<S>,
    input: &mut dyn Read,
    decoder: &dyn Decoder,
    output: &mut dyn Write,
    encoder: &dyn Encoder,
) -> Result<(), TransformError> {
    let run_ctx = ctx.child();

    let text = decoder.decode(input).map_err(TransformError::Decode)?;

    let (tx, rx) = new_channel::<S>();
    let mut out = safe_apply(&run_ctx, processor, rx);

    let carrier = S::from_utf8(text.as_bytes());
    let _ = tx.send(carrier).await;
    drop(tx);

    while let Some(item) = out.recv().await {
        if let Err(e) = encoder.encode(&item.utf8(), output) {
            run_ctx.cancel();
            tokio::spawn(async move { while out.recv().await.is_some() {} });
            return Err(TransformError::Encode(e));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrier_api::carriers::StringCarrier;
    use pipeline::identity_processor;

    #[tokio::test]
    async fn round_trips_a_single_value_through_the_processor() {
        let ctx = Context::background();
        let processor = identity_processor::<StringCarrier>();
        let mut input: &[u8] = b"hello world";
        let mut output: Vec<u8> = Vec::new();

        transform::<StringCarrier>(&ctx, &processor, &mut input, &Utf8Codec, &mut output, &Utf8Codec)
            .await
            .unwrap();

        assert_eq!(output, b"hello world");
    }

    struct FailingEncoder;

    impl Encoder for FailingEncoder {
        fn encode(&self, _text: &str, _output: &mut dyn Write) -> io::Result<()> {
            Err(io::Error::other("encode always fails"))
        }
    }

    #[tokio::test]
    async fn encode_failure_cancels_the_run_and_surfaces_the_error() {
        let ctx = Context::background();
        let processor = identity_processor::<StringCarrier>();
        let mut input: &[u8] = b"hello";
        let mut output: Vec<u8> = Vec::new();

        let result =
            transform::<StringCarrier>(&ctx, &processor, &mut input, &Utf8Codec, &mut output, &FailingEncoder).await;

        assert!(matches!(result, Err(TransformError::Encode(_))));
    }
}
