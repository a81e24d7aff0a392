use crate::error::TokenizeError;

/// The result of one splitter call: how many bytes of the buffer were
/// consumed, and the token extracted from them, if any.
///
/// A splitter may report progress (`advance > 0`) without producing a token
/// — this is how the JSON and XML splitters discard leading noise without
/// needing the whole value to already be buffered. `advance == 0` with no
/// token means "call me again once more bytes have arrived".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    pub advance: usize,
    pub token: Option<Vec<u8>>,
}

impl SplitResult {
    pub fn pending() -> Self {
        Self {
            advance: 0,
            token: None,
        }
    }

    pub fn skip(advance: usize) -> Self {
        Self {
            advance,
            token: None,
        }
    }

    pub fn token(advance: usize, token: Vec<u8>) -> Self {
        Self {
            advance,
            token: Some(token),
        }
    }
}

/// A stateless splitter function: `(buffer, at_eof) -> SplitResult`.
///
/// `at_eof` tells the splitter no more bytes are coming; a splitter that
/// would otherwise wait for more input must make a final decision (emit a
/// trailing token, or fail with [`TokenizeError::UnexpectedEof`]).
pub type SplitFn = fn(&[u8], bool) -> Result<SplitResult, TokenizeError>;
