use crate::error::TokenizeError;
use crate::split::SplitResult;

/// Splits on `\n`, keeping it as part of the token (unlike a trim-newline
/// variant). The final unterminated line at EOF is still returned.
pub fn scan_lines(buf: &[u8], at_eof: bool) -> Result<SplitResult, TokenizeError> {
    match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => Ok(SplitResult::token(pos + 1, buf[..=pos].to_vec())),
        None if at_eof && !buf.is_empty() => Ok(SplitResult::token(buf.len(), buf.to_vec())),
        _ => Ok(SplitResult::pending()),
    }
}
