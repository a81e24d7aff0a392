use crate::error::TokenizeError;
use crate::split::SplitResult;

fn is_ws(b: u8) -> bool {
    b.is_ascii_whitespace()
}

/// One token = optional leading whitespace, one non-whitespace run, then
/// optional trailing whitespace. Concatenating every token in order
/// reconstructs the input byte-for-byte; a buffer that never contains
/// non-whitespace bytes is emitted as a single token only once `at_eof`.
pub fn scan_expression(buf: &[u8], at_eof: bool) -> Result<SplitResult, TokenizeError> {
    let mut i = 0;
    while i < buf.len() && is_ws(buf[i]) {
        i += 1;
    }

    if i == buf.len() {
        return if at_eof {
            if buf.is_empty() {
                Ok(SplitResult::pending())
            } else {
                Ok(SplitResult::token(buf.len(), buf.to_vec()))
            }
        } else {
            Ok(SplitResult::pending())
        };
    }

    while i < buf.len() && !is_ws(buf[i]) {
        i += 1;
    }
    if i == buf.len() && !at_eof {
        return Ok(SplitResult::pending());
    }

    while i < buf.len() && is_ws(buf[i]) {
        i += 1;
    }
    if i == buf.len() && !at_eof {
        return Ok(SplitResult::pending());
    }

    Ok(SplitResult::token(i, buf[..i].to_vec()))
}
