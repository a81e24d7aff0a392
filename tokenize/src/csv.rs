use crate::error::TokenizeError;
use crate::split::SplitResult;

/// Splits records on `\n`, `\r\n`, or `\r`, treating any of those bytes
/// inside a quoted field (doubled-quote `""` escaping, RFC 4180 style) as
/// ordinary content rather than a record boundary. The separator itself is
/// never included in the returned token. An unclosed quoted field at EOF
/// fails with [`TokenizeError::UnexpectedEof`].
pub fn scan_csv(buf: &[u8], at_eof: bool) -> Result<SplitResult, TokenizeError> {
    let mut i = 0;
    let mut in_quotes = false;

    while i < buf.len() {
        let b = buf[i];
        if in_quotes {
            if b == b'"' {
                if i + 1 < buf.len() && buf[i + 1] == b'"' {
                    i += 2;
                    continue;
                }
                if i + 1 >= buf.len() && !at_eof {
                    return Ok(SplitResult::pending());
                }
                in_quotes = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => {
                in_quotes = true;
                i += 1;
            }
            b'\r' => {
                return if i + 1 < buf.len() {
                    let consumed = if buf[i + 1] == b'\n' { i + 2 } else { i + 1 };
                    Ok(SplitResult::token(consumed, buf[..i].to_vec()))
                } else if at_eof {
                    Ok(SplitResult::token(i + 1, buf[..i].to_vec()))
                } else {
                    Ok(SplitResult::pending())
                };
            }
            b'\n' => return Ok(SplitResult::token(i + 1, buf[..i].to_vec())),
            _ => i += 1,
        }
    }

    if in_quotes {
        return if at_eof {
            Err(TokenizeError::UnexpectedEof)
        } else {
            Ok(SplitResult::pending())
        };
    }

    if at_eof {
        if buf.is_empty() {
            Ok(SplitResult::pending())
        } else {
            Ok(SplitResult::token(buf.len(), buf.to_vec()))
        }
    } else {
        Ok(SplitResult::pending())
    }
}
