use crate::error::TokenizeError;
use crate::split::SplitResult;

fn is_ws(b: u8) -> bool {
    b.is_ascii_whitespace()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Name characters as XML defines them, loosely: anything but whitespace,
/// `>`, `/`, and the opening `<` that can never appear mid-name.
fn is_name_byte(b: u8) -> bool {
    !is_ws(b) && b != b'>' && b != b'/' && b != b'<'
}

/// Reads an element name starting at `pos`; `None` means the name might
/// continue past the end of the buffer.
fn parse_name(buf: &[u8], pos: usize) -> Option<(String, usize)> {
    let mut i = pos;
    while i < buf.len() && is_name_byte(buf[i]) {
        i += 1;
    }
    if i == buf.len() {
        return None;
    }
    Some((String::from_utf8_lossy(&buf[pos..i]).into_owned(), i))
}

/// Scans attributes up to the tag's closing `>` (or `/>`), honoring quoted
/// attribute values so a `>` inside one doesn't end the tag early.
/// Returns `(self_closing, bytes consumed from `buf`'s start)`.
fn scan_tag_tail(buf: &[u8]) -> Option<(bool, usize)> {
    let mut i = 0;
    let mut quote: Option<u8> = None;
    while i < buf.len() {
        let b = buf[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
            }
            b'>' => return Some((false, i + 1)),
            b'/' if buf.get(i + 1) == Some(&b'>') => return Some((true, i + 2)),
            _ => i += 1,
        }
    }
    None
}

/// Scans a `<!...>` directive (doctype and friends), honoring an internal
/// subset delimited by `[` `]` and quoted strings inside it, up to the
/// top-level closing `>`. Returns bytes consumed from `buf`'s start
/// (`buf` begins at the `<`).
fn scan_directive(buf: &[u8]) -> Option<usize> {
    let mut i = 2; // past "<!"
    let mut bracket_depth = 0i32;
    let mut quote: Option<u8> = None;
    while i < buf.len() {
        let b = buf[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'[' => bracket_depth += 1,
            b']' => bracket_depth -= 1,
            b'>' if bracket_depth <= 0 => return Some(i + 1),
            _ => {}
        }
        i += 1;
    }
    None
}

enum Skip {
    /// Bytes to advance past a fully-recognized special span; resume
    /// prolog scanning right after it.
    Advance(usize),
    /// Not enough buffered yet to tell; `usize` is how much of the prefix
    /// (if any) can already be safely discarded.
    NeedMore(usize),
    Error(TokenizeError),
}

/// Attempts to skip one whitespace run, comment, PI, CDATA section, or
/// `<!...>` directive starting at `i`. `confirmed` is how much of the
/// buffer before `i` is already known-discardable prolog noise.
fn skip_one(buf: &[u8], i: usize, confirmed: usize, at_eof: bool) -> Skip {
    if buf[i..].starts_with(b"<!--") {
        return match find_subslice(&buf[i + 4..], b"-->") {
            Some(rel) => Skip::Advance(i + 4 + rel + 3),
            None if at_eof => Skip::Error(TokenizeError::UnexpectedEof),
            None => Skip::NeedMore(confirmed),
        };
    }
    if buf[i..].starts_with(b"<![CDATA[") {
        return match find_subslice(&buf[i + 9..], b"]]>") {
            Some(rel) => Skip::Advance(i + 9 + rel + 3),
            None if at_eof => Skip::Error(TokenizeError::UnexpectedEof),
            None => Skip::NeedMore(confirmed),
        };
    }
    if buf[i..].starts_with(b"<?") {
        return match find_subslice(&buf[i + 2..], b"?>") {
            Some(rel) => Skip::Advance(i + 2 + rel + 2),
            None if at_eof => Skip::Error(TokenizeError::UnexpectedEof),
            None => Skip::NeedMore(confirmed),
        };
    }
    if buf[i..].starts_with(b"<!") {
        return match scan_directive(&buf[i..]) {
            Some(len) => Skip::Advance(i + len),
            None if at_eof => Skip::Error(TokenizeError::UnexpectedEof),
            None => Skip::NeedMore(confirmed),
        };
    }
    Skip::Advance(i)
}

/// Skips leading whitespace, PIs, comments, and doctype declarations until
/// the byte offset where the root element's opening `<` sits.
fn skip_prolog(buf: &[u8], at_eof: bool) -> Result<Option<usize>, TokenizeError> {
    let mut i = 0;
    loop {
        while i < buf.len() && is_ws(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(None);
        }
        if buf[i] != b'<' {
            return Err(TokenizeError::diagnostic(
                "unexpected content before root element",
                i as u64,
            ));
        }
        if i + 1 >= buf.len() {
            return Ok(None);
        }
        if buf[i + 1] == b'/' {
            return Err(TokenizeError::diagnostic(
                "unexpected closing tag before root element",
                i as u64,
            ));
        }
        if buf[i + 1] != b'!' && buf[i + 1] != b'?' {
            return Ok(Some(i));
        }
        match skip_one(buf, i, i, at_eof) {
            Skip::Advance(next) => i = next,
            Skip::NeedMore(_) => return Ok(None),
            Skip::Error(e) => return Err(e),
        }
    }
}

/// Skips leading prolog/PI/comments/doctype/whitespace, tracks element
/// nesting via a stack of element names, and emits one complete top-level
/// element per token. A self-closing root emits immediately. A mismatched
/// or unexpected close tag fails with a diagnostic carrying its byte
/// offset; an element still open at EOF fails with
/// [`TokenizeError::UnexpectedEof`].
pub fn scan_xml(buf: &[u8], at_eof: bool) -> Result<SplitResult, TokenizeError> {
    let element_start = match skip_prolog(buf, at_eof)? {
        Some(pos) => pos,
        None => {
            if at_eof {
                return Ok(SplitResult::pending());
            }
            // Find how much leading whitespace we can already discard even
            // though the root element hasn't fully arrived yet.
            let confirmed = buf.iter().take_while(|&&b| is_ws(b)).count();
            return Ok(SplitResult::skip(confirmed));
        }
    };

    let mut i = element_start;
    let mut stack: Vec<String> = Vec::new();

    loop {
        if i >= buf.len() {
            return if at_eof {
                Err(TokenizeError::UnexpectedEof)
            } else {
                Ok(SplitResult::skip(element_start))
            };
        }

        if buf[i] != b'<' {
            i += 1;
            continue;
        }

        if i + 1 >= buf.len() {
            return if at_eof {
                Err(TokenizeError::UnexpectedEof)
            } else {
                Ok(SplitResult::skip(element_start))
            };
        }

        match buf[i + 1] {
            b'!' | b'?' => match skip_one(buf, i, element_start, at_eof) {
                Skip::Advance(next) => i = next,
                Skip::NeedMore(confirmed) => return Ok(SplitResult::skip(confirmed)),
                Skip::Error(e) => return Err(e),
            },
            b'/' => {
                let Some((name, after_name)) = parse_name(buf, i + 2) else {
                    return if at_eof {
                        Err(TokenizeError::UnexpectedEof)
                    } else {
                        Ok(SplitResult::skip(element_start))
                    };
                };
                let mut k = after_name;
                while k < buf.len() && is_ws(buf[k]) {
                    k += 1;
                }
                if k >= buf.len() {
                    return if at_eof {
                        Err(TokenizeError::UnexpectedEof)
                    } else {
                        Ok(SplitResult::skip(element_start))
                    };
                }
                if buf[k] != b'>' {
                    return Err(TokenizeError::diagnostic("malformed closing tag", i as u64));
                }
                let tag_end = k + 1;
                match stack.pop() {
                    Some(open) if open == name => {
                        if stack.is_empty() {
                            return Ok(SplitResult::token(tag_end, buf[element_start..tag_end].to_vec()));
                        }
                        i = tag_end;
                    }
                    _ => {
                        return Err(TokenizeError::diagnostic(
                            format!("mismatched closing tag </{name}>"),
                            i as u64,
                        ))
                    }
                }
            }
            _ => {
                let Some((name, after_name)) = parse_name(buf, i + 1) else {
                    return if at_eof {
                        Err(TokenizeError::UnexpectedEof)
                    } else {
                        Ok(SplitResult::skip(element_start))
                    };
                };
                match scan_tag_tail(&buf[after_name..]) {
                    Some((self_closing, tail_len)) => {
                        let tag_end = after_name + tail_len;
                        if self_closing {
                            if stack.is_empty() {
                                return Ok(SplitResult::token(tag_end, buf[element_start..tag_end].to_vec()));
                            }
                            i = tag_end;
                        } else {
                            stack.push(name);
                            i = tag_end;
                        }
                    }
                    None => {
                        return if at_eof {
                            Err(TokenizeError::UnexpectedEof)
                        } else {
                            Ok(SplitResult::skip(element_start))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(mut buf: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        loop {
            let result = scan_xml(buf, true).unwrap();
            if result.advance == 0 && result.token.is_none() {
                break;
            }
            buf = &buf[result.advance..];
            if let Some(token) = result.token {
                tokens.push(String::from_utf8(token).unwrap());
            }
        }
        tokens
    }

    #[test]
    fn self_closing_root_emits_one_token() {
        assert_eq!(all_tokens(b"<a/>"), vec!["<a/>"]);
    }

    #[test]
    fn nested_elements_frame_as_one_token() {
        let input = "<a><b>x</b><c/></a>";
        assert_eq!(all_tokens(input.as_bytes()), vec![input]);
    }

    #[test]
    fn skips_prolog_pi_and_comments() {
        let input = "<?xml version=\"1.0\"?><!-- hi --><root/>";
        assert_eq!(all_tokens(input.as_bytes()), vec!["<root/>"]);
    }

    #[test]
    fn multiple_top_level_elements_yield_multiple_tokens() {
        let input = "<a/><b/>";
        assert_eq!(all_tokens(input.as_bytes()), vec!["<a/>", "<b/>"]);
    }

    #[test]
    fn mismatched_close_tag_fails_with_offset() {
        let err = scan_xml(b"<a><b></a></a>", true).unwrap_err();
        match err {
            TokenizeError::Diagnostic { offset, .. } => assert_eq!(offset, 6),
            other => panic!("expected diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_element_at_eof_fails() {
        let err = scan_xml(b"<a><b>", true).unwrap_err();
        assert_eq!(err, TokenizeError::UnexpectedEof);
    }
}
