use crate::error::TokenizeError;
use crate::split::SplitResult;

/// Skips leading noise until the first `{` or `[`, then tracks nesting
/// (string-escape aware) to emit one complete top-level JSON value per
/// token. Unclosed structure at EOF fails with [`TokenizeError::UnexpectedEof`].
/// Leading noise is discarded as soon as it's scanned, even short of a full
/// value, so the scanner driving this never has to buffer more than one
/// value's worth of bytes.
pub fn scan_json(buf: &[u8], at_eof: bool) -> Result<SplitResult, TokenizeError> {
    let start = match buf.iter().position(|&b| b == b'{' || b == b'[') {
        Some(pos) => pos,
        None => return Ok(SplitResult::skip(buf.len())),
    };

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in buf[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Ok(SplitResult::token(end, buf[start..end].to_vec()));
                }
            }
            _ => {}
        }
    }

    if at_eof {
        Err(TokenizeError::UnexpectedEof)
    } else {
        Ok(SplitResult::skip(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Synthetic JSON value tree for the framing property test below:
    /// strings and object keys are kept alphanumeric so rendering never
    /// needs escaping.
    #[derive(Clone, Debug)]
    enum JsonValue {
        Null,
        Bool(bool),
        Number(i32),
        Str(String),
        Array(Vec<JsonValue>),
        Object(Vec<(String, JsonValue)>),
    }

    impl JsonValue {
        fn render(&self) -> String {
            match self {
                JsonValue::Null => "null".to_string(),
                JsonValue::Bool(b) => b.to_string(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Str(s) => format!("\"{s}\""),
                JsonValue::Array(items) => {
                    let inner: Vec<String> = items.iter().map(JsonValue::render).collect();
                    format!("[{}]", inner.join(","))
                }
                JsonValue::Object(fields) => {
                    let inner: Vec<String> = fields
                        .iter()
                        .map(|(k, v)| format!("\"{k}\":{}", v.render()))
                        .collect();
                    format!("{{{}}}", inner.join(","))
                }
            }
        }
    }

    fn json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            any::<i32>().prop_map(JsonValue::Number),
            "[a-zA-Z0-9]{0,8}".prop_map(JsonValue::Str),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                prop::collection::vec(("[a-zA-Z0-9]{1,6}", inner), 0..4)
                    .prop_map(JsonValue::Object),
            ]
        })
    }

    fn all_tokens(mut buf: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        loop {
            let result = scan_json(buf, true).unwrap();
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
    fn frames_values_separated_by_noise() {
        let input = " \n,\t{\"a\":1}  [1,2,{\"b\":\"x\"}]  {\"c\":\"{[\\\"}]\"}\n";
        let tokens = all_tokens(input.as_bytes());
        assert_eq!(
            tokens,
            vec![r#"{"a":1}"#, r#"[1,2,{"b":"x"}]"#, r#"{"c":"{[\"}]"}"#]
        );
    }

    #[test]
    fn unclosed_structure_at_eof_fails() {
        let err = scan_json(b"{\"a\":1", true).unwrap_err();
        assert_eq!(err, TokenizeError::UnexpectedEof);
    }

    #[test]
    fn incomplete_structure_waits_after_discarding_noise() {
        let result = scan_json(b"noise {\"a\":1", false).unwrap();
        assert_eq!(result.advance, 6);
        assert!(result.token.is_none());
    }

    proptest! {
        /// P2: a sequence of top-level JSON values separated by arbitrary
        /// non-value noise is framed intact, one token per value, in order.
        #[test]
        fn frames_arbitrary_values_separated_by_noise(
            values in prop::collection::vec(json_value(), 1..6),
            noises in prop::collection::vec("[^{\\[]{0,5}", 1..7),
        ) {
            let mut input = String::new();
            let mut noise_iter = noises.iter().cycle();
            for value in &values {
                input.push_str(noise_iter.next().unwrap());
                input.push_str(&value.render());
            }
            input.push_str(noise_iter.next().unwrap());

            let expected: Vec<String> = values.iter().map(JsonValue::render).collect();
            prop_assert_eq!(all_tokens(input.as_bytes()), expected);
        }
    }
}
