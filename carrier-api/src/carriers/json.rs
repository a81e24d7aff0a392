use crate::carrier::{stable_sort_by_index_then_utf8, Carrier};
use crate::error::CarrierError;

/// One JSON value carried as raw bytes, not a parsed `serde_json::Value`.
///
/// The tokenizer layer is responsible for only ever handing this carrier
/// well-formed JSON value text; this carrier itself does no validation, so
/// that stages downstream can treat malformed input as an in-band error
/// rather than a panic.
#[derive(Debug, Clone, Default)]
pub struct JsonCarrier {
    raw: Vec<u8>,
    index: u64,
    error: Option<CarrierError>,
}

impl JsonCarrier {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: raw.into(),
            index: 0,
            error: None,
        }
    }

    /// The carrier's raw bytes, as handed to it by the tokenizer.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

impl Carrier for JsonCarrier {
    fn utf8(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }

    fn from_utf8(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    fn index(&self) -> u64 {
        self.index
    }

    fn with_index(mut self, index: u64) -> Self {
        self.index = index;
        self
    }

    fn error(&self) -> Option<&CarrierError> {
        self.error.as_ref()
    }

    fn set_error(mut self, error: Option<CarrierError>) -> Self {
        self.error = error;
        self
    }

    /// Wraps every item's raw bytes in a `[...]` array, joined with `,`.
    ///
    /// This is string stitching, not re-serialization: an item whose raw
    /// bytes are not valid JSON still ends up between the brackets verbatim,
    /// so an upstream in-band error on a single item doesn't get silently
    /// swallowed by a parse-and-rebuild round trip.
    fn aggregate(items: Vec<Self>) -> Self {
        let mut items = items;
        stable_sort_by_index_then_utf8(&mut items);
        let mut raw = Vec::with_capacity(items.len() * 8 + 2);
        raw.push(b'[');
        let mut error = None;
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                raw.push(b',');
            }
            raw.extend_from_slice(&item.raw);
            if error.is_none() {
                error = item.error;
            }
        }
        raw.push(b']');
        Self {
            raw,
            index: 0,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_builds_an_array_in_index_order() {
        let a = JsonCarrier::new(b"1".to_vec()).with_index(1);
        let b = JsonCarrier::new(br#"{"a":2}"#.to_vec()).with_index(0);
        let merged = JsonCarrier::aggregate(vec![a, b]);
        assert_eq!(merged.utf8(), r#"[{"a":2},1]"#);
    }

    #[test]
    fn aggregate_preserves_the_first_error_seen_in_order() {
        let ok = JsonCarrier::new(b"1".to_vec()).with_index(0);
        let bad = JsonCarrier::new(b"}{".to_vec())
            .with_index(1)
            .with_error(CarrierError::from_message("malformed"));
        let merged = JsonCarrier::aggregate(vec![ok, bad]);
        assert!(merged.has_error());
    }
}
