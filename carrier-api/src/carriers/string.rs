use crate::carrier::{stable_sort_by_index_then_utf8, Carrier};
use crate::error::CarrierError;

/// The simplest carrier: a plain UTF-8 string plus ordering and error.
#[derive(Debug, Clone, Default)]
pub struct StringCarrier {
    pub value: String,
    index: u64,
    error: Option<CarrierError>,
}

impl StringCarrier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            index: 0,
            error: None,
        }
    }
}

impl Carrier for StringCarrier {
    fn utf8(&self) -> String {
        self.value.clone()
    }

    fn from_utf8(bytes: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(bytes).into_owned())
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

    fn aggregate(items: Vec<Self>) -> Self {
        let mut items = items;
        stable_sort_by_index_then_utf8(&mut items);
        let mut value = String::new();
        let mut error = None;
        for item in items {
            if error.is_none() {
                error = item.error;
            }
            value.push_str(&item.value);
        }
        Self {
            value,
            index: 0,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototype_construction_is_index_independent() {
        let zero = StringCarrier::default();
        let a = zero.clone().from_utf8_then_index(b"hello", 3);
        assert_eq!(a.utf8(), "hello");
        assert_eq!(a.index(), 3);
    }

    #[test]
    fn aggregate_sorts_by_index_then_value() {
        let a = StringCarrier::new("b").with_index(1);
        let b = StringCarrier::new("a").with_index(1);
        let c = StringCarrier::new("z").with_index(0);
        let merged = StringCarrier::aggregate(vec![a, b, c]);
        assert_eq!(merged.utf8(), "zab");
    }

    #[test]
    fn aggregate_is_idempotent_on_single_element() {
        let only = StringCarrier::new("solo").with_index(7);
        let merged = StringCarrier::aggregate(vec![only.clone()]);
        assert_eq!(merged.utf8(), only.utf8());
    }

    // small helper used only by the prototype test above, kept local since
    // `Carrier::from_utf8` is an associated fn and can't be chained directly
    impl StringCarrier {
        fn from_utf8_then_index(&self, bytes: &[u8], index: u64) -> Self {
            StringCarrier::from_utf8(bytes).with_index(index)
        }
    }
}
