use crate::carrier::{stable_sort_by_index_then_utf8, Carrier};
use crate::error::CarrierError;

/// One XML element, carried as its serialized fragment text.
#[derive(Debug, Clone, Default)]
pub struct XmlFragmentCarrier {
    pub value: String,
    index: u64,
    error: Option<CarrierError>,
}

impl XmlFragmentCarrier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            index: 0,
            error: None,
        }
    }
}

impl Carrier for XmlFragmentCarrier {
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

    /// Wraps the sorted, concatenated fragments in a synthetic `<items>` root
    /// so the aggregate itself is a single well-formed document.
    fn aggregate(items: Vec<Self>) -> Self {
        let mut items = items;
        stable_sort_by_index_then_utf8(&mut items);
        let mut value = String::from("<items>");
        let mut error = None;
        for item in items {
            value.push_str(&item.value);
            if error.is_none() {
                error = item.error;
            }
        }
        value.push_str("</items>");
        Self {
            value,
            index: 0,
            error,
        }
    }
}
