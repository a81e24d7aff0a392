use crate::carrier::{stable_sort_by_index_then_utf8, Carrier};
use crate::error::CarrierError;

/// One already-unescaped CSV record, carried as a single text line.
#[derive(Debug, Clone, Default)]
pub struct CsvRecordCarrier {
    pub value: String,
    index: u64,
    error: Option<CarrierError>,
}

impl CsvRecordCarrier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            index: 0,
            error: None,
        }
    }
}

impl Carrier for CsvRecordCarrier {
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

    /// Rejoins records with `\n`, restoring the line-oriented shape the
    /// tokenizer split apart.
    fn aggregate(items: Vec<Self>) -> Self {
        let mut items = items;
        stable_sort_by_index_then_utf8(&mut items);
        let mut value = String::new();
        let mut error = None;
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                value.push('\n');
            }
            value.push_str(&item.value);
            if error.is_none() {
                error = item.error;
            }
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
    fn aggregate_rejoins_records_with_newlines() {
        let a = CsvRecordCarrier::new("1,2,3").with_index(0);
        let b = CsvRecordCarrier::new("4,5,6").with_index(1);
        let merged = CsvRecordCarrier::aggregate(vec![b, a]);
        assert_eq!(merged.utf8(), "1,2,3\n4,5,6");
    }
}
