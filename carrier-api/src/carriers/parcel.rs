use crate::carrier::{stable_sort_by_index_then_utf8, Carrier};
use crate::error::CarrierError;

/// A partial transformation recorded against a rune range of some `text`.
///
/// `pos` and `len` are **rune** (character) offsets into the owning
/// [`Parcel`]'s `text`, not byte offsets — this carrier exists precisely
/// because upstream transforms often only touch a handful of words inside a
/// much longer passage, and tracking byte offsets across a stage boundary
/// that might itself re-encode the text would be fragile.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub transformed: String,
    pub pos: u64,
    pub len: u64,
    pub confidence: f32,
    pub variant: String,
}

impl Fragment {
    pub fn new(transformed: impl Into<String>, pos: u64, len: u64) -> Self {
        Self {
            transformed: transformed.into(),
            pos,
            len,
            confidence: 1.0,
            variant: String::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    fn end(&self) -> u64 {
        self.pos + self.len
    }
}

/// Original text plus a scattered set of partial transformations over it.
///
/// `utf8()` reconstructs a single string by interleaving `fragments` with
/// the raw spans of `text` they don't cover; see the module-level
/// reconstruction rules below.
#[derive(Debug, Clone, Default)]
pub struct Parcel {
    index: u64,
    pub text: String,
    pub fragments: Vec<Fragment>,
    error: Option<CarrierError>,
}

impl Parcel {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            index: 0,
            text: text.into(),
            fragments: Vec::new(),
            error: None,
        }
    }

    pub fn with_fragments(mut self, fragments: Vec<Fragment>) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn push_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    fn rune_len(&self) -> u64 {
        self.text.chars().count() as u64
    }

    /// Fragments clamped into `[0, rune_len]`, with zero/negative-length and
    /// wholly out-of-range fragments dropped, in the order they were given —
    /// ties on `pos` keep this order, which is how "first wins" is decided.
    fn clamped_fragments(&self) -> Vec<Fragment> {
        let limit = self.rune_len();
        self.fragments
            .iter()
            .filter_map(|f| {
                let pos = f.pos.min(limit);
                let end = f.end().min(limit);
                if end <= pos {
                    return None;
                }
                let mut clamped = f.clone();
                clamped.pos = pos;
                clamped.len = end - pos;
                Some(clamped)
            })
            .collect()
    }
}

impl Carrier for Parcel {
    /// Interleaves `fragments` with the raw regions of `text` they leave
    /// uncovered. Fragments are walked in `pos` order; a fragment starting
    /// inside a region already emitted is coalesced away — its `transformed`
    /// text is dropped, but the covered cursor still advances to its end so
    /// the overlap doesn't leak raw text back out. A fragment and a later
    /// one sharing the same `pos` both start inside nothing yet, so the
    /// earlier one (by this stable ordering) is the one that's emitted.
    fn utf8(&self) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        let mut fragments = self.clamped_fragments();
        fragments.sort_by_key(|f| f.pos);

        let mut out = String::new();
        let mut cursor: u64 = 0;
        for fragment in fragments {
            if fragment.pos < cursor {
                cursor = cursor.max(fragment.end());
                continue;
            }
            out.extend(&chars[cursor as usize..fragment.pos as usize]);
            out.push_str(&fragment.transformed);
            cursor = fragment.end();
        }
        out.extend(&chars[cursor as usize..]);
        out
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

    /// Concatenates `text`s in order and rebases each item's fragment
    /// positions by the cumulative rune length of the texts already placed
    /// ahead of it, so the merged Parcel's fragments still point at the
    /// right offsets into the merged `text`.
    fn aggregate(items: Vec<Self>) -> Self {
        let mut items = items;
        stable_sort_by_index_then_utf8(&mut items);

        let mut text = String::new();
        let mut fragments = Vec::new();
        let mut error = None;
        let mut offset: u64 = 0;
        for item in items {
            for fragment in item.fragments {
                let mut rebased = fragment;
                rebased.pos += offset;
                fragments.push(rebased);
            }
            offset += item.text.chars().count() as u64;
            text.push_str(&item.text);
            if error.is_none() {
                error = item.error;
            }
        }

        Self {
            index: 0,
            text,
            fragments,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_reconstructs_raw_text_without_fragments() {
        let parcel = Parcel::new("hello world");
        assert_eq!(parcel.utf8(), "hello world");
    }

    #[test]
    fn utf8_splices_a_single_fragment_into_its_rune_range() {
        let parcel = Parcel::new("hello world").push_fragment(Fragment::new("there", 6, 5));
        assert_eq!(parcel.utf8(), "hello there");
    }

    #[test]
    fn utf8_keeps_the_first_fragment_at_a_shared_position() {
        let parcel = Parcel::new("abcdef")
            .push_fragment(Fragment::new("XY", 0, 2))
            .push_fragment(Fragment::new("ZZ", 0, 2));
        assert_eq!(parcel.utf8(), "XYcdef");
    }

    #[test]
    fn utf8_coalesces_overlapping_fragments_by_advancing_the_cursor() {
        let parcel = Parcel::new("abcdefgh")
            .push_fragment(Fragment::new("123", 0, 3))
            .push_fragment(Fragment::new("999", 2, 4));
        assert_eq!(parcel.utf8(), "123efgh");
    }

    #[test]
    fn utf8_ignores_zero_length_and_out_of_range_fragments() {
        let parcel = Parcel::new("abc")
            .push_fragment(Fragment::new("nope", 1, 0))
            .push_fragment(Fragment::new("nope", 10, 5));
        assert_eq!(parcel.utf8(), "abc");
    }

    #[test]
    fn utf8_handles_multibyte_runes_by_character_offset_not_byte_offset() {
        let parcel = Parcel::new("caf\u{e9} bar").push_fragment(Fragment::new("e", 3, 1));
        assert_eq!(parcel.utf8(), "cafe bar");
    }

    #[test]
    fn aggregate_rebases_fragment_positions_by_preceding_text_length() {
        let first = Parcel::new("ab").push_fragment(Fragment::new("X", 0, 1));
        let second = Parcel::new("cd")
            .with_index(1)
            .push_fragment(Fragment::new("Y", 0, 1));
        let merged = Parcel::aggregate(vec![second, first]);
        assert_eq!(merged.text, "abcd");
        assert_eq!(merged.utf8(), "XbYd");
        let mut positions: Vec<u64> = merged.fragments.iter().map(|f| f.pos).collect();
        positions.sort();
        assert_eq!(positions, vec![0, 2]);
    }
}
