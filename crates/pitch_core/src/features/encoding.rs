//! Deterministic label encoding
//!
//! Codes are assigned from the sorted distinct label set, so retraining on
//! the same corpus always produces the same mapping no matter what order
//! the rows arrived in. Lookups binary-search the sorted label list, which
//! keeps the serialized form down to the labels themselves.

use serde::{Deserialize, Serialize};

/// Sentinel label standing in for "no previous pitch in this at-bat".
///
/// Encoded alongside the real labels, so it competes for its slot in
/// sorted order like any other string.
pub const NO_PITCH: &str = "No_Pitch";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelEncoding {
    labels: Vec<String>,
}

impl LabelEncoding {
    /// Build from any iterator of labels. Duplicates collapse; codes follow
    /// sorted order.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        distinct.sort();
        distinct.dedup();
        Self { labels: distinct }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Ordered label list; position equals code.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .ok()
            .map(|index| index as u32)
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoding = LabelEncoding::fit(["SL", "FF", "CU", "FF", "SL"]);
        assert_eq!(encoding.len(), 3);
        assert_eq!(encoding.labels(), &["CU", "FF", "SL"]);
        assert_eq!(encoding.encode("CU"), Some(0));
        assert_eq!(encoding.encode("FF"), Some(1));
        assert_eq!(encoding.encode("SL"), Some(2));
    }

    #[test]
    fn test_mapping_independent_of_input_order() {
        let a = LabelEncoding::fit(["FF", "CU", "SL", "SI"]);
        let b = LabelEncoding::fit(["SI", "SL", "CU", "FF", "CU"]);
        assert_eq!(a, b, "Fit order must not change the mapping");
    }

    #[test]
    fn test_sentinel_sorts_among_real_labels() {
        let encoding = LabelEncoding::fit(["CU", "FC", "FF", "FS", NO_PITCH, "SI", "SL", "ST"]);
        // 'N' sorts between 'F' and 'S', so the sentinel lands at code 4.
        assert_eq!(encoding.encode(NO_PITCH), Some(4));
        assert_eq!(encoding.decode(4), Some(NO_PITCH));
    }

    #[test]
    fn test_unknown_label_and_code() {
        let encoding = LabelEncoding::fit(["FF", "SL"]);
        assert_eq!(encoding.encode("KN"), None);
        assert_eq!(encoding.decode(99), None);
    }

    #[test]
    fn test_roundtrip_through_serde() {
        let encoding = LabelEncoding::fit(["FF", "SL", "CH"]);
        let json = serde_json::to_string(&encoding).expect("serialize");
        let back: LabelEncoding = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, encoding);
        assert_eq!(back.encode("SL"), Some(2));
    }
}
