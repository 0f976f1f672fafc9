use std::collections::BTreeSet;

/// Bijection between the distinct labels of a categorical column and the
/// integer codes `0..k`.
///
/// Codes follow the ascending lexicographic order of the labels, so the same
/// set of labels always yields the same encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryEncoding {
    labels: Vec<String>,
}

impl CategoryEncoding {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            labels: distinct.into_iter().collect(),
        }
    }

    /// Builds the encoding for `labels` and returns the code of every label,
    /// in input order.
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> (Self, Vec<usize>) {
        let encoding = Self::from_labels(labels);
        let codes = labels
            .iter()
            .map(|label| encoding.position(label.as_ref()))
            .collect();
        (encoding, codes)
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(code, label)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.labels.iter().map(String::as_str).enumerate()
    }

    // Labels passed here always come from the set the encoding was built on.
    fn position(&self, label: &str) -> usize {
        self.labels
            .binary_search_by(|known| known.as_str().cmp(label))
            .unwrap_or_else(|insert_at| insert_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_labels() {
        let encoding = CategoryEncoding::from_labels(["Low", "High", "Medium", "Low"]);
        assert_eq!(encoding.labels(), &["High", "Low", "Medium"]);
        assert_eq!(encoding.encode("High"), Some(0));
        assert_eq!(encoding.encode("Low"), Some(1));
        assert_eq!(encoding.encode("Medium"), Some(2));
        assert_eq!(encoding.encode("Extreme"), None);
        assert_eq!(encoding.decode(3), None);
    }

    #[test]
    fn test_round_trip() {
        let labels = ["Severe", "low", "High", "Low", "high", "Severe"];
        let encoding = CategoryEncoding::from_labels(labels);
        for label in labels {
            let code = encoding.encode(label).unwrap();
            assert_eq!(encoding.decode(code), Some(label));
        }
    }

    #[test]
    fn test_stable_across_input_order() {
        let a = CategoryEncoding::from_labels(["High", "Low", "High"]);
        let b = CategoryEncoding::from_labels(["Low", "High", "Low"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_transform() {
        let (encoding, codes) = CategoryEncoding::fit_transform(&["Low", "High", "Low"]);
        assert_eq!(encoding.len(), 2);
        assert_eq!(codes, vec![1, 0, 1]);
        let pairs: Vec<_> = encoding.iter().collect();
        assert_eq!(pairs, vec![(0, "High"), (1, "Low")]);
    }

    #[test]
    fn test_single_label() {
        let (encoding, codes) = CategoryEncoding::fit_transform(&["Moderate"; 4]);
        assert_eq!(encoding.len(), 1);
        assert_eq!(codes, vec![0; 4]);
        assert_eq!(encoding.decode(0), Some("Moderate"));
    }
}
