#[cfg(test)]
pub mod test {
    use std::cell::Cell;

    use crate::inherit::DocumentStore;
    use crate::types::{Document, DocumentMap, Section};

    /// Build a section from scalar entries, keeping duplicates.
    pub fn section(entries: &[(&str, &str)]) -> Section {
        entries.iter().copied().collect()
    }

    pub fn document(sections: &[(&str, Section)]) -> Document {
        sections
            .iter()
            .map(|(name, section)| (name.to_string(), section.clone()))
            .collect()
    }

    pub fn documents(docs: &[(&str, Document)]) -> DocumentMap {
        docs.iter()
            .map(|(name, doc)| (name.to_string(), doc.clone()))
            .collect()
    }

    // -- Store that counts document lookups ------------------------------------

    /// Wraps a [`DocumentMap`] and counts how often a section's document is
    /// looked up, so memoization can be observed.
    pub struct CountingStore {
        inner: DocumentMap,
        lookups: Cell<usize>,
    }

    impl CountingStore {
        pub fn new(inner: DocumentMap) -> Self {
            Self {
                inner,
                lookups: Cell::new(0),
            }
        }

        pub fn lookups(&self) -> usize {
            self.lookups.get()
        }
    }

    impl DocumentStore for CountingStore {
        fn document(&self, name: &str) -> Option<&Document> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.document(name)
        }

        fn document_names(&self) -> Vec<String> {
            self.inner.document_names()
        }
    }

    #[test]
    fn section_keeps_duplicates_in_order() {
        let s = section(&[("K", "1"), ("K", "2")]);
        let keys: Vec<&str> = s.keys().collect();
        assert_eq!(keys, vec!["K", "K"]);
    }

    #[test]
    fn counting_store_counts_lookups() {
        let store = CountingStore::new(documents(&[(
            "a.ini",
            document(&[("S", section(&[("k", "v")]))]),
        )]));
        assert!(store.document("a.ini").is_some());
        assert!(store.document("missing.ini").is_none());
        assert_eq!(store.lookups(), 2);
    }
}
