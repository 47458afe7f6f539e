//! Group key assignment
//!
//! A group key clusters the subject row and object row(s) that together
//! describe one relationship. Keys are SHA-256 digests of the business fields,
//! so identical input always groups identically across runs.

use kgx_common::checksum::digest_str;
use kgx_common::types::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Separator between hashed fields, so `("ab", "c")` and `("a", "bc")` differ
const FIELD_SEPARATOR: &str = "\u{1f}";

/// Opaque token shared by all rows of one relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Digest of the given business fields, in order
    pub fn from_fields(fields: &[&str]) -> Self {
        let joined = fields.join(FIELD_SEPARATOR);
        Self(digest_str(&joined, ChecksumAlgorithm::Sha256))
    }

    /// Wrap a key produced elsewhere (e.g. a pre-keyed record stream)
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out group keys for one source dataset.
///
/// A source can legitimately repeat the same business triple (for instance
/// two activity measurements for one drug/target pair). Each repeat gets its
/// occurrence number mixed into the key, so pairs stay separate while the
/// assignment remains a function of the input sequence alone.
#[derive(Debug, Default)]
pub struct GroupKeyAssigner {
    dataset: String,
    occurrences: HashMap<GroupKey, u32>,
}

impl GroupKeyAssigner {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            occurrences: HashMap::new(),
        }
    }

    /// Assign the key for the next (subject, relation, object) pairing
    pub fn assign(&mut self, subject_id: &str, relation: &str, object_id: &str) -> GroupKey {
        let base = GroupKey::from_fields(&[self.dataset.as_str(), subject_id, relation, object_id]);
        let seen = self.occurrences.entry(base.clone()).or_insert(0);
        *seen += 1;

        if *seen == 1 {
            base
        } else {
            GroupKey::from_fields(&[base.as_str(), seen.to_string().as_str()])
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = GroupKey::from_fields(&["HGNC:777", "WD:P2293", "UMLS:C009"]);
        let b = GroupKey::from_fields(&["HGNC:777", "WD:P2293", "UMLS:C009"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_different_triples_differ() {
        let a = GroupKey::from_fields(&["HGNC:777", "WD:P2293", "UMLS:C009"]);
        let b = GroupKey::from_fields(&["HGNC:777", "WD:P2293", "UMLS:C010"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_boundaries_matter() {
        assert_ne!(GroupKey::from_fields(&["ab", "c"]), GroupKey::from_fields(&["a", "bc"]));
    }

    #[test]
    fn test_assigner_separates_repeats() {
        let mut assigner = GroupKeyAssigner::new("gene_to_drug_activity");
        let first = assigner.assign("CHEMBL.COMPOUND:CHEMBL25", "GAMMA:inhibitor", "HGNC:9604");
        let second = assigner.assign("CHEMBL.COMPOUND:CHEMBL25", "GAMMA:inhibitor", "HGNC:9604");
        let third = assigner.assign("CHEMBL.COMPOUND:CHEMBL25", "GAMMA:inhibitor", "HGNC:9604");
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(assigner.occurrences.len(), 1);
    }

    #[test]
    fn test_assigner_is_reproducible() {
        let run = || {
            let mut assigner = GroupKeyAssigner::new("gene_to_disease");
            vec![
                assigner.assign("HGNC:1", "WD:P2293", "UMLS:C1"),
                assigner.assign("HGNC:1", "WD:P2293", "UMLS:C1"),
                assigner.assign("HGNC:2", "WD:P2293", "UMLS:C1"),
            ]
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_dataset_scopes_keys() {
        let mut diseases = GroupKeyAssigner::new("gene_to_disease");
        let mut drugs = GroupKeyAssigner::new("gene_to_drug_activity");
        assert_ne!(diseases.assign("A", "r", "B"), drugs.assign("A", "r", "B"));
    }
}
