//! PHAROS source adapter
//!
//! Turns rows from the three PHAROS target exports into subject/object
//! [`FlatRecord`] pairs:
//!
//! - **gene → disease**: the gene is the subject, the disease the object,
//!   related by `WD:P2293`
//! - **gene → drug activity**: the drug is the subject, the gene the object
//! - **gene → compound activity**: the gene is the subject, the compound the
//!   object
//!
//! Drug and compound identifiers are built from their ChEMBL or Guide to
//! Pharmacology code. Relations, publications and affinity come from the
//! [`EdgePropertyResolver`].
//!
//! Exports are tab-delimited with a header row. Database nulls may appear as
//! empty fields, `NULL` or `\N`.

use std::fmt;
use std::str::FromStr;

use kgx_common::{KgxError, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::LoaderConfig;
use crate::edge_props::{EdgePropertyResolver, RawEdgeAttributes};
use crate::group_key::GroupKeyAssigner;
use crate::model::{EdgeFields, EntityFields, FlatRecord, RowOutcome};
use crate::normalize::IdentifierNormalizer;

/// Biolink predicate for gene → disease edges
pub const GENE_DISEASE_PREDICATE: &str = "biolink:gene_associated_with_condition";
/// Relation for gene → disease edges
pub const GENE_DISEASE_RELATION: &str = "WD:P2293";
/// Edge label for gene → disease edges
pub const GENE_DISEASE_LABEL: &str = "gene_associated_with_condition";

/// The PHAROS exports this adapter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PharosDataset {
    GeneToDisease,
    GeneToDrugActivity,
    GeneToCompoundActivity,
}

impl PharosDataset {
    pub const ALL: [PharosDataset; 3] = [
        PharosDataset::GeneToDisease,
        PharosDataset::GeneToDrugActivity,
        PharosDataset::GeneToCompoundActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PharosDataset::GeneToDisease => "gene_to_disease",
            PharosDataset::GeneToDrugActivity => "gene_to_drug_activity",
            PharosDataset::GeneToCompoundActivity => "gene_to_compound_activity",
        }
    }
}

impl fmt::Display for PharosDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PharosDataset {
    type Err = KgxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        PharosDataset::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| KgxError::config(format!("Unknown PHAROS dataset: {}", s)))
    }
}

/// One row of the gene → disease export
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneDiseaseRow {
    /// Gene identifier
    #[serde(default, deserialize_with = "nullable")]
    pub value: Option<String>,

    /// Raw disease identifier (UMLS code, `Orphanet:` id, ...)
    #[serde(default, deserialize_with = "nullable")]
    pub did: Option<String>,

    /// Disease name
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<String>,

    /// Gene symbol
    #[serde(default, deserialize_with = "nullable")]
    pub sym: Option<String>,

    /// Association data source, used as provenance
    #[serde(default, deserialize_with = "nullable")]
    pub dtype: Option<String>,
}

/// One row of a drug or compound activity export
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActivityRow {
    #[serde(default, deserialize_with = "nullable")]
    pub value: Option<String>,

    /// Drug or compound name
    #[serde(default, deserialize_with = "nullable")]
    pub drug: Option<String>,

    /// Raw compound code
    #[serde(default, deserialize_with = "nullable")]
    pub cid: Option<String>,

    /// Source database of `cid`, e.g. `ChEMBL`
    #[serde(default, deserialize_with = "nullable")]
    pub id_src: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub sym: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub affinity: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub affinity_parameter: Option<String>,

    /// Free-text action type
    #[serde(default, deserialize_with = "nullable")]
    pub pred: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub pubmed_ids: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub dtype: Option<String>,
}

impl ActivityRow {
    fn edge_attributes(&self) -> RawEdgeAttributes {
        RawEdgeAttributes {
            predicate: self.pred.clone(),
            provenance: self.dtype.clone(),
            pubmed_ids: self.pubmed_ids.clone(),
            affinity: self.affinity.clone(),
            affinity_parameter: self.affinity_parameter.clone(),
        }
    }
}

fn nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| {
        let v = v.trim();
        !(v.is_empty() || v == "NULL" || v == "\\N")
    }))
}

/// Converts PHAROS rows into keyed flat records
#[derive(Debug)]
pub struct PharosAdapter {
    normalizer: IdentifierNormalizer,
    resolver: EdgePropertyResolver,
    disease_keys: GroupKeyAssigner,
    drug_keys: GroupKeyAssigner,
    compound_keys: GroupKeyAssigner,
}

impl PharosAdapter {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        Ok(Self {
            normalizer: IdentifierNormalizer::new()?,
            resolver: EdgePropertyResolver::from_config(config)?,
            disease_keys: GroupKeyAssigner::new(PharosDataset::GeneToDisease.as_str()),
            drug_keys: GroupKeyAssigner::new(PharosDataset::GeneToDrugActivity.as_str()),
            compound_keys: GroupKeyAssigner::new(PharosDataset::GeneToCompoundActivity.as_str()),
        })
    }

    /// Gene (subject) associated with a disease (object)
    pub fn gene_to_disease(&mut self, row: &GeneDiseaseRow) -> Result<RowOutcome> {
        let Some(gene) = row.value.as_deref() else {
            return Ok(RowOutcome::SkippedMissingField { field: "value" });
        };
        let Some(did) = row.did.as_deref() else {
            return Ok(RowOutcome::SkippedMissingField { field: "did" });
        };

        let disease_id = self.normalizer.normalize(did);
        if disease_id == gene {
            return Ok(RowOutcome::SuspiciousSameId { id: disease_id });
        }

        let resolved = self.resolver.resolve(&RawEdgeAttributes {
            provenance: row.dtype.clone(),
            ..Default::default()
        })?;

        let key = self.disease_keys.assign(gene, GENE_DISEASE_RELATION, &disease_id);
        let edge = EdgeFields {
            predicate: Some(GENE_DISEASE_PREDICATE.to_string()),
            relation: GENE_DISEASE_RELATION.to_string(),
            edge_label: Some(GENE_DISEASE_LABEL.to_string()),
            properties: resolved.properties,
            provenance: resolved.provenance,
        };

        Ok(RowOutcome::Emitted(vec![
            FlatRecord::subject(key.clone(), EntityFields::new(gene, row.sym.clone())),
            FlatRecord::object(key, 2, EntityFields::new(disease_id, row.name.clone()), edge),
        ]))
    }

    /// Drug (subject) acting on a gene product (object)
    pub fn gene_to_drug_activity(&mut self, row: &ActivityRow) -> Result<RowOutcome> {
        let (gene, compound_id) = match self.activity_ids(row)? {
            Ok(ids) => ids,
            Err(outcome) => return Ok(outcome),
        };

        let resolved = self.resolver.resolve(&row.edge_attributes())?;
        let key = self.drug_keys.assign(&compound_id, &resolved.relation, &gene);

        Ok(RowOutcome::Emitted(vec![
            FlatRecord::subject(key.clone(), EntityFields::new(compound_id, row.drug.clone())),
            FlatRecord::object(
                key,
                2,
                EntityFields::new(gene, row.sym.clone()),
                activity_edge(resolved.relation, resolved.properties, resolved.provenance),
            ),
        ]))
    }

    /// Gene product (subject) bound by a compound (object)
    pub fn gene_to_compound_activity(&mut self, row: &ActivityRow) -> Result<RowOutcome> {
        let (gene, compound_id) = match self.activity_ids(row)? {
            Ok(ids) => ids,
            Err(outcome) => return Ok(outcome),
        };

        let resolved = self.resolver.resolve(&row.edge_attributes())?;
        let key = self.compound_keys.assign(&gene, &resolved.relation, &compound_id);

        Ok(RowOutcome::Emitted(vec![
            FlatRecord::subject(key.clone(), EntityFields::new(gene, row.sym.clone())),
            FlatRecord::object(
                key,
                2,
                EntityFields::new(compound_id, row.drug.clone()),
                activity_edge(resolved.relation, resolved.properties, resolved.provenance),
            ),
        ]))
    }

    /// Gene id and normalized compound id, or the outcome that drops the row.
    ///
    /// The outer error is fatal (unknown source tag).
    fn activity_ids(&self, row: &ActivityRow) -> Result<std::result::Result<(String, String), RowOutcome>> {
        let Some(gene) = row.value.as_deref() else {
            return Ok(Err(RowOutcome::SkippedMissingField { field: "value" }));
        };
        let Some(cid) = row.cid.as_deref() else {
            return Ok(Err(RowOutcome::SkippedMissingField { field: "cid" }));
        };
        let Some(id_src) = row.id_src.as_deref() else {
            return Ok(Err(RowOutcome::SkippedMissingField { field: "id_src" }));
        };

        let compound_id = self.normalizer.normalize_with_source(cid, Some(id_src))?;
        if compound_id == gene {
            return Ok(Err(RowOutcome::SuspiciousSameId { id: compound_id }));
        }

        Ok(Ok((gene.to_string(), compound_id)))
    }
}

fn activity_edge(
    relation: String,
    properties: kgx_common::EdgeProperties,
    provenance: Option<String>,
) -> EdgeFields {
    EdgeFields {
        predicate: None,
        relation,
        edge_label: None,
        properties,
        provenance,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn adapter() -> PharosAdapter {
        PharosAdapter::new(&LoaderConfig::default()).unwrap()
    }

    fn emitted(outcome: RowOutcome) -> Vec<FlatRecord> {
        match outcome {
            RowOutcome::Emitted(records) => records,
            other => panic!("expected emitted rows, got {:?}", other),
        }
    }

    fn disease_row(gene: &str, did: Option<&str>) -> GeneDiseaseRow {
        GeneDiseaseRow {
            value: Some(gene.to_string()),
            did: did.map(str::to_string),
            name: Some("Breast Cancer".to_string()),
            sym: Some("BRCA1".to_string()),
            dtype: Some("CTD".to_string()),
        }
    }

    fn activity_row(id_src: &str) -> ActivityRow {
        ActivityRow {
            value: Some("HGNC:9604".to_string()),
            drug: Some("aspirin".to_string()),
            cid: Some("CHEMBL25".to_string()),
            id_src: Some(id_src.to_string()),
            sym: Some("PTGS1".to_string()),
            affinity: Some("5.2".to_string()),
            affinity_parameter: Some("pIC50".to_string()),
            pred: Some("Inhibitor".to_string()),
            pubmed_ids: Some("111|222".to_string()),
            dtype: Some("ChEMBL".to_string()),
        }
    }

    #[test]
    fn test_gene_to_disease_pair() {
        let records = emitted(adapter().gene_to_disease(&disease_row("HGNC:777", Some("C009"))).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].group_key(), records[1].group_key());
        assert_eq!(records[0].entity().id, "HGNC:777");
        assert_eq!(records[1].entity().id, "UMLS:C009");

        let FlatRecord::Object { edge, .. } = &records[1] else {
            panic!("expected object row");
        };
        assert_eq!(edge.relation, GENE_DISEASE_RELATION);
        assert_eq!(edge.predicate.as_deref(), Some(GENE_DISEASE_PREDICATE));
        assert_eq!(edge.provenance.as_deref(), Some("CTD"));
        assert!(edge.properties.publications.is_empty());
    }

    #[test]
    fn test_gene_to_disease_orphanet() {
        let records = emitted(
            adapter()
                .gene_to_disease(&disease_row("HGNC:1", Some("Orphanet:558")))
                .unwrap(),
        );
        assert_eq!(records[1].entity().id, "ORPHANET:558");
    }

    #[test]
    fn test_missing_disease_id_is_skipped() {
        let outcome = adapter().gene_to_disease(&disease_row("HGNC:1", None)).unwrap();
        assert_eq!(outcome, RowOutcome::SkippedMissingField { field: "did" });
    }

    #[test]
    fn test_same_id_is_suspicious() {
        let outcome = adapter().gene_to_disease(&disease_row("HGNC:1", Some("HGNC:1"))).unwrap();
        assert_eq!(outcome, RowOutcome::SuspiciousSameId { id: "HGNC:1".to_string() });
    }

    #[test]
    fn test_drug_activity_orientation() {
        let records = emitted(adapter().gene_to_drug_activity(&activity_row("ChEMBL")).unwrap());
        assert!(records[0].is_subject());
        assert_eq!(records[0].entity().id, "CHEMBL.COMPOUND:CHEMBL25");
        assert_eq!(records[1].entity().id, "HGNC:9604");

        let FlatRecord::Object { edge, .. } = &records[1] else {
            panic!("expected object row");
        };
        assert_eq!(edge.relation, "GAMMA:inhibitor");
        assert_eq!(edge.properties.publications, vec!["PMID:111", "PMID:222"]);
        assert_eq!(edge.properties.affinity, 5.2);
        assert_eq!(edge.predicate, None);
    }

    #[test]
    fn test_compound_activity_orientation() {
        let mut row = activity_row("Guide to Pharmacology");
        row.cid = Some("1234".to_string());
        let records = emitted(adapter().gene_to_compound_activity(&row).unwrap());
        assert_eq!(records[0].entity().id, "HGNC:9604");
        assert_eq!(records[1].entity().id, "GTOPDB:1234");
    }

    #[test]
    fn test_unknown_source_tag_aborts() {
        let err = adapter().gene_to_drug_activity(&activity_row("DrugBank")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_repeated_measurements_get_distinct_groups() {
        let mut adapter = adapter();
        let first = emitted(adapter.gene_to_drug_activity(&activity_row("ChEMBL")).unwrap());
        let second = emitted(adapter.gene_to_drug_activity(&activity_row("ChEMBL")).unwrap());
        assert_ne!(first[0].group_key(), second[0].group_key());
    }

    #[test]
    fn test_dataset_names() {
        for dataset in PharosDataset::ALL {
            assert_eq!(dataset.as_str().parse::<PharosDataset>().unwrap(), dataset);
        }
    }
}
