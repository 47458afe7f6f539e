//! Identifier normalization
//!
//! Rewrites raw external identifiers into canonical CURIEs. Rules are applied
//! in order and the first match wins:
//!
//! 1. bare UMLS concept ids (`C` followed only by digits) gain a `UMLS:` prefix
//! 2. `Orphanet:` is rewritten to `ORPHANET:`
//! 3. compound ids with a known source tag get the source prefix, with any
//!    redundant embedded source token stripped from the code
//! 4. anything else passes through unchanged
//!
//! A raw identifier is never rejected. An unknown source tag is a
//! configuration error because the prefix table is closed.

use kgx_common::{KgxError, Result};
use regex::Regex;
use std::str::FromStr;

const UMLS_PREFIX: &str = "UMLS:";
const ORPHANET_RAW_PREFIX: &str = "Orphanet:";
const ORPHANET_PREFIX: &str = "ORPHANET:";

/// Source databases whose compound codes need a prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
    Chembl,
    GuideToPharmacology,
}

impl SourceTag {
    /// CURIE prefix prepended to the cleaned code
    pub fn prefix(&self) -> &'static str {
        match self {
            SourceTag::Chembl => "CHEMBL.COMPOUND:CHEMBL",
            SourceTag::GuideToPharmacology => "GTOPDB:",
        }
    }

    /// Token some sources repeat inside the raw code (e.g. `CHEMBL25`)
    pub fn embedded_token(&self) -> &'static str {
        match self {
            SourceTag::Chembl => "CHEMBL",
            SourceTag::GuideToPharmacology => "GTOPDB",
        }
    }
}

impl FromStr for SourceTag {
    type Err = KgxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "ChEMBL" => Ok(SourceTag::Chembl),
            "Guide to Pharmacology" => Ok(SourceTag::GuideToPharmacology),
            other => Err(KgxError::UnknownSourceTag(other.to_string())),
        }
    }
}

/// Rewrites raw identifiers into CURIEs
#[derive(Debug, Clone)]
pub struct IdentifierNormalizer {
    umls_pattern: Regex,
}

impl IdentifierNormalizer {
    pub fn new() -> Result<Self> {
        let umls_pattern = Regex::new(r"^C[0-9]+$")
            .map_err(|e| KgxError::config(format!("invalid UMLS pattern: {}", e)))?;
        Ok(Self { umls_pattern })
    }

    /// Normalize an entity identifier that carries no source tag.
    ///
    /// Infallible: rules 1, 2 and passthrough only. Already-normalized ids are
    /// returned unchanged, so this is safe to apply twice.
    pub fn normalize(&self, raw: &str) -> String {
        if self.umls_pattern.is_match(raw) {
            return format!("{}{}", UMLS_PREFIX, raw);
        }

        if let Some(code) = raw.strip_prefix(ORPHANET_RAW_PREFIX) {
            return format!("{}{}", ORPHANET_PREFIX, code);
        }

        raw.to_string()
    }

    /// Normalize an identifier, applying the compound rule when a source tag
    /// is supplied.
    ///
    /// Fails only when `source_tag` is not in the prefix table.
    pub fn normalize_with_source(&self, raw: &str, source_tag: Option<&str>) -> Result<String> {
        if self.umls_pattern.is_match(raw) || raw.starts_with(ORPHANET_RAW_PREFIX) {
            return Ok(self.normalize(raw));
        }

        match source_tag {
            Some(tag) => {
                let tag: SourceTag = tag.parse()?;
                Ok(Self::compound_curie(tag, raw))
            },
            None => Ok(raw.to_string()),
        }
    }

    /// Build a compound CURIE from a known source tag and raw code
    pub fn compound_curie(tag: SourceTag, raw_code: &str) -> String {
        let code = raw_code.trim().replace(tag.embedded_token(), "");
        format!("{}{}", tag.prefix(), code)
    }
}
