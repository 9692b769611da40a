//! Provider recommendations for third-party imports
//!
//! A [`ProviderMapping`] maps a package name to the Airflow provider
//! distribution that wraps the same external system. The built-in table is
//! parsed once per process and never mutated; project config can layer a
//! mapping file and inline overrides on top of it.

use crate::config::EngineConfig;
use crate::error::{PrognosisError, Result};
use crate::models::{Finding, FindingKind, ImportSummary, Recommendation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const BUILTIN_MAPPINGS: &str = include_str!("../data/provider_mappings.toml");

static BUILTIN: OnceLock<ProviderMapping> = OnceLock::new();

/// Read-only `package -> provider` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderMapping {
    entries: BTreeMap<String, String>,
}

impl ProviderMapping {
    /// The table shipped with the crate
    pub fn builtin() -> &'static ProviderMapping {
        BUILTIN.get_or_init(|| match Self::from_toml_str(BUILTIN_MAPPINGS) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!("Failed to parse built-in provider mappings: {}", e);
                ProviderMapping::default()
            }
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PrognosisError::ProviderMapping(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| PrognosisError::ProviderMapping(e.to_string()))
    }

    /// Load a mapping file; `.json` is JSON, anything else TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PrognosisError::ProviderMapping(format!("{}: {}", path.display(), e))
        })?;
        let mapping = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        debug!(
            "Loaded {} provider mappings from {}",
            mapping.len(),
            path.display()
        );
        Ok(mapping)
    }

    /// Mapping for a project: the configured mapping file (or the built-in
    /// table) with `[providers.overrides]` merged on top
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let base = match config.mapping_file() {
            Some(path) => Self::load(&path)?,
            None => Self::builtin().clone(),
        };
        Ok(base.with_overrides(&config.providers.overrides))
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (package, provider) in overrides {
            self.entries.insert(package.clone(), provider.clone());
        }
        self
    }

    /// Provider for a package, trying the full dotted name then each
    /// shorter prefix (`google.cloud.storage`, `google.cloud`, `google`)
    pub fn lookup(&self, package: &str) -> Option<&str> {
        let mut candidate = package;
        loop {
            if let Some(provider) = self.entries.get(candidate) {
                return Some(provider.as_str());
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return None,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct ProviderRecommender<'a> {
    mapping: &'a ProviderMapping,
}

impl<'a> ProviderRecommender<'a> {
    pub fn new(mapping: &'a ProviderMapping) -> Self {
        Self { mapping }
    }

    /// One recommendation per distinct third-party import with a known
    /// provider, in discovery order. Unmapped packages are skipped.
    pub fn recommend(&self, imports: &ImportSummary) -> Vec<Recommendation> {
        let mut seen = HashSet::new();
        let recommendations: Vec<Recommendation> = imports
            .third_party_records()
            .filter_map(|record| {
                let provider = self.mapping.lookup(&record.qualified_name)?;
                Some(Recommendation {
                    package: record.qualified_name.clone(),
                    recommended_provider: provider.to_string(),
                })
            })
            .filter(|rec| seen.insert(rec.package.clone()))
            .collect();

        info!(
            "ProviderRecommender matched {} of {} third-party imports",
            recommendations.len(),
            imports.third_party.len()
        );
        recommendations
    }

    /// `MissingProviderPackage` findings, located at the import line
    pub fn findings(&self, imports: &ImportSummary, recommendations: &[Recommendation]) -> Vec<Finding> {
        recommendations
            .iter()
            .map(|rec| {
                let message = format!(
                    "Consider using {} instead of {}",
                    rec.recommended_provider, rec.package
                );
                let mut finding = Finding::new(FindingKind::MissingProviderPackage, message.clone())
                    .with_recommendation(message)
                    .with_meta("package", rec.package.as_str())
                    .with_meta("provider", rec.recommended_provider.as_str());
                if let Some(record) = imports.get(&rec.package) {
                    finding = finding.at_line(record.source_line);
                }
                finding
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImportCategory, ImportRecord};

    fn summary(names: &[(&str, ImportCategory)]) -> ImportSummary {
        let mut imports = ImportSummary::default();
        for (i, (name, category)) in names.iter().enumerate() {
            let bucket = match category {
                ImportCategory::Stdlib => &mut imports.stdlib,
                ImportCategory::Trusted => &mut imports.trusted,
                ImportCategory::ThirdParty => &mut imports.third_party,
            };
            bucket.insert(name.to_string());
            imports.records.push(ImportRecord {
                qualified_name: name.to_string(),
                category: *category,
                is_top_level: true,
                source_line: i + 1,
            });
        }
        imports
    }

    #[test]
    fn test_builtin_mapping() {
        let mapping = ProviderMapping::builtin();
        assert!(!mapping.is_empty());
        assert_eq!(
            mapping.lookup("boto3"),
            Some("apache-airflow-providers-amazon")
        );
        assert_eq!(mapping.lookup("pandas"), None);
    }

    #[test]
    fn test_lookup_by_prefix() {
        let mapping = ProviderMapping::builtin();
        assert_eq!(
            mapping.lookup("google.cloud.storage"),
            Some("apache-airflow-providers-google")
        );
        assert_eq!(mapping.lookup("google.protobuf"), None);
    }

    #[test]
    fn test_recommend_only_mapped_third_party() {
        let imports = summary(&[
            ("pandas", ImportCategory::ThirdParty),
            ("boto3", ImportCategory::ThirdParty),
            ("json", ImportCategory::Stdlib),
            ("airflow.providers.amazon", ImportCategory::Trusted),
        ]);
        let mapping = ProviderMapping::builtin();
        let recommender = ProviderRecommender::new(mapping);
        let recs = recommender.recommend(&imports);
        assert_eq!(
            recs,
            vec![Recommendation {
                package: "boto3".to_string(),
                recommended_provider: "apache-airflow-providers-amazon".to_string(),
            }]
        );

        let findings = recommender.findings(&imports, &recs);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MissingProviderPackage);
        assert_eq!(findings[0].line, Some(2));
        assert_eq!(
            findings[0].recommendation.as_deref(),
            Some("Consider using apache-airflow-providers-amazon instead of boto3")
        );
    }

    #[test]
    fn test_overrides_and_formats() {
        let mapping = ProviderMapping::from_json_str(r#"{"pandas": "custom-provider"}"#)
            .unwrap()
            .with_overrides(&BTreeMap::from([(
                "boto3".to_string(),
                "internal-aws".to_string(),
            )]));
        assert_eq!(mapping.lookup("pandas"), Some("custom-provider"));
        assert_eq!(mapping.lookup("boto3"), Some("internal-aws"));
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_malformed_mapping_is_error() {
        let err = ProviderMapping::from_toml_str("boto3 = [1, 2]").unwrap_err();
        assert!(matches!(err, PrognosisError::ProviderMapping(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ProviderMapping::load(&path),
            Err(PrognosisError::ProviderMapping(_))
        ));
    }

    #[test]
    fn test_from_config_uses_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("providers.toml"), "pandas = \"pandas-provider\"\n").unwrap();
        let config_path = dir.path().join("dag-prognosis.toml");
        std::fs::write(
            &config_path,
            "[providers]\nmapping_file = \"providers.toml\"\n\n[providers.overrides]\nnumpy = \"np-provider\"\n",
        )
        .unwrap();

        let config = crate::config::load_config_file(&config_path).unwrap();
        let mapping = ProviderMapping::from_config(&config).unwrap();
        assert_eq!(mapping.lookup("pandas"), Some("pandas-provider"));
        assert_eq!(mapping.lookup("numpy"), Some("np-provider"));
        assert_eq!(mapping.lookup("boto3"), None);
    }
}
