use std::{collections::HashSet, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const BUNDLED_CATALOG: &str = include_str!("../data/regions.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read region catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed region catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate region '{0}'")]
    DuplicateRegion(String),
    #[error("duplicate sub-region '{sub_region}' in region '{region}'")]
    DuplicateSubRegion { region: String, sub_region: String },
    #[error("duplicate ward '{ward}' in '{region}' / '{sub_region}'")]
    DuplicateWard {
        region: String,
        sub_region: String,
        ward: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Region {
    #[serde(rename = "county_code")]
    pub code: u32,
    #[serde(rename = "county_name")]
    pub name: String,
    #[serde(rename = "constituencies")]
    pub sub_regions: Vec<SubRegion>,
}

impl Region {
    pub fn sub_region(&self, name: &str) -> Option<&SubRegion> {
        self.sub_regions.iter().find(|sub| sub.name == name)
    }

    pub fn sub_region_names(&self) -> Vec<String> {
        self.sub_regions.iter().map(|sub| sub.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubRegion {
    #[serde(rename = "constituency_name")]
    pub name: String,
    pub wards: Vec<String>,
}

impl SubRegion {
    pub fn has_ward(&self, ward: &str) -> bool {
        self.wards.iter().any(|candidate| candidate == ward)
    }
}

/// Immutable lookup table. Built once and shared behind an `Arc` by whoever
/// needs it; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let regions: Vec<Region> = serde_json::from_str(raw)?;
        Self::new(regions)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            regions = catalog.regions.len(),
            "loaded region catalog"
        );
        Ok(catalog)
    }

    /// Sample hierarchy shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn new(regions: Vec<Region>) -> Result<Self, CatalogError> {
        let mut region_names = HashSet::new();
        for region in &regions {
            if !region_names.insert(region.name.as_str()) {
                return Err(CatalogError::DuplicateRegion(region.name.clone()));
            }

            let mut sub_names = HashSet::new();
            for sub in &region.sub_regions {
                if !sub_names.insert(sub.name.as_str()) {
                    return Err(CatalogError::DuplicateSubRegion {
                        region: region.name.clone(),
                        sub_region: sub.name.clone(),
                    });
                }

                let mut wards = HashSet::new();
                for ward in &sub.wards {
                    if !wards.insert(ward.as_str()) {
                        return Err(CatalogError::DuplicateWard {
                            region: region.name.clone(),
                            sub_region: sub.name.clone(),
                            ward: ward.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|region| region.name.clone()).collect()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|region| region.name == name)
    }

    pub fn sub_region(&self, region: &str, sub_region: &str) -> Option<&SubRegion> {
        self.region(region)?.sub_region(sub_region)
    }

    pub fn contains(&self, region: &str, sub_region: &str, ward: &str) -> bool {
        self.sub_region(region, sub_region)
            .is_some_and(|sub| sub.has_ward(ward))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn bundled_catalog_resolves_known_triples() {
        let catalog = RegionCatalog::bundled().expect("bundled catalog");
        assert!(catalog.contains("Nairobi", "Westlands", "Parklands"));
        assert!(catalog.contains("Lamu", "Lamu West", "Hongwe"));
        assert!(!catalog.contains("Nairobi", "Lamu West", "Hongwe"));
        assert_eq!(catalog.region("Meru").map(|r| r.code), Some(12));
    }

    #[test]
    fn rejects_duplicate_region_names() {
        let err = RegionCatalog::from_json(
            r#"[{"county_code":1,"county_name":"Mombasa","constituencies":[]},
                {"county_code":2,"county_name":"Mombasa","constituencies":[]}]"#,
        )
        .expect_err("duplicate must fail");
        assert!(matches!(err, CatalogError::DuplicateRegion(name) if name == "Mombasa"));
    }

    #[test]
    fn rejects_duplicate_wards_within_sub_region() {
        let err = RegionCatalog::from_json(
            r#"[{"county_code":1,"county_name":"Mombasa","constituencies":[
                {"constituency_name":"Nyali","wards":["Frere Town","Frere Town"]}]}]"#,
        )
        .expect_err("duplicate must fail");
        assert!(matches!(err, CatalogError::DuplicateWard { ward, .. } if ward == "Frere Town"));
    }

    #[test]
    fn same_sub_region_name_allowed_across_regions() {
        RegionCatalog::from_json(
            r#"[{"county_code":1,"county_name":"A","constituencies":[{"constituency_name":"Central","wards":["X"]}]},
                {"county_code":2,"county_name":"B","constituencies":[{"constituency_name":"Central","wards":["X"]}]}]"#,
        )
        .expect("names only need to be unique per parent");
    }

    #[test]
    fn load_reads_catalog_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(BUNDLED_CATALOG.as_bytes()).expect("write");
        let catalog = RegionCatalog::load(file.path()).expect("load");
        assert_eq!(catalog.regions().len(), 4);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RegionCatalog::load("/definitely/not/here.json").expect_err("missing");
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
