use std::path::Path;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use crate::common::ObservationItem;

/// Display metadata for one detectable class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionClassInfo {
    pub identifier: String,
    #[serde(rename = "name", default)]
    name: Option<String>,
    #[serde(rename = "alternativeNames", default)]
    pub alternative_names: Vec<String>,
    #[serde(rename = "origin", default)]
    pub origin_countries: Vec<String>,
    #[serde(rename = "url", default)]
    pub info_url: Option<String>,
    #[serde(rename = "licence", default)]
    pub licence_info: Option<String>,
}

impl DetectionClassInfo {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: None,
            alternative_names: vec![],
            origin_countries: vec![],
            info_url: None,
            licence_info: None,
        }
    }

    /// The display name, falling back to the identifier.
    pub fn primary_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Class metadata ordered by the network's class index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassCatalog {
    classes: Vec<DetectionClassInfo>,
}

impl ClassCatalog {
    pub fn new(classes: Vec<DetectionClassInfo>) -> Self {
        Self { classes }
    }

    /// Parses a JSON array of class entries.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let classes: Vec<DetectionClassInfo> = serde_json::from_str(json)
            .context("Failed to parse class metadata")?;
        Ok(Self::new(classes))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class metadata from {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Bounds checked lookup of a class index coming out of the decoder.
    pub fn get(&self, class_index: usize) -> Option<&DetectionClassInfo> {
        self.classes.get(class_index)
    }

    pub fn label_for(&self, item: &ObservationItem) -> String {
        self.get(item.class_index)
            .map(|info| info.primary_name().to_string())
            .unwrap_or("Unknown".to_string())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
