//! Shared JSON fixtures for character animation tests.
//!
//! Fixtures live under the workspace `fixtures/` directory and are addressed
//! by name through `fixtures/manifest.json`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

/// Fixture name -> path relative to `fixtures/`, per document kind.
#[derive(Debug, Deserialize)]
struct Manifest {
    sequences: BTreeMap<String, String>,
    characters: BTreeMap<String, String>,
}

#[derive(Clone, Copy)]
enum Kind {
    Sequence,
    Character,
}

impl Kind {
    fn entries(self) -> &'static BTreeMap<String, String> {
        match self {
            Kind::Sequence => &MANIFEST.sequences,
            Kind::Character => &MANIFEST.characters,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kind::Sequence => "sequence",
            Kind::Character => "character",
        }
    }

    /// Raw text of fixture `name`.
    fn text(self, name: &str) -> Result<String> {
        let rel = self
            .entries()
            .get(name)
            .with_context(|| format!("no {} fixture named '{name}'", self.label()))?;
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(rel);
        std::fs::read_to_string(&path)
            .with_context(|| format!("reading {} fixture {}", self.label(), path.display()))
    }
}

/// Sequence documents (track arrays plus an optional initial pose).
pub mod sequences {
    use super::*;

    pub fn json(name: &str) -> Result<String> {
        Kind::Sequence.text(name)
    }
}

/// Character definitions (image URIs and height).
pub mod characters {
    use super::*;

    /// Fixture names in sorted order.
    pub fn keys() -> Vec<String> {
        Kind::Character.entries().keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        Kind::Character.text(name)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let text = json(name)?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing character fixture '{name}'"))
    }
}
