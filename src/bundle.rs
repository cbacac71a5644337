// 📦 Site bundle I/O - locate, back up and re-embed the athlete data block
//
// The generated site bundle carries the canonical athlete array inline,
// between two textual markers. Everything outside the block is left
// byte-identical when the block is replaced.

use crate::error::{ReconcileError, Result};
use crate::model::{parse_canonical, parse_incoming, Athlete, RawAthlete};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// MARKERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMarkers {
    /// Text introducing the block; a trailing `[` belongs to the data
    #[serde(default = "default_start_marker")]
    pub start_marker: String,

    /// Text right after the block, searched after the start marker
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
}

fn default_start_marker() -> String {
    "ma=[".to_string()
}

fn default_end_marker() -> String {
    ",Ko=()=>".to_string()
}

impl Default for BundleMarkers {
    fn default() -> Self {
        BundleMarkers {
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
        }
    }
}

// ============================================================================
// BUNDLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Bundle {
    text: String,
    /// Byte offset where the data block starts
    data_start: usize,
    /// Byte offset of the end marker
    data_end: usize,
}

impl Bundle {
    pub fn locate(text: String, markers: &BundleMarkers) -> Result<Self> {
        let start = text
            .find(&markers.start_marker)
            .ok_or_else(|| ReconcileError::MarkerNotFound {
                marker: markers.start_marker.clone(),
            })?;

        let prefix_len = if markers.start_marker.ends_with('[') {
            markers.start_marker.len() - 1
        } else {
            markers.start_marker.len()
        };
        let data_start = start + prefix_len;

        let data_end = text[data_start..]
            .find(&markers.end_marker)
            .map(|offset| data_start + offset)
            .ok_or_else(|| ReconcileError::MarkerNotFound {
                marker: markers.end_marker.clone(),
            })?;

        Ok(Bundle {
            text,
            data_start,
            data_end,
        })
    }

    pub fn data(&self) -> &str {
        &self.text[self.data_start..self.data_end]
    }

    /// Parse the data block as the canonical athlete set
    pub fn athletes(&self) -> Result<Vec<Athlete>> {
        let value: serde_json::Value = serde_json::from_str(self.data())?;
        parse_canonical(value)
    }

    /// Full bundle text with the data block replaced
    ///
    /// An athlete still equal to what was loaded is written back as its exact
    /// source text; only changed or new athletes are re-serialized.
    pub fn splice(&self, athletes: &[Athlete]) -> Result<String> {
        let originals = self.originals();

        let mut block = String::from("[");
        for (i, athlete) in athletes.iter().enumerate() {
            if i > 0 {
                block.push(',');
            }
            match originals.get(athlete.fis_code.as_str()) {
                Some((loaded, source)) if loaded == athlete => block.push_str(source.get()),
                _ => block.push_str(&serde_json::to_string(athlete)?),
            }
        }
        block.push(']');

        let mut out =
            String::with_capacity(self.text.len() - (self.data_end - self.data_start) + block.len());
        out.push_str(&self.text[..self.data_start]);
        out.push_str(&block);
        out.push_str(&self.text[self.data_end..]);
        Ok(out)
    }

    /// Loaded athletes by code next to their source text; first record wins
    fn originals(&self) -> HashMap<String, (Athlete, &RawValue)> {
        let items: Vec<&RawValue> = serde_json::from_str(self.data()).unwrap_or_default();

        let mut originals = HashMap::with_capacity(items.len());
        for source in items {
            if let Ok(athlete) = serde_json::from_str::<Athlete>(source.get()) {
                originals
                    .entry(athlete.fis_code.clone())
                    .or_insert((athlete, source));
            }
        }
        originals
    }
}

// ============================================================================
// FILE HELPERS
// ============================================================================

pub fn read_bundle<P: AsRef<Path>>(path: P, markers: &BundleMarkers) -> anyhow::Result<Bundle> {
    let text = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read bundle: {:?}", path.as_ref()))?;
    let bundle = Bundle::locate(text, markers)
        .with_context(|| format!("Cannot locate data block in {:?}", path.as_ref()))?;
    Ok(bundle)
}

/// Copy the target to `<target>.bak_<unix millis>` and return the backup path
pub fn backup<P: AsRef<Path>>(path: P) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    let backup_path = PathBuf::from(format!(
        "{}.bak_{}",
        path.display(),
        Utc::now().timestamp_millis()
    ));
    fs::copy(path, &backup_path)
        .with_context(|| format!("Failed to back up {:?} to {:?}", path, backup_path))?;
    Ok(backup_path)
}

pub fn write_bundle<P: AsRef<Path>>(path: P, text: &str) -> anyhow::Result<()> {
    fs::write(path.as_ref(), text)
        .with_context(|| format!("Failed to write bundle: {:?}", path.as_ref()))
}

/// Load an incoming batch file (`{"athletes": [...]}` or a bare array)
pub fn load_incoming<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<RawAthlete>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read incoming batch: {:?}", path.as_ref()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("Failed to parse incoming batch JSON")?;
    let athletes = parse_incoming(value)
        .with_context(|| format!("Invalid incoming batch: {:?}", path.as_ref()))?;
    Ok(athletes)
}

// ============================================================================
// TESTS
// ============================================================================
