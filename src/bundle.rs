//! Bulk export bundles.
//!
//! Packs a run of rendered cards and their source records into a single
//! downloadable zip: a manifest, a `records.csv` with the union of record
//! columns, and one PNG per card.

use serde_json::json;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CardstockError;
use crate::render::Record;

const MANIFEST_ENTRY: &str = "manifest.json";
const RECORDS_ENTRY: &str = "records.csv";
pub const BUNDLE_FORMAT: &str = "cardstock-bundle-v1";

#[derive(Debug, Clone)]
pub struct BundleSummary {
    pub entry_count: usize,
}

/// Write a bundle to `out_path`. `cards` pairs a file name (placed under
/// `cards/`) with encoded PNG bytes.
pub fn write_bundle(
    out_path: &Path,
    records: &[Record],
    cards: &[(String, Vec<u8>)],
) -> Result<BundleSummary, CardstockError> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let out_file = File::create(out_path)?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "recordCount": records.len(),
        "cardCount": cards.len(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .map_err(|e| bundle_err("manifest entry", e))?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    zip.start_file(RECORDS_ENTRY, opts)
        .map_err(|e| bundle_err("records entry", e))?;
    zip.write_all(&records_csv(records)?)?;

    for (name, png) in cards {
        zip.start_file(format!("cards/{name}"), opts)
            .map_err(|e| bundle_err("card entry", e))?;
        zip.write_all(png)?;
    }

    zip.finish().map_err(|e| bundle_err("finalize", e))?;
    Ok(BundleSummary {
        entry_count: 2 + cards.len(),
    })
}

fn bundle_err(stage: &str, e: zip::result::ZipError) -> CardstockError {
    CardstockError::Export(format!("bundle {stage} failed: {e}"))
}

/// Records as CSV: `type` first, then the union of all field names in
/// sorted order; missing values are empty cells.
fn records_csv(records: &[Record]) -> Result<Vec<u8>, CardstockError> {
    let mut columns: BTreeSet<String> = BTreeSet::new();
    for record in records {
        columns.extend(record.field_names().map(str::to_string));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["type".to_string()];
    header.extend(columns.iter().cloned());
    writer
        .write_record(&header)
        .map_err(|e| CardstockError::Export(format!("csv write failed: {e}")))?;

    for record in records {
        let mut row = vec![record.kind.clone()];
        row.extend(
            columns
                .iter()
                .map(|c| record.get(c).unwrap_or("").to_string()),
        );
        writer
            .write_record(&row)
            .map_err(|e| CardstockError::Export(format!("csv write failed: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| CardstockError::Export(format!("csv write failed: {e}")))
}
