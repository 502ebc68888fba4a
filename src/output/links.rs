//! Links file: the discovered URL list as a JSON array

use crate::output::CrawlReport;
use crate::CrawlError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every discovered URL, in admission order, as a pretty JSON array
///
/// # Returns
///
/// * `Ok(())` - File written
/// * `Err(CrawlError)` - The file could not be created or written
pub fn write_links_file(path: &Path, report: &CrawlReport) -> Result<(), CrawlError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &report.discovered)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!(
        "Wrote {} URLs to {}",
        report.discovered.len(),
        path.display()
    );
    Ok(())
}
