use std::path::Path;

use crate::error::Result;
use crate::report::Report;

/// Writes the report as pretty JSON, creating parent directories as needed.
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut json = serde_json::to_vec_pretty(report)?;
    json.push(b'\n');
    std::fs::write(path, json)?;
    Ok(())
}
