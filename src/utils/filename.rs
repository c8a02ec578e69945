//! Output filename generation

use crate::core::descriptor::MediaKind;
use chrono::Utc;
use std::path::Path;

/// Product prefix for saved files
const FILE_PREFIX: &str = "ttgrab";

/// Build the timestamped output filename for a completed download
pub fn output_filename(kind: MediaKind) -> String {
    format!(
        "{}_{}.{}",
        FILE_PREFIX,
        Utc::now().timestamp_millis(),
        kind.extension()
    )
}

/// Generate a unique filename by appending a counter if the file already exists
pub fn unique_filename(dir: &Path, filename: &str) -> String {
    if !dir.join(filename).exists() {
        return filename.to_string();
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| FILE_PREFIX.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, counter, ext);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}
