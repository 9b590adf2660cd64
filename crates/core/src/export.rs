//! # Archive Export
//!
//! Packs the current result into a downloadable zip: every project file plus
//! two fixed top-level documents.

use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::Result;
use crate::state::AnalysisResult;

/// Manifesto entry written at the archive root
pub const ARCHIVE_MANIFESTO_PATH: &str = "VANGUARD_MANIFESTO.md";
/// Cursor rules entry written at the archive root
pub const ARCHIVE_RULES_PATH: &str = ".cursor/rules/vanguard.mdc";

/// An in-memory zip ready to be downloaded or written to disk
#[derive(Debug, Clone)]
pub struct Archive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn archive_name(at: DateTime<Utc>) -> String {
    format!("vanguard-infinity-pack-{}.zip", at.timestamp_millis())
}

/// Build the archive for `result`. No result, no archive.
pub fn build_archive(result: Option<&AnalysisResult>) -> Result<Option<Archive>> {
    let Some(result) = result else {
        return Ok(None);
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (path, content) in &result.project_files {
        // The fixed documents below own these names
        if path == ARCHIVE_MANIFESTO_PATH || path == ARCHIVE_RULES_PATH {
            continue;
        }
        zip.start_file(path.as_str(), options)?;
        zip.write_all(content.as_bytes())?;
    }

    zip.start_file(ARCHIVE_MANIFESTO_PATH, options)?;
    zip.write_all(result.markdown_spec.as_bytes())?;
    zip.start_file(ARCHIVE_RULES_PATH, options)?;
    zip.write_all(result.cursor_rules.as_bytes())?;

    let bytes = zip.finish()?.into_inner();
    let archive = Archive {
        file_name: archive_name(Utc::now()),
        bytes,
    };
    tracing::info!(
        file = %archive.file_name,
        size = archive.bytes.len(),
        "Archive built"
    );
    Ok(Some(archive))
}

/// Write the archive into `dir`, returning the full path
pub async fn write_archive(archive: &Archive, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&archive.file_name);
    tokio::fs::write(&path, &archive.bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GeneratedContent, ProjectFile};
    use std::io::Read;
    use zip::ZipArchive;

    fn result() -> AnalysisResult {
        AnalysisResult::from_generated(GeneratedContent {
            spec: "# Manifesto".to_string(),
            rules: "rules".to_string(),
            project_files: vec![
                ProjectFile::new("app/page.tsx", "export default function Page() {}"),
                ProjectFile::new(ARCHIVE_MANIFESTO_PATH, "shadowed"),
            ],
            ..Default::default()
        })
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_no_result_no_archive() {
        assert!(build_archive(None).unwrap().is_none());
    }

    #[test]
    fn test_archive_contents() {
        let archive = build_archive(Some(&result())).unwrap().unwrap();

        let zip = ZipArchive::new(Cursor::new(archive.bytes.as_slice())).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"app/page.tsx"));
        assert!(names.contains(&"FOUNDRY_MANIFESTO.md"));
        assert!(names.contains(&".cursor/rules/foundry.mdc"));
        assert_eq!(
            names.iter().filter(|n| **n == ARCHIVE_MANIFESTO_PATH).count(),
            1
        );

        assert_eq!(read_entry(&archive.bytes, ARCHIVE_MANIFESTO_PATH), "# Manifesto");
        assert_eq!(read_entry(&archive.bytes, ARCHIVE_RULES_PATH), "rules");
        assert_eq!(
            read_entry(&archive.bytes, "app/page.tsx"),
            "export default function Page() {}"
        );
    }

    #[test]
    fn test_archive_name() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(archive_name(at), "vanguard-infinity-pack-1700000000123.zip");
    }

    #[tokio::test]
    async fn test_write_archive() {
        let dir = std::env::temp_dir().join(format!("vanguard-export-{}", uuid::Uuid::new_v4()));
        let archive = build_archive(Some(&result())).unwrap().unwrap();

        let path = write_archive(&archive, &dir).await.unwrap();
        assert!(path.ends_with(&archive.file_name));
        assert_eq!(std::fs::read(&path).unwrap(), archive.bytes);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
