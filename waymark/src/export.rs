//! KMZ packaging.
//!
//! A KMZ is a ZIP archive holding a single `doc.kml`. Export to disk goes
//! through two scoped temporary files in the destination directory: the KML
//! payload, and the archive being assembled. The archive is renamed to its
//! final name only once it is complete, and both temporaries are removed on
//! every exit path, so a failed export leaves nothing behind.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::{Builder, NamedTempFile};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::Waypoint;
use crate::error::{Result, WaymarkError};
use crate::kml::{KmlConfig, build_kml};

/// MIME type handed to viewers and share targets.
pub const KMZ_MIME_TYPE: &str = "application/vnd.google-earth.kmz";

/// Name of the single archive member.
pub const KMZ_ENTRY_NAME: &str = "doc.kml";

/// Configuration for KMZ export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub kml: KmlConfig,
    /// File stem used when the project name yields nothing usable (default: "export")
    pub fallback_file_stem: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            kml: KmlConfig::default(),
            fallback_file_stem: "export".to_string(),
        }
    }
}

/// A finished export ready for a viewer or share target.
#[derive(Debug, Clone, PartialEq)]
pub struct KmzExport {
    pub path: PathBuf,
    pub mime_type: &'static str,
    /// Number of placemarks written
    pub placemark_count: usize,
}

/// Archive file name for a project: path-hostile characters replaced, `.kmz` appended.
pub fn kmz_file_name(project_name: &str, fallback_stem: &str) -> String {
    let sanitized: String = project_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = sanitized.trim_matches('.');
    if stem.is_empty() {
        format!("{}.kmz", fallback_stem)
    } else {
        format!("{}.kmz", stem)
    }
}

/// Write a single-entry deflated archive holding `kml` as `doc.kml`.
pub fn write_kmz<W: Write + Seek, R: Read>(writer: W, kml: &mut R) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(KMZ_ENTRY_NAME, options)?;
    std::io::copy(kml, &mut zip)?;
    Ok(zip.finish()?)
}

/// Build a KMZ archive entirely in memory.
pub fn build_kmz_bytes(waypoints: &[Waypoint], project_name: &str, config: &KmlConfig) -> Result<Vec<u8>> {
    let kml = build_kml(waypoints, project_name, config)?;
    let cursor = write_kmz(Cursor::new(Vec::new()), &mut kml.as_bytes())?;
    Ok(cursor.into_inner())
}

/// Export a route as `<project name>.kmz` inside `out_dir`.
///
/// Any failure is reported as [`WaymarkError::Export`]; in that case no
/// archive and no temporary file remain in `out_dir`. An existing archive
/// with the same name is replaced only when the new one is complete.
pub fn export_kmz(
    waypoints: &[Waypoint],
    project_name: &str,
    out_dir: &Path,
    config: &ExportConfig,
) -> Result<KmzExport> {
    info!(
        "[Export] Exporting {} waypoints for '{}' to {}",
        waypoints.len(),
        project_name,
        out_dir.display()
    );

    match export_kmz_inner(waypoints, project_name, out_dir, config) {
        Ok(export) => {
            info!(
                "[Export] Wrote {} placemarks to {}",
                export.placemark_count,
                export.path.display()
            );
            Ok(export)
        }
        Err(e) => {
            warn!("[Export] KMZ export failed: {}", e);
            Err(WaymarkError::Export {
                message: e.to_string(),
            })
        }
    }
}

fn export_kmz_inner(
    waypoints: &[Waypoint],
    project_name: &str,
    out_dir: &Path,
    config: &ExportConfig,
) -> Result<KmzExport> {
    let kml = build_kml(waypoints, project_name, &config.kml)?;
    let placemark_count = waypoints.iter().filter(|w| w.has_coordinates()).count();

    // Both temporaries are deleted when dropped, including on early return.
    let mut kml_file = scoped_temp_file(out_dir, "doc-", ".kml")?;
    kml_file.write_all(kml.as_bytes())?;
    kml_file.flush()?;
    kml_file.seek(SeekFrom::Start(0))?;
    debug!("[Export] Staged {} bytes of KML", kml.len());

    let mut archive = scoped_temp_file(out_dir, ".kmz-", ".partial")?;
    write_kmz(archive.as_file_mut(), &mut kml_file)?;
    archive.as_file().sync_all()?;

    let path = out_dir.join(kmz_file_name(project_name, &config.fallback_file_stem));
    archive.persist(&path).map_err(|e| WaymarkError::Io(e.error))?;

    Ok(KmzExport {
        path,
        mime_type: KMZ_MIME_TYPE,
        placemark_count,
    })
}

fn scoped_temp_file(dir: &Path, prefix: &str, suffix: &str) -> Result<NamedTempFile> {
    Ok(Builder::new().prefix(prefix).suffix(suffix).tempfile_in(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use zip::ZipArchive;

    fn route() -> Vec<Waypoint> {
        vec![
            Waypoint::new("A&B", "08:00").at(37.123456, -122.654321),
            Waypoint::new("Nowhere", "08:10"),
        ]
    }

    fn read_single_entry(bytes: Vec<u8>) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), KMZ_ENTRY_NAME);
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut kml = String::new();
        entry.read_to_string(&mut kml).unwrap();
        kml
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_kmz_bytes_hold_single_doc_kml() {
        let bytes = build_kmz_bytes(&route(), "Survey", &KmlConfig::default()).unwrap();
        let kml = read_single_entry(bytes);
        assert!(kml.contains("<coordinates>-122.654321,37.123456,0</coordinates>"));
        assert!(!kml.contains("Nowhere"));
    }

    #[test]
    fn test_export_to_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let export = export_kmz(&route(), "Survey", dir.path(), &ExportConfig::default()).unwrap();

        assert_eq!(export.path, dir.path().join("Survey.kmz"));
        assert_eq!(export.mime_type, "application/vnd.google-earth.kmz");
        assert_eq!(export.placemark_count, 1);
        // Only the archive remains; staged KML and partial archive are gone.
        assert_eq!(dir_entries(dir.path()), vec!["Survey.kmz".to_string()]);

        let kml = read_single_entry(fs::read(&export.path).unwrap());
        assert!(kml.contains("<name>Survey</name>"));
    }

    #[test]
    fn test_export_replaces_existing_archive() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("Survey.kmz"), b"stale").unwrap();
        let export = export_kmz(&route(), "Survey", dir.path(), &ExportConfig::default()).unwrap();
        let kml = read_single_entry(fs::read(&export.path).unwrap());
        assert!(kml.contains("A&amp;B"));
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = export_kmz(&route(), "Survey", &missing, &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, WaymarkError::Export { .. }));
        assert!(!missing.exists());
    }

    #[test]
    fn test_failed_persist_leaves_no_files() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory squatting on the target name makes the final rename fail.
        fs::create_dir(dir.path().join("Survey.kmz")).unwrap();
        let nested = dir.path().join("Survey.kmz").join("keep");
        fs::write(&nested, b"x").unwrap();

        let err = export_kmz(&route(), "Survey", dir.path(), &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, WaymarkError::Export { .. }));
        assert_eq!(dir_entries(dir.path()), vec!["Survey.kmz".to_string()]);
        assert!(nested.exists());
    }

    #[test]
    fn test_kmz_file_name() {
        assert_eq!(kmz_file_name("Survey 1", "export"), "Survey 1.kmz");
        assert_eq!(kmz_file_name("a/b:c", "export"), "a_b_c.kmz");
        assert_eq!(kmz_file_name("  ", "export"), "export.kmz");
        assert_eq!(kmz_file_name("..", "export"), "export.kmz");
    }
}
