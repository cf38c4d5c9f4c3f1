//! Artifact writer: one `<key>.json` file per fetched key.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract;
use crate::fetch::ArtifactBundle;

/// Extension of per-key artifact files.
pub const ARTIFACT_EXT: &str = "json";

/// Raw fetch result for one key, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub key: String,
    pub raw_payload: String,
}

impl ArtifactRecord {
    pub fn from_bundle(key: &str, bundle: &ArtifactBundle) -> Self {
        Self {
            key: key.to_string(),
            raw_payload: bundle.raw_payload.clone(),
        }
    }
}

/// Destination for fetched artifacts.
pub trait ArtifactSink {
    /// Persist the artifact for `key`; returns where it was written.
    fn write(&mut self, key: &str, bundle: &ArtifactBundle) -> Result<PathBuf>;
}

/// Writes artifacts under an output directory and, optionally, unpacks their
/// sources into `<output>/contracts`.
#[derive(Debug, Clone)]
pub struct FileArtifactWriter {
    output_dir: PathBuf,
    contracts_dir: Option<PathBuf>,
}

impl FileArtifactWriter {
    /// Creates `output_dir` if needed.
    pub fn new(output_dir: impl Into<PathBuf>, extract_sources: bool) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output dir: {}", output_dir.display()))?;
        let contracts_dir = extract_sources.then(|| output_dir.join(extract::CONTRACTS_DIR));
        Ok(Self {
            output_dir,
            contracts_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final path of the artifact for `key`.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", sanitize_file_component(key), ARTIFACT_EXT))
    }

    /// Write `record` to its final path via a `.part` temp file and rename.
    pub fn write_record(&self, record: &ArtifactRecord) -> Result<PathBuf> {
        let final_path = self.artifact_path(&record.key);
        let temp_path = final_path.with_extension(format!("{}.part", ARTIFACT_EXT));
        fs::write(&temp_path, record.raw_payload.as_bytes())
            .with_context(|| format!("write artifact: {}", temp_path.display()))?;
        fs::rename(&temp_path, &final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
        Ok(final_path)
    }
}

impl ArtifactSink for FileArtifactWriter {
    fn write(&mut self, key: &str, bundle: &ArtifactBundle) -> Result<PathBuf> {
        let path = self.write_record(&ArtifactRecord::from_bundle(key, bundle))?;
        if let Some(contracts_dir) = &self.contracts_dir {
            if !bundle.is_empty() {
                match extract::extract_sources(key, bundle, contracts_dir) {
                    Ok(n) => tracing::debug!(key, files = n, "extracted sources"),
                    Err(e) => tracing::warn!(key, "source extraction failed: {:#}", e),
                }
            }
        }
        Ok(path)
    }
}

/// Reduces `name` to a single safe path component.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
/// - Falls back to `_` if nothing is left
pub fn sanitize_file_component(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut take = trimmed.len().min(NAME_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    if take == 0 {
        return "_".to_string();
    }
    trimmed[..take].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(content: &str) -> ArtifactBundle {
        ArtifactBundle {
            content: content.to_string(),
            contract_name: Some("Token".to_string()),
            raw_payload: format!(r#"[{{"SourceCode":{:?}}}]"#, content),
        }
    }

    #[test]
    fn writes_raw_payload_named_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FileArtifactWriter::new(dir.path().join("out"), false).unwrap();
        let b = bundle("contract Token {}");
        let path = writer.write("0xabc", &b).unwrap();
        assert_eq!(path, dir.path().join("out").join("0xabc.json"));
        assert_eq!(fs::read_to_string(&path).unwrap(), b.raw_payload);
        assert!(!dir.path().join("out").join("0xabc.json.part").exists());
        assert!(!dir.path().join("out").join("contracts").exists());
    }

    #[test]
    fn rewrite_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FileArtifactWriter::new(dir.path(), false).unwrap();
        writer.write("0x1", &bundle("old")).unwrap();
        let path = writer.write("0x1", &bundle("new")).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("new"));
    }

    #[test]
    fn extraction_runs_for_non_empty_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FileArtifactWriter::new(dir.path(), true).unwrap();
        writer.write("0xabc", &bundle("contract Token {}")).unwrap();
        let sol = dir.path().join("contracts").join("0xabc").join("Token.sol");
        assert_eq!(fs::read_to_string(sol).unwrap(), "contract Token {}");

        writer.write("0xempty", &bundle("")).unwrap();
        assert!(!dir.path().join("contracts").join("0xempty").exists());
    }

    #[test]
    fn sanitize_removes_separators() {
        assert_eq!(sanitize_file_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_component("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_file_component("0xAbC"), "0xAbC");
        assert_eq!(sanitize_file_component(".."), "_");
        assert_eq!(sanitize_file_component("file\x00name"), "file_name");
    }
}
