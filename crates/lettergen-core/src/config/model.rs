use super::consts;
use crate::error::{LetterGenError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fully resolved settings for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub template_path: PathBuf,
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub filename_field: String,
    pub worker_count: usize,
    pub existing_files: ExistingFilePolicy,
    pub pdf: PdfSettings,
}

/// What to do when a resolved name already exists in the output directory
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExistingFilePolicy {
    /// Replace the existing pair (re-runs are idempotent)
    #[default]
    Overwrite,
    /// Append `(k)` until the name is free
    Disambiguate,
    /// Fail the row at name resolution
    Fail,
}

impl FromStr for ExistingFilePolicy {
    type Err = LetterGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "disambiguate" => Ok(Self::Disambiguate),
            "fail" => Ok(Self::Fail),
            other => Err(LetterGenError::ConfigInvalidValue {
                field: "existing_files".to_string(),
                reason: format!("expected overwrite, disambiguate or fail, got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfSettings {
    /// top, right, bottom, left
    #[serde(default = "default_margins_mm")]
    pub margins_mm: [u32; 4],
    #[serde(default)]
    pub binary: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            margins_mm: default_margins_mm(),
            binary: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_margins_mm() -> [u32; 4] {
    consts::pdf::DEFAULT_MARGINS_MM
}

fn default_timeout_secs() -> u64 {
    consts::pdf::DEFAULT_TIMEOUT_SECS
}

/// Available cores, capped at [`consts::workers::DEFAULT_CAP`]
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, consts::workers::DEFAULT_CAP)
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .map(|docs| docs.join("LetterGen"))
        .unwrap_or_else(|| PathBuf::from("LetterGen"))
}

/// One partial source of settings (job file, environment, command line)
///
/// Layers are merged with [`ConfigLayer::merge`]; the merged layer becomes a
/// [`BatchConfig`] once the required paths are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub filename_field: Option<String>,
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default)]
    pub existing_files: Option<ExistingFilePolicy>,
    #[serde(default)]
    pub pdf: Option<PdfSettings>,
}

impl ConfigLayer {
    /// Load a TOML job file
    ///
    /// Relative paths inside the file are resolved against the file's own
    /// directory, so a job file can sit next to its template and data.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LetterGenError::ConfigParseError(format!("cannot read '{}': {}", path.display(), e))
        })?;

        let mut layer: Self = toml::from_str(&content).map_err(|e| {
            LetterGenError::ConfigParseError(format!("'{}': {}", path.display(), e))
        })?;

        if let Some(base) = path.parent() {
            layer.rebase(base);
        }

        Ok(layer)
    }

    fn rebase(&mut self, base: &Path) {
        let rebase = |p: &mut Option<PathBuf>| {
            if let Some(inner) = p.as_mut() {
                if inner.is_relative() {
                    *inner = base.join(&*inner);
                }
            }
        };
        rebase(&mut self.template_path);
        rebase(&mut self.data_path);
        rebase(&mut self.output_dir);
        if let Some(pdf) = self.pdf.as_mut() {
            rebase(&mut pdf.binary);
        }
    }

    /// Overlay `other` on top of `self`; values present in `other` win
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            template_path: other.template_path.or(self.template_path),
            data_path: other.data_path.or(self.data_path),
            output_dir: other.output_dir.or(self.output_dir),
            filename_field: other.filename_field.or(self.filename_field),
            worker_count: other.worker_count.or(self.worker_count),
            existing_files: other.existing_files.or(self.existing_files),
            pdf: other.pdf.or(self.pdf),
        }
    }

    /// Fill defaults and validate
    pub fn into_config(self) -> Result<BatchConfig> {
        let template_path = self
            .template_path
            .ok_or_else(|| missing_value("template_path"))?;
        let data_path = self.data_path.ok_or_else(|| missing_value("data_path"))?;

        let config = BatchConfig {
            template_path,
            data_path,
            output_dir: self.output_dir.unwrap_or_else(default_output_dir),
            filename_field: self
                .filename_field
                .unwrap_or_else(|| consts::naming::DEFAULT_FILENAME_FIELD.to_string()),
            worker_count: self.worker_count.unwrap_or_else(default_worker_count),
            existing_files: self.existing_files.unwrap_or_default(),
            pdf: self.pdf.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn missing_value(field: &str) -> LetterGenError {
    LetterGenError::ConfigInvalidValue {
        field: field.to_string(),
        reason: "a value is required".to_string(),
    }
}

impl BatchConfig {
    /// Check values that cannot be clamped into range
    pub fn validate(&self) -> Result<()> {
        if self.filename_field.trim().is_empty() {
            return Err(LetterGenError::ConfigInvalidValue {
                field: "filename_field".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.pdf.timeout_secs == 0 {
            return Err(LetterGenError::ConfigInvalidValue {
                field: "pdf.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_layer() {
        let toml = r#"
template_path = "letter.html"
data_path = "people.csv"
"#;
        let layer: ConfigLayer = toml::from_str(toml).unwrap();
        let config = layer.into_config().unwrap();
        assert_eq!(config.template_path, PathBuf::from("letter.html"));
        assert_eq!(config.filename_field, "filename");
        assert_eq!(config.existing_files, ExistingFilePolicy::Overwrite);
        assert_eq!(config.pdf, PdfSettings::default());
        assert!(config.worker_count >= 1 && config.worker_count <= 8);
    }

    #[test]
    fn test_parse_full_layer() {
        let toml = r#"
template_path = "letter.html"
data_path = "people.xlsx"
output_dir = "out"
filename_field = "name"
worker_count = 3
existing_files = "disambiguate"

[pdf]
margins_mm = [10, 12, 10, 12]
timeout_secs = 30
"#;
        let config = toml::from_str::<ConfigLayer>(toml)
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.existing_files, ExistingFilePolicy::Disambiguate);
        assert_eq!(config.pdf.margins_mm, [10, 12, 10, 12]);
        assert_eq!(config.pdf.timeout_secs, 30);
        assert_eq!(config.pdf.binary, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = toml::from_str::<ConfigLayer>("concurrency = 4\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_template_is_invalid_value() {
        let layer = ConfigLayer {
            data_path: Some(PathBuf::from("rows.csv")),
            ..Default::default()
        };
        match layer.into_config() {
            Err(LetterGenError::ConfigInvalidValue { field, .. }) => {
                assert_eq!(field, "template_path")
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_filename_field_rejected() {
        let layer = ConfigLayer {
            template_path: Some(PathBuf::from("t.html")),
            data_path: Some(PathBuf::from("rows.csv")),
            filename_field: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(layer.into_config().is_err());
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let base = ConfigLayer {
            template_path: Some(PathBuf::from("a.html")),
            worker_count: Some(2),
            ..Default::default()
        };
        let overlay = ConfigLayer {
            worker_count: Some(6),
            data_path: Some(PathBuf::from("rows.csv")),
            ..Default::default()
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.template_path, Some(PathBuf::from("a.html")));
        assert_eq!(merged.worker_count, Some(6));
        assert_eq!(merged.data_path, Some(PathBuf::from("rows.csv")));
    }

    #[test]
    fn test_from_file_rebases_relative_paths() {
        let temp = tempfile::tempdir().unwrap();
        let job = temp.path().join("job.toml");
        std::fs::write(
            &job,
            "template_path = \"letter.html\"\ndata_path = \"/abs/rows.csv\"\n",
        )
        .unwrap();

        let layer = ConfigLayer::from_file(&job).unwrap();
        assert_eq!(layer.template_path, Some(temp.path().join("letter.html")));
        assert_eq!(layer.data_path, Some(PathBuf::from("/abs/rows.csv")));
    }

    #[test]
    fn test_from_file_malformed_is_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let job = temp.path().join("job.toml");
        std::fs::write(&job, "worker_count = \"many\"\n").unwrap();

        match ConfigLayer::from_file(&job) {
            Err(LetterGenError::ConfigParseError(message)) => {
                assert!(message.contains("job.toml"), "{message}")
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file_missing_is_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let result = ConfigLayer::from_file(temp.path().join("absent.toml"));
        assert!(matches!(result, Err(LetterGenError::ConfigParseError(_))));
    }

    #[test]
    fn test_existing_policy_from_str() {
        assert_eq!(
            "Disambiguate".parse::<ExistingFilePolicy>().unwrap(),
            ExistingFilePolicy::Disambiguate
        );
        assert!("rename".parse::<ExistingFilePolicy>().is_err());
    }
}
