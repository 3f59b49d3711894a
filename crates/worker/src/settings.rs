use std::path::PathBuf;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use studio_bridge::DEFAULT_MAX_FRAME_BYTES;

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

/// Worker process settings: an optional TOML file overlaid with
/// `STUDIO__*` environment variables (`STUDIO__PROJECT_PATH`,
/// `STUDIO__LOG_DIR`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    pub project_path: PathBuf,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl WorkerSettings {
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        Self::build(builder.add_source(
            Environment::with_prefix("STUDIO")
                .try_parsing(true)
                .separator("__"),
        ))
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Self = builder.build()?.try_deserialize()?;
        if settings.max_frame_bytes == 0 {
            return Err(ConfigError::Message("max_frame_bytes must be positive".into()));
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let settings = WorkerSettings::from_toml_str(r#"project_path = "/projects/demo""#).unwrap();
        assert_eq!(settings.project_path, PathBuf::from("/projects/demo"));
        assert_eq!(settings.log_dir, None);
        assert!(!settings.verbose);
        assert_eq!(settings.max_frame_bytes, DEFAULT_MAX_FRAME_BYTES);
    }

    #[test]
    fn explicit_values_win() {
        let settings = WorkerSettings::from_toml_str(
            r#"
            project_path = "demo"
            log_dir = "/tmp/studio-logs"
            verbose = true
            max_frame_bytes = 4096
            "#,
        )
        .unwrap();
        assert_eq!(settings.log_dir, Some(PathBuf::from("/tmp/studio-logs")));
        assert!(settings.verbose);
        assert_eq!(settings.max_frame_bytes, 4096);
    }

    #[test]
    fn project_path_is_required() {
        assert!(WorkerSettings::from_toml_str("verbose = true").is_err());
        assert!(WorkerSettings::from_toml_str("project_path = \"x\"\nmax_frame_bytes = 0").is_err());
    }
}
