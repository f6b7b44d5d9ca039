use crate::error::Result;
use crate::pdf_generator::PageLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What happens to form fields the user did not submit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnfilledPolicy {
    /// Treat as an empty input, the placeholder disappears from the output
    #[default]
    Blank,
    /// Leave the literal `{{name}}` in the output
    Keep,
}

/// Runtime configuration, read from a JSON file. Every field is optional on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the active template
    pub work_dir: PathBuf,
    /// File name of the single template slot inside `work_dir`
    pub template_file: String,
    /// Shared admin secret. Admin commands are refused while unset.
    #[serde(skip_serializing)]
    pub admin_secret: Option<String>,
    /// Label of the mandatory output-name field
    pub output_name_label: String,
    pub unfilled: UnfilledPolicy,
    pub layout: PageLayout,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            work_dir: PathBuf::from("work"),
            template_file: "template.docx".to_string(),
            admin_secret: None,
            output_name_label: "PDF Name".to_string(),
            unfilled: UnfilledPolicy::default(),
            layout: PageLayout::a4(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn template_path(&self) -> PathBuf {
        self.work_dir.join(&self.template_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.template_path(), PathBuf::from("work").join("template.docx"));
        assert_eq!(config.unfilled, UnfilledPolicy::Blank);
        assert!(config.admin_secret.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docfill.json");
        std::fs::write(
            &path,
            r#"{ "work_dir": "/srv/docfill", "unfilled": "keep", "admin_secret": "s3cret",
                 "layout": { "font_size": 10.0 } }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.work_dir, PathBuf::from("/srv/docfill"));
        assert_eq!(config.unfilled, UnfilledPolicy::Keep);
        assert_eq!(config.admin_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.layout.font_size, 10.0);
        assert_eq!(config.layout.line_height, PageLayout::a4().line_height);
        assert_eq!(config.template_file, "template.docx");
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = Config {
            admin_secret: Some("hidden".into()),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hidden"));
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/docfill.json")).is_err());
    }
}
