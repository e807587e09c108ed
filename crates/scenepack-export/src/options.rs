//! Export configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// Export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Export selected objects only
    pub selected_only: bool,

    /// Manifest indentation width in spaces
    pub indent: usize,

    /// Recursion cap for shader graph walks
    pub max_graph_depth: usize,

    /// Persist referenced images next to the vertex buffers
    pub write_textures: bool,

    /// File extension of vertex-buffer files
    pub mesh_extension: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            selected_only: false,
            indent: 4,
            max_graph_depth: 64,
            write_textures: true,
            mesh_extension: "bin".to_string(),
        }
    }
}

impl ExportOptions {
    /// Parse options from YAML; missing keys keep their defaults
    pub fn from_yaml_str(text: &str) -> ExportResult<Self> {
        let options: ExportOptions =
            serde_yaml::from_str(text).map_err(|e| ExportError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ExportResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> ExportResult<()> {
        if self.max_graph_depth == 0 {
            return Err(ExportError::Config("max_graph_depth must be at least 1".into()));
        }
        if self.mesh_extension.is_empty() || self.mesh_extension.contains(&['/', '\\', '.'][..]) {
            return Err(ExportError::Config(format!(
                "invalid mesh_extension '{}'",
                self.mesh_extension
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert_eq!(options.indent, 4);
        assert_eq!(options.mesh_extension, "bin");
        assert!(options.write_textures);
        assert!(!options.selected_only);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = ExportOptions::from_yaml_str("selected_only: true\nindent: 2\n").unwrap();
        assert!(options.selected_only);
        assert_eq!(options.indent, 2);
        assert_eq!(options.max_graph_depth, 64);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let err = ExportOptions::from_yaml_str("max_graph_depth: 0").unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_extension() {
        assert!(ExportOptions::from_yaml_str("mesh_extension: ../x").is_err());
    }
}
