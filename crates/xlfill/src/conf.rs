//! Template-schema file loading.

use std::fs;
use std::path::Path;

use xlfill_io_xlsx::SpecTemplateSchema;

use crate::spec::ConfigError;

/// Load a TOML schema override; absent fields keep their built-in defaults.
pub fn load_template_schema(path: &Path) -> Result<SpecTemplateSchema, ConfigError> {
    let c_content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&c_content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the optional `--schema` argument.
pub fn resolve_template_schema(path: Option<&Path>) -> Result<SpecTemplateSchema, ConfigError> {
    match path {
        Some(path) => load_template_schema(path),
        None => Ok(SpecTemplateSchema::default()),
    }
}

/// Render a schema as TOML, e.g. as a starting point for an override file.
pub fn render_template_schema(schema: &SpecTemplateSchema) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(schema)?)
}
