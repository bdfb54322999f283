use crate::Result;
use crate::facts::{DEFAULT_CONFIG_TOML, PipelineConfig};
use camino::Utf8Path;
use ohno::{EnrichableExt, IntoAppError};
use std::fs;
use std::io;

/// Name of the configuration file looked up when none is given explicitly
pub const CONFIG_FILE_NAME: &str = "contrib-board.toml";

/// Load the pipeline configuration.
///
/// An explicit `config_path` must exist. Otherwise `contrib-board.toml` in `base_dir` is used
/// when present, and the built-in defaults when it is not.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated
pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<PipelineConfig> {
    let (final_path, text) = if let Some(path) = config_path {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
        (path.to_path_buf(), text)
    } else {
        let path = base_dir.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => (path, text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PipelineConfig::default()),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
        }
    };

    PipelineConfig::from_toml(&text).map_err(|e| e.enrich_with(|| format!("loading configuration file '{final_path}'")))
}

/// Save the default configuration to a TOML file
///
/// # Errors
///
/// Returns an error if the file cannot be written
pub fn save_default(output_path: &Utf8Path) -> Result<()> {
    fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
    Ok(())
}
