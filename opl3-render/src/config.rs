//! Chip configuration for the render tool.

use std::{
    error::Error,
    fs::read_to_string,
    path::{Path, PathBuf},
};

use dirs::config_dir;
use log::info;
use opl3_emulator::OplConfig;

use crate::cli::CLIOptions;

const LOG_TAG: &str = "RenderConfig";
const CONFIG_DIR: &str = "opl3-render";
const CONFIG_FILE: &str = "opl.ron";

fn default_config_path() -> Option<PathBuf> {
    let mut dir = config_dir()?;
    dir.push(CONFIG_DIR);
    dir.push(CONFIG_FILE);
    Some(dir)
}

/// Reads the chip config
///
/// An explicit `path` must exist. Without one the user config dir is tried,
/// falling back to the defaults if there is no file there.
pub fn load(path: Option<&Path>) -> Result<OplConfig, Box<dyn Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!(target: LOG_TAG, "No config file, using defaults");
                return Ok(OplConfig::default());
            }
        },
    };
    let text = read_to_string(&path)?;
    let config = OplConfig::from_ron(&text)?;
    info!(target: LOG_TAG, "Loaded {:?}", path);
    Ok(config)
}

/// CLI options win over the file
pub fn sync_cli(config: &mut OplConfig, cli: &CLIOptions) {
    if let Some(rate) = cli.rate {
        if rate != config.output_rate {
            info!(target: LOG_TAG, "Output rate changed to {} Hz", rate);
            config.output_rate = rate;
        }
    }
    if let Some(full_pan) = cli.full_pan {
        config.full_pan = full_pan;
    }
}
