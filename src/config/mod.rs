//! Tuning config: loads `boba_config.ron` next to the executable.
//!
//! Every field is optional in the file; anything missing keeps the value from
//! `GameConfig::default()`. A missing file is normal. A malformed one is
//! reported and ignored.

use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::*;

pub const CONFIG_FILE_NAME: &str = "boba_config.ron";

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameConfig>()
            .add_systems(Startup, load_config);
    }
}

fn config_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join(CONFIG_FILE_NAME)
}

pub fn parse_config(text: &str) -> Result<GameConfig, String> {
    ron::from_str(text).map_err(|e| format!("Config parse failed: {}", e))
}

/// `Ok(None)` when the file does not exist.
pub fn read_config(path: &Path) -> Result<Option<GameConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    parse_config(&text).map(Some)
}

fn load_config(mut config: ResMut<GameConfig>) {
    let path = config_path();
    match read_config(&path) {
        Ok(Some(loaded)) => {
            *config = loaded;
            info!("[Config] Loaded tuning from {}", path.display());
        }
        Ok(None) => {
            debug!("[Config] No {} found, using defaults", CONFIG_FILE_NAME);
        }
        Err(e) => {
            warn!("[Config] {}; keeping defaults", e);
        }
    }
}
