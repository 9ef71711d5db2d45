// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Paul <abonnementspaul (at) gmail.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "qubes-appmenus";
const SETTINGS_FILE_NAME: &str = "settings.yaml";
const DOMAINS_FILE_NAME: &str = "domains.yaml";

/// The launcher rendered for every VM next to its applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialLauncher {
    #[default]
    VmSettings,
    AppSelection,
}

/// Where the "keep this VM out of the menu" flag is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InternalFlagSource {
    #[default]
    Feature,
    Property,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMenusLocalSettings {
    pub base_dir: PathBuf,
    pub domains_file: Option<PathBuf>,
    pub special_launcher: SpecialLauncher,
    pub internal_flag: InternalFlagSource,
    pub hvm_bootstrap_template: PathBuf,
    pub registrar: String,
}

impl Default for AppMenusLocalSettings {
    fn default() -> Self {
        let data_home = dirs::data_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });

        Self {
            base_dir: data_home.join(APP_DIR_NAME),
            domains_file: None,
            special_launcher: SpecialLauncher::default(),
            internal_flag: InternalFlagSource::default(),
            hvm_bootstrap_template: PathBuf::from("/usr/share/qubes-appmenus/qubes-start.desktop"),
            registrar: "xdg-desktop-menu".to_string(),
        }
    }
}

impl AppMenusLocalSettings {
    pub fn default_settings_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Reads the settings file, falling back to defaults when it doesn't exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(anyhow!("Settings file does not exist: {}", p.display()));
                }
                p.to_path_buf()
            }
            None => match Self::default_settings_file() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .context(format!("Failed to read settings file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .context(format!("Failed to parse settings file {}", path.display()))
    }

    pub fn check_ok(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.base_dir).context(format!(
            "Unable to create base directory {}",
            self.base_dir.display()
        ))?;

        if self.registrar.trim().is_empty() {
            return Err(anyhow!("Registrar command must not be empty"));
        }

        Ok(())
    }

    pub fn domains_file(&self) -> PathBuf {
        self.domains_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join(DOMAINS_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "base_dir: /srv/appmenus\nspecial_launcher: app-selection\ninternal_flag: property\n",
        )
        .unwrap();

        let settings = AppMenusLocalSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/srv/appmenus"));
        assert_eq!(settings.special_launcher, SpecialLauncher::AppSelection);
        assert_eq!(settings.internal_flag, InternalFlagSource::Property);
        assert_eq!(settings.registrar, "xdg-desktop-menu");
        assert_eq!(
            settings.domains_file(),
            PathBuf::from("/srv/appmenus/domains.yaml")
        );
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppMenusLocalSettings::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_check_ok_creates_base_dir() {
        let dir = TempDir::new().unwrap();
        let settings = AppMenusLocalSettings {
            base_dir: dir.path().join("appmenus"),
            ..Default::default()
        };
        settings.check_ok().unwrap();
        assert!(settings.base_dir.is_dir());
    }
}
