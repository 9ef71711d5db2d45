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

use crate::internal::error::AppMenusError;
use crate::internal::helpers::list_file_names;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const NAME_PREFIX: &str = "Name=%VMNAME%: ";

/// One launcher template of a VM's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Template file name, e.g. `org.gnome.Cheese.desktop`.
    pub id: String,
    pub name: String,
}

/// `evince.desktop` -> `evince.png`
pub fn icon_file_name(id: &str) -> String {
    let stem = Path::new(id)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| id.to_string());
    format!("{stem}.png")
}

/// Catalog entries, read one template at a time in file name order.
pub struct AvailableApps {
    dir: PathBuf,
    ids: std::vec::IntoIter<String>,
}

impl Iterator for AvailableApps {
    type Item = Result<CatalogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        Some(read_entry(&self.dir.join(&id), id))
    }
}

/// Lists the catalog in `templates_dir`. A missing directory is an empty catalog.
pub fn list_available(templates_dir: Option<&Path>) -> Result<AvailableApps> {
    let (dir, ids) = match templates_dir {
        Some(dir) if dir.is_dir() => (dir.to_path_buf(), list_file_names(dir)?),
        _ => (PathBuf::new(), Vec::new()),
    };

    Ok(AvailableApps {
        dir,
        ids: ids.into_iter(),
    })
}

fn read_entry(path: &Path, id: String) -> Result<CatalogEntry> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read template {}", path.display()))?;

    let name = content
        .lines()
        .find_map(|line| line.strip_prefix(NAME_PREFIX))
        .map(|name| name.trim().to_string())
        .ok_or_else(|| AppMenusError::MalformedTemplate {
            template: id.clone(),
        })?;

    Ok(CatalogEntry { id, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(list_available(None).unwrap().count(), 0);
        assert_eq!(
            list_available(Some(&dir.path().join("apps.templates")))
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn test_lists_entries_in_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("xterm.desktop"),
            "[Desktop Entry]\nName=%VMNAME%: XTerm \nExec=xterm\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("evince.desktop"),
            "[Desktop Entry]\nName=%VMNAME%: Document Viewer\n",
        )
        .unwrap();

        let entries: Vec<CatalogEntry> = list_available(Some(dir.path()))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                CatalogEntry {
                    id: "evince.desktop".to_string(),
                    name: "Document Viewer".to_string()
                },
                CatalogEntry {
                    id: "xterm.desktop".to_string(),
                    name: "XTerm".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_malformed_template_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("broken.desktop"),
            "[Desktop Entry]\nName=Broken\n",
        )
        .unwrap();

        let err = list_available(Some(dir.path()))
            .unwrap()
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppMenusError>(),
            Some(AppMenusError::MalformedTemplate { template }) if template == "broken.desktop"
        ));
    }

    #[test]
    fn test_icon_file_name() {
        assert_eq!(icon_file_name("org.gnome.Cheese.desktop"), "org.gnome.Cheese.png");
        assert_eq!(icon_file_name("evince"), "evince.png");
    }
}
