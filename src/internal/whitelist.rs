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

use crate::internal::paths::AppMenusPaths;
use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

/// Applications the VM exposes, or `None` when no whitelist exists
/// (meaning "everything in the catalog").
pub fn get_whitelist(paths: &AppMenusPaths, vm_name: &str) -> Result<Option<Vec<String>>> {
    read_list(&paths.whitelist_path(vm_name))
}

pub fn set_whitelist(paths: &AppMenusPaths, vm_name: &str, ids: &[String]) -> Result<()> {
    write_list(paths, vm_name, &paths.whitelist_path(vm_name), ids)
}

/// Whitelist copied into VMs created from this one.
pub fn set_default_whitelist(paths: &AppMenusPaths, vm_name: &str, ids: &[String]) -> Result<()> {
    write_list(paths, vm_name, &paths.default_whitelist_path(vm_name), ids)
}

pub fn read_list(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read whitelist {}", path.display()))?;

    Ok(Some(parse_list(&content)))
}

/// One id per line; surrounding whitespace and blank lines are dropped,
/// later duplicates too.
pub fn parse_list(content: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for line in content.lines() {
        let id = line.trim();
        if id.is_empty() || ids.iter().any(|i| i == id) {
            continue;
        }
        ids.push(id.to_string());
    }
    ids
}

fn write_list(paths: &AppMenusPaths, vm_name: &str, path: &Path, ids: &[String]) -> Result<()> {
    if !paths.vm_dir(vm_name).is_dir() {
        debug!("{vm_name}: no appmenus directory, not writing {}", path.display());
        return Ok(());
    }

    let normalized = parse_list(&ids.join("\n"));
    let mut content = normalized.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    std::fs::write(path, content).context(format!("Failed to write whitelist {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_absent_whitelist_is_none() {
        let dir = TempDir::new().unwrap();
        let paths = AppMenusPaths::new(dir.path());
        std::fs::create_dir(paths.vm_dir("work")).unwrap();
        assert_eq!(get_whitelist(&paths, "work").unwrap(), None);
    }

    #[test]
    fn test_empty_whitelist_is_not_absent() {
        let dir = TempDir::new().unwrap();
        let paths = AppMenusPaths::new(dir.path());
        std::fs::create_dir(paths.vm_dir("work")).unwrap();
        set_whitelist(&paths, "work", &[]).unwrap();
        assert_eq!(get_whitelist(&paths, "work").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_set_then_get_keeps_order() {
        let dir = TempDir::new().unwrap();
        let paths = AppMenusPaths::new(dir.path());
        std::fs::create_dir(paths.vm_dir("work")).unwrap();

        set_whitelist(&paths, "work", &ids(&["xterm.desktop\n", "evince.desktop", ""])).unwrap();
        assert_eq!(
            get_whitelist(&paths, "work").unwrap(),
            Some(ids(&["xterm.desktop", "evince.desktop"]))
        );
        assert_eq!(
            std::fs::read_to_string(paths.whitelist_path("work")).unwrap(),
            "xterm.desktop\nevince.desktop\n"
        );
    }

    #[test]
    fn test_missing_vm_dir_is_a_silent_noop() {
        let dir = TempDir::new().unwrap();
        let paths = AppMenusPaths::new(dir.path());
        set_whitelist(&paths, "ghost", &ids(&["a"])).unwrap();
        set_default_whitelist(&paths, "ghost", &ids(&["a"])).unwrap();
        assert!(!paths.vm_dir("ghost").exists());
    }

    #[test]
    fn test_default_whitelist_is_separate() {
        let dir = TempDir::new().unwrap();
        let paths = AppMenusPaths::new(dir.path());
        std::fs::create_dir(paths.vm_dir("fedora")).unwrap();
        set_default_whitelist(&paths, "fedora", &ids(&["firefox.desktop"])).unwrap();
        assert_eq!(get_whitelist(&paths, "fedora").unwrap(), None);
        assert_eq!(
            read_list(&paths.default_whitelist_path("fedora")).unwrap(),
            Some(ids(&["firefox.desktop"]))
        );
    }

    #[test]
    fn test_parse_list_skips_blank_and_trims() {
        assert_eq!(
            parse_list("  a.desktop \n\n\tb.desktop\na.desktop\n"),
            ids(&["a.desktop", "b.desktop"])
        );
    }
}
