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

use crate::internal::catalog::icon_file_name;
use crate::internal::helpers::list_file_names;
use crate::internal::paths::AppMenusPaths;
use crate::internal::whitelist::get_whitelist;
use crate::types::domain::Domain;
use anyhow::{Context, Result};
use log::debug;
use std::collections::HashSet;
use std::path::Path;
use std::time::SystemTime;

/// Produces a label-colored copy of an icon.
pub trait IconTinter {
    fn tint(&self, src: &Path, dst: &Path, color: &str) -> Result<()>;
}

/// Brings `apps.icons/` in line with the icon sources.
///
/// Callers are responsible for skipping internal and disposable VMs.
pub fn sync_icons(
    paths: &AppMenusPaths,
    vm: &Domain,
    srcdir: &Path,
    force: bool,
    tinter: &dyn IconTinter,
) -> Result<()> {
    if !srcdir.is_dir() {
        return Ok(());
    }

    let dstdir = paths.icons_dir(&vm.name);
    ensure_dir(&dstdir)?;

    let sources = list_file_names(srcdir)?;
    let expected: HashSet<String> = match get_whitelist(paths, &vm.name)? {
        Some(whitelist) => whitelist.iter().map(|id| icon_file_name(id)).collect(),
        None => sources.iter().cloned().collect(),
    };

    for icon in sources.iter().filter(|i| expected.contains(*i)) {
        let src_icon = srcdir.join(icon);
        let dst_icon = dstdir.join(icon);
        if force || is_stale(&src_icon, &dst_icon)? {
            debug!("{}: tinting icon {icon}", vm.name);
            tinter
                .tint(&src_icon, &dst_icon, &vm.label.color)
                .context(format!("Failed to tint icon {}", src_icon.display()))?;
        }
    }

    for icon in list_file_names(&dstdir)? {
        if !expected.contains(&icon) {
            debug!("{}: removing icon {icon}", vm.name);
            std::fs::remove_file(dstdir.join(&icon))
                .context(format!("Failed to remove icon {icon}"))?;
        }
    }

    Ok(())
}

pub fn remove_icons(paths: &AppMenusPaths, vm_name: &str) -> Result<()> {
    let dir = paths.icons_dir(vm_name);
    if !dir.exists() {
        return Ok(());
    }
    std::fs::remove_dir_all(&dir).context(format!("Failed to remove {}", dir.display()))
}

/// Creates `dir`, replacing a plain file that may sit at that path.
fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        std::fs::remove_file(dir).context(format!("Failed to remove {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))
}

/// The destination is missing or strictly older than the source.
fn is_stale(src: &Path, dst: &Path) -> Result<bool> {
    if !dst.exists() {
        return Ok(true);
    }
    Ok(modified(src)? > modified(dst)?)
}

fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .context(format!("Failed to get mtime of {}", path.display()))
}
