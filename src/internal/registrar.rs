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

use anyhow::Result;
use std::path::{Path, PathBuf};

/// The desktop's menu system, as driven by `xdg-desktop-menu`.
///
/// With `refresh` unset, the menu is not rebuilt after the call; a later
/// [`MenuRegistrar::force_update`] must do it.
pub trait MenuRegistrar {
    fn install(&self, directory_file: &Path, files: &[PathBuf], refresh: bool) -> Result<()>;

    fn uninstall(
        &self,
        directory_file: Option<&Path>,
        files: &[PathBuf],
        refresh: bool,
    ) -> Result<()>;

    fn force_update(&self) -> Result<()>;

    /// Rebuilds desktop-specific menu caches. Best effort.
    fn refresh_cache(&self);

    /// Drops cached icons where the desktop does not notice new ones. Best effort.
    fn invalidate_icon_cache(&self, icon: &str);
}
