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

use crate::internal::registrar::MenuRegistrar;
use crate::utils::desktop_session::get_desktop_session;
use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

const NOTIFICATION_TIMEOUT_MS: u32 = 10_000;

/// Registers menu entries by running `xdg-desktop-menu` (or a drop-in).
pub struct XdgDesktopMenu {
    command: String,
}

impl XdgDesktopMenu {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn run(&self, args: Vec<OsString>) -> Result<()> {
        debug!("Running {} {:?}", self.command, args);

        // xdg-desktop-menu sorts entries; keep that stable across locales
        let status = Command::new(&self.command)
            .args(&args)
            .env("LC_COLLATE", "C")
            .status()
            .context(format!("Failed to run {}", self.command))?;

        if !status.success() {
            return Err(anyhow!("{} {:?} failed: {status}", self.command, args));
        }

        Ok(())
    }
}

/// Argument list for `install`/`uninstall`.
pub fn menu_args(
    action: &str,
    refresh: bool,
    directory_file: Option<&Path>,
    files: &[PathBuf],
) -> Vec<OsString> {
    let mut args = vec![OsString::from(action)];
    if !refresh {
        args.push(OsString::from("--noupdate"));
    }
    if let Some(directory_file) = directory_file {
        args.push(directory_file.as_os_str().to_owned());
    }
    args.extend(files.iter().map(|f| f.as_os_str().to_owned()));
    args
}

impl MenuRegistrar for XdgDesktopMenu {
    fn install(&self, directory_file: &Path, files: &[PathBuf], refresh: bool) -> Result<()> {
        self.run(menu_args("install", refresh, Some(directory_file), files))
    }

    fn uninstall(
        &self,
        directory_file: Option<&Path>,
        files: &[PathBuf],
        refresh: bool,
    ) -> Result<()> {
        self.run(menu_args("uninstall", refresh, directory_file, files))
    }

    fn force_update(&self) -> Result<()> {
        self.run(vec![OsString::from("forceupdate")])
    }

    fn refresh_cache(&self) {
        let Some(sycoca) = get_desktop_session().sycoca_command() else {
            return;
        };

        match Command::new(&sycoca).status() {
            Ok(status) if !status.success() => warn!("{sycoca} failed: {status}"),
            Ok(_) => {}
            Err(e) => warn!("Failed to run {sycoca}: {e}"),
        }
    }

    fn invalidate_icon_cache(&self, icon: &str) {
        if !get_desktop_session().plasma {
            return;
        }

        if let Some(cache) = kde_icon_cache_path() {
            if let Err(e) = std::fs::remove_file(&cache) {
                debug!("Could not remove {}: {e}", cache.display());
            }
        }

        let shown = notify_rust::Notification::new()
            .appname("Qubes")
            .summary("Qubes")
            .body(
                "You will need to log off and log in again for the VM icons \
                to update in the KDE launcher menu",
            )
            .icon(icon)
            .timeout(notify_rust::Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show();
        if let Err(e) = shown {
            debug!("Failed to show desktop notification: {e}");
        }
    }
}

fn kde_icon_cache_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let hostname = std::env::var("HOSTNAME").ok().or_else(|| {
        std::fs::read_to_string("/proc/sys/kernel/hostname")
            .ok()
            .map(|h| h.trim().to_string())
    })?;

    Some(
        home.join(".kde")
            .join(format!("cache-{hostname}"))
            .join("icon-cache.kcache"),
    )
}
