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
use crate::internal::paths::AppMenusPaths;
use crate::types::domain::Domain;
use crate::types::local_settings::SpecialLauncher;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_VMNAME: &str = "%VMNAME%";
pub const PLACEHOLDER_VMDIR: &str = "%VMDIR%";
pub const PLACEHOLDER_XDGICON: &str = "%XDGICON%";

/// A launcher template, either a catalog file or a built-in text.
#[derive(Debug, Clone, Copy)]
pub enum TemplateSource<'a> {
    File(&'a Path),
    Text { name: &'a str, text: &'a str },
}

impl TemplateSource<'_> {
    fn name(&self) -> String {
        match self {
            TemplateSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            TemplateSource::Text { name, .. } => name.to_string(),
        }
    }

    fn load(&self) -> Result<String> {
        match self {
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .context(format!("Failed to read template {}", path.display())),
            TemplateSource::Text { text, .. } => Ok(text.to_string()),
        }
    }
}

/// Values substituted into every template rendered for one VM.
#[derive(Debug, Clone)]
pub struct RenderVars {
    pub vm_name: String,
    pub vm_dir: PathBuf,
    pub icon: String,
}

impl RenderVars {
    pub fn for_domain(paths: &AppMenusPaths, vm: &Domain) -> Self {
        Self {
            vm_name: vm.name.clone(),
            vm_dir: paths.vm_dir(&vm.name),
            icon: vm.label.icon.clone(),
        }
    }
}

/// Substitutes `%VMNAME%`, `%VMDIR%` and `%XDGICON%` into the template.
///
/// With `dispvm` set, the template's `X-Qubes-DispvmExec=` line becomes the
/// active `Exec=` and the original one is kept as `X-Qubes-NonDispvmExec=`.
pub fn render(source: TemplateSource<'_>, vars: &RenderVars, dispvm: bool) -> Result<String> {
    let mut text = source.load()?;
    let mut icon = vars.icon.clone();

    if dispvm {
        if !text.contains("\nX-Qubes-DispvmExec=") && text.contains("\nExec=") {
            return Err(AppMenusError::DispvmNotSupported {
                template: source.name(),
            }
            .into());
        }
        text = text
            .replace("\nExec=", "\nX-Qubes-NonDispvmExec=")
            .replace("\nX-Qubes-DispvmExec=", "\nExec=");
        icon = icon.replace("appvm-", "dispvm-");
    }

    Ok(text
        .replace(PLACEHOLDER_VMNAME, &vars.vm_name)
        .replace(PLACEHOLDER_VMDIR, &vars.vm_dir.to_string_lossy())
        .replace(PLACEHOLDER_XDGICON, &icon))
}

/// Writes `text` unless the destination already holds exactly that.
/// Returns whether anything was written.
pub fn write_if_changed(text: &str, destination: &Path) -> Result<bool> {
    if destination.exists() {
        let current = std::fs::read(destination)
            .context(format!("Failed to read {}", destination.display()))?;
        if current == text.as_bytes() {
            return Ok(false);
        }
    }

    std::fs::write(destination, text)
        .context(format!("Failed to write {}", destination.display()))?;
    Ok(true)
}

/// Template of the `{vm}-vm.directory` menu folder entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryTemplate {
    Vm,
    TemplateVm,
    ServiceVm,
    DispVm,
}

impl DirectoryTemplate {
    pub fn for_domain(vm: &Domain, dispvm: bool) -> Self {
        if dispvm {
            DirectoryTemplate::DispVm
        } else if vm.is_template() {
            DirectoryTemplate::TemplateVm
        } else if vm.provides_network {
            DirectoryTemplate::ServiceVm
        } else {
            DirectoryTemplate::Vm
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DirectoryTemplate::Vm => "qubes-vm.directory.template",
            DirectoryTemplate::TemplateVm => "qubes-templatevm.directory.template",
            DirectoryTemplate::ServiceVm => "qubes-servicevm.directory.template",
            DirectoryTemplate::DispVm => "qubes-dispvm.directory.template",
        }
    }

    pub fn source(&self) -> TemplateSource<'static> {
        let text = match self {
            DirectoryTemplate::Vm => include_str!("../../resources/qubes-vm.directory.template"),
            DirectoryTemplate::TemplateVm => {
                include_str!("../../resources/qubes-templatevm.directory.template")
            }
            DirectoryTemplate::ServiceVm => {
                include_str!("../../resources/qubes-servicevm.directory.template")
            }
            DirectoryTemplate::DispVm => {
                include_str!("../../resources/qubes-dispvm.directory.template")
            }
        };
        TemplateSource::Text {
            name: self.name(),
            text,
        }
    }
}

impl SpecialLauncher {
    /// Catalog-style id; the launcher lands in `apps/` as `{vm}-{id}`.
    pub fn id(&self) -> &'static str {
        match self {
            SpecialLauncher::VmSettings => "qubes-vm-settings.desktop",
            SpecialLauncher::AppSelection => "qubes-select-applications.desktop",
        }
    }

    pub fn source(&self) -> TemplateSource<'static> {
        let text = match self {
            SpecialLauncher::VmSettings => {
                include_str!("../../resources/qubes-vm-settings.desktop.template")
            }
            SpecialLauncher::AppSelection => {
                include_str!("../../resources/qubes-select-applications.desktop.template")
            }
        };
        TemplateSource::Text {
            name: self.id(),
            text,
        }
    }
}
