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

use crate::types::domain::Domain;
use std::path::PathBuf;

pub const TEMPLATES_SUBDIR: &str = "apps.templates";
pub const TEMPLATE_ICONS_SUBDIR: &str = "apps.tempicons";
pub const APPMENUS_SUBDIR: &str = "apps";
pub const ICONS_SUBDIR: &str = "apps.icons";
pub const WHITELIST: &str = "whitelisted-appmenus.list";
pub const VM_DEFAULT_WHITELIST: &str = "vm-whitelisted-appmenus.list";
pub const NETVM_DEFAULT_WHITELIST: &str = "netvm-whitelisted-appmenus.list";

/// Where every per-VM file lives, relative to one base directory.
#[derive(Debug, Clone)]
pub struct AppMenusPaths {
    base_dir: PathBuf,
}

impl AppMenusPaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn vm_dir(&self, vm_name: &str) -> PathBuf {
        self.base_dir.join(vm_name)
    }

    /// Catalog of launcher templates. Non-updateable VMs use their template's.
    pub fn templates_dir(&self, vm: &Domain) -> Option<PathBuf> {
        self.owner_of_catalog(vm)
            .map(|owner| self.vm_dir(&owner.name).join(TEMPLATES_SUBDIR))
    }

    /// Not yet colored icons, resolved like [`Self::templates_dir`].
    pub fn template_icons_dir(&self, vm: &Domain) -> Option<PathBuf> {
        self.owner_of_catalog(vm)
            .map(|owner| self.vm_dir(&owner.name).join(TEMPLATE_ICONS_SUBDIR))
    }

    fn owner_of_catalog<'a>(&self, vm: &'a Domain) -> Option<&'a Domain> {
        if vm.updateable() {
            Some(vm)
        } else {
            vm.template().and_then(|t| self.owner_of_catalog(t))
        }
    }

    /// Launcher files generated for the VM.
    pub fn appmenus_dir(&self, vm_name: &str) -> PathBuf {
        self.vm_dir(vm_name).join(APPMENUS_SUBDIR)
    }

    /// Tinted icons generated for the VM.
    pub fn icons_dir(&self, vm_name: &str) -> PathBuf {
        self.vm_dir(vm_name).join(ICONS_SUBDIR)
    }

    pub fn whitelist_path(&self, vm_name: &str) -> PathBuf {
        self.vm_dir(vm_name).join(WHITELIST)
    }

    pub fn default_whitelist_path(&self, vm_name: &str) -> PathBuf {
        self.vm_dir(vm_name).join(VM_DEFAULT_WHITELIST)
    }

    pub fn netvm_default_whitelist_path(&self, vm_name: &str) -> PathBuf {
        self.vm_dir(vm_name).join(NETVM_DEFAULT_WHITELIST)
    }

    pub fn directory_file(&self, vm_name: &str) -> PathBuf {
        self.appmenus_dir(vm_name)
            .join(format!("{vm_name}-vm.directory"))
    }
}
