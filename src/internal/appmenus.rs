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

use crate::internal::catalog::{AvailableApps, CatalogEntry, list_available};
use crate::internal::helpers::{copy_dir, copy_if_exists, list_file_names};
use crate::internal::icons::{IconTinter, remove_icons, sync_icons};
use crate::internal::paths::{
    AppMenusPaths, NETVM_DEFAULT_WHITELIST, TEMPLATE_ICONS_SUBDIR, TEMPLATES_SUBDIR,
    VM_DEFAULT_WHITELIST, WHITELIST,
};
use crate::internal::registrar::MenuRegistrar;
use crate::internal::render::{DirectoryTemplate, RenderVars, TemplateSource, render, write_if_changed};
use crate::internal::whitelist::get_whitelist;
use crate::types::VirtMode;
use crate::types::domain::Domain;
use crate::types::local_settings::AppMenusLocalSettings;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Keeps each VM's menu entries and icons in line with its catalog and
/// whitelist, and tells the desktop menu about what changed.
pub struct AppMenus<'a> {
    pub paths: AppMenusPaths,
    settings: &'a AppMenusLocalSettings,
    registrar: &'a dyn MenuRegistrar,
    tinter: &'a dyn IconTinter,
}

impl<'a> AppMenus<'a> {
    pub fn new(
        settings: &'a AppMenusLocalSettings,
        registrar: &'a dyn MenuRegistrar,
        tinter: &'a dyn IconTinter,
    ) -> Self {
        Self {
            paths: AppMenusPaths::new(&settings.base_dir),
            settings,
            registrar,
            tinter,
        }
    }

    fn excluded(&self, vm: &Domain) -> bool {
        vm.excluded_from_menu(self.settings.internal_flag)
    }

    /// Sets up the VM's directory at creation time, copying the catalog and
    /// whitelists from `source` (or the VM's template) when there is one.
    pub fn init(&self, vm: &Domain, source: Option<&Domain>) -> Result<()> {
        let vm_dir = self.paths.vm_dir(&vm.name);
        std::fs::create_dir_all(&vm_dir).context(format!("Failed to create {}", vm_dir.display()))?;

        let source = source.or_else(|| vm.template());

        if source.is_none() {
            if let (Some(templates_dir), Some(icons_dir)) = (
                self.paths.templates_dir(vm),
                self.paths.template_icons_dir(vm),
            ) {
                std::fs::create_dir_all(&templates_dir)
                    .context(format!("Failed to create {}", templates_dir.display()))?;
                std::fs::create_dir_all(&icons_dir)
                    .context(format!("Failed to create {}", icons_dir.display()))?;

                if vm.virt_mode == VirtMode::Hvm {
                    self.seed_hvm_catalog(vm, &templates_dir)?;
                }
            }
        }

        let Some(source) = source else {
            return Ok(());
        };

        let default_whitelist = if vm.provides_network
            && self.paths.netvm_default_whitelist_path(&source.name).is_file()
        {
            self.paths.netvm_default_whitelist_path(&source.name)
        } else {
            self.paths.default_whitelist_path(&source.name)
        };
        if copy_if_exists(&default_whitelist, &self.paths.whitelist_path(&vm.name))? {
            info!("{}: Creating default whitelisted apps list", vm.name);
        }

        if !vm.updateable() {
            return Ok(());
        }

        for whitelist in [WHITELIST, VM_DEFAULT_WHITELIST, NETVM_DEFAULT_WHITELIST] {
            if copy_if_exists(
                &self.paths.vm_dir(&source.name).join(whitelist),
                &vm_dir.join(whitelist),
            )? {
                info!("{}: Copying whitelisted apps list: {whitelist}", vm.name);
            }
        }

        info!("{}: Creating/copying appmenus templates", vm.name);
        let source_dirs = [
            (self.paths.templates_dir(source), self.paths.templates_dir(vm)),
            (
                self.paths.template_icons_dir(source),
                self.paths.template_icons_dir(vm),
            ),
        ];
        for (from, to) in source_dirs {
            if let (Some(from), Some(to)) = (from, to) {
                if from.is_dir() {
                    copy_dir(&from, &to)?;
                }
            }
        }

        Ok(())
    }

    fn seed_hvm_catalog(&self, vm: &Domain, templates_dir: &Path) -> Result<()> {
        let bootstrap = &self.settings.hvm_bootstrap_template;
        let Some(file_name) = bootstrap.file_name() else {
            return Ok(());
        };

        info!("{}: Creating appmenus directory: {}", vm.name, templates_dir.display());
        if !copy_if_exists(bootstrap, &templates_dir.join(file_name))? {
            warn!(
                "{}: HVM bootstrap template {} not found",
                vm.name,
                bootstrap.display()
            );
        }

        Ok(())
    }

    pub fn get_available(&self, vm: &Domain) -> Result<AvailableApps> {
        list_available(self.paths.templates_dir(vm).as_deref())
    }

    /// Catalog entries the VM shows: the whitelisted ones in catalog order,
    /// or the whole catalog without a whitelist.
    pub fn selected_entries(&self, vm: &Domain) -> Result<Vec<CatalogEntry>> {
        let entries = self.get_available(vm)?.collect::<Result<Vec<_>>>()?;

        Ok(match get_whitelist(&self.paths, &vm.name)? {
            Some(whitelist) => entries
                .into_iter()
                .filter(|e| whitelist.contains(&e.id))
                .collect(),
            None => entries,
        })
    }

    fn launcher_path(&self, vm: &Domain, id: &str) -> PathBuf {
        self.paths
            .appmenus_dir(&vm.name)
            .join(format!("{}-{id}", vm.name))
    }

    /// Renders the VM's launchers, deletes the ones no longer wanted and
    /// registers what changed.
    pub fn create(&self, vm: &Domain, refresh_cache: bool) -> Result<()> {
        if self.excluded(vm) {
            debug!("{}: not in the menu, skipping appmenus", vm.name);
            return Ok(());
        }

        info!("{}: Creating appmenus", vm.name);
        let appmenus_dir = self.paths.appmenus_dir(&vm.name);
        std::fs::create_dir_all(&appmenus_dir)
            .context(format!("Failed to create {}", appmenus_dir.display()))?;

        let dispvm = vm.dispvm_menus_enabled();
        let vars = RenderVars::for_domain(&self.paths, vm);

        let directory_file = self.paths.directory_file(&vm.name);
        let directory_template = DirectoryTemplate::for_domain(vm, dispvm);
        let mut anything_changed = write_if_changed(
            &render(directory_template.source(), &vars, dispvm)?,
            &directory_file,
        )?;

        let special = self.settings.special_launcher;
        let special_path = self.launcher_path(vm, special.id());

        let mut target = BTreeSet::new();
        let mut changed = Vec::new();

        let selected = self.selected_entries(vm)?;
        if let Some(templates_dir) = self.paths.templates_dir(vm) {
            for entry in &selected {
                let path = self.launcher_path(vm, &entry.id);
                if path == special_path || path == directory_file {
                    warn!(
                        "{}: Application {} clashes with a built-in entry, skipping",
                        vm.name, entry.id
                    );
                    continue;
                }
                let text = render(
                    TemplateSource::File(&templates_dir.join(&entry.id)),
                    &vars,
                    dispvm,
                )?;
                if write_if_changed(&text, &path)? {
                    changed.push(path.clone());
                }
                target.insert(path);
            }
        }

        if write_if_changed(&render(special.source(), &vars, false)?, &special_path)? {
            changed.push(special_path.clone());
        }
        target.insert(special_path);

        anything_changed |= !changed.is_empty();

        let to_remove: Vec<PathBuf> = self
            .installed_launchers(vm)?
            .into_iter()
            .filter(|p| !target.contains(p))
            .collect();

        if !to_remove.is_empty() {
            if let Err(e) = self.registrar.uninstall(None, &to_remove, refresh_cache) {
                warn!("{}: Problem removing old appmenus: {e:#}", vm.name);
            }
            for path in &to_remove {
                std::fs::remove_file(path).context(format!("Failed to remove {}", path.display()))?;
            }
        }

        if anything_changed {
            if let Err(e) = self
                .registrar
                .install(&directory_file, &changed, refresh_cache)
            {
                warn!("{}: Problem creating appmenus: {e:#}", vm.name);
            }
        }

        if refresh_cache {
            self.registrar.refresh_cache();
        }

        Ok(())
    }

    /// Everything in `apps/` except the directory entry, sorted.
    fn installed_launchers(&self, vm: &Domain) -> Result<Vec<PathBuf>> {
        self.installed_launchers_by_name(&vm.name)
    }

    fn installed_launchers_by_name(&self, vm_name: &str) -> Result<Vec<PathBuf>> {
        let appmenus_dir = self.paths.appmenus_dir(vm_name);
        let directory_file = self.paths.directory_file(vm_name);

        Ok(list_file_names(&appmenus_dir)?
            .into_iter()
            .map(|name| appmenus_dir.join(name))
            .filter(|p| *p != directory_file)
            .collect())
    }

    /// Unregisters and deletes the VM's launchers. Takes only the name since
    /// the VM itself may be gone already.
    pub fn remove(&self, vm_name: &str, refresh_cache: bool) -> Result<()> {
        let appmenus_dir = self.paths.appmenus_dir(vm_name);
        if appmenus_dir.exists() {
            info!("{vm_name}: Removing appmenus");

            let directory_file = self.paths.directory_file(vm_name);
            let installed = self.installed_launchers_by_name(vm_name)?;
            let has_directory = directory_file.is_file();

            if has_directory || !installed.is_empty() {
                let result = self.registrar.uninstall(
                    has_directory.then_some(directory_file.as_path()),
                    &installed,
                    refresh_cache,
                );
                if let Err(e) = result {
                    warn!("{vm_name}: Problem removing appmenus: {e:#}");
                }
            }

            std::fs::remove_dir_all(&appmenus_dir)
                .context(format!("Failed to remove {}", appmenus_dir.display()))?;
        }

        if refresh_cache {
            self.registrar.refresh_cache();
        }

        Ok(())
    }

    /// Carries whitelists and catalog over from `old_name` after a rename.
    /// Launchers and icons embed the old name, so they are dropped and left
    /// for the next `create`.
    pub fn rename(&self, old_name: &str, vm: &Domain) -> Result<()> {
        if old_name == vm.name {
            return Ok(());
        }

        self.remove(old_name, false)?;
        self.remove_icons(old_name)?;

        let old_dir = self.paths.vm_dir(old_name);
        let new_dir = self.paths.vm_dir(&vm.name);
        if !old_dir.is_dir() {
            debug!("{}: nothing to carry over from {old_name}", vm.name);
            return self.init(vm, None);
        }

        info!("{}: Moving appmenus data from {old_name}", vm.name);
        if !new_dir.exists() {
            return std::fs::rename(&old_dir, &new_dir).context(format!(
                "Failed to move {} to {}",
                old_dir.display(),
                new_dir.display()
            ));
        }

        for whitelist in [WHITELIST, VM_DEFAULT_WHITELIST, NETVM_DEFAULT_WHITELIST] {
            copy_if_exists(&old_dir.join(whitelist), &new_dir.join(whitelist))?;
        }
        for subdir in [TEMPLATES_SUBDIR, TEMPLATE_ICONS_SUBDIR] {
            let from = old_dir.join(subdir);
            if from.is_dir() {
                copy_dir(&from, &new_dir.join(subdir))?;
            }
        }
        std::fs::remove_dir_all(&old_dir).context(format!("Failed to remove {}", old_dir.display()))
    }

    /// Regenerates the VM's tinted icons from its (possibly inherited) sources.
    pub fn sync_icons(&self, vm: &Domain, force: bool) -> Result<()> {
        if self.excluded(vm) {
            return Ok(());
        }
        let Some(srcdir) = self.paths.template_icons_dir(vm) else {
            return Ok(());
        };

        sync_icons(&self.paths, vm, &srcdir, force, self.tinter)
    }

    pub fn remove_icons(&self, vm_name: &str) -> Result<()> {
        remove_icons(&self.paths, vm_name)
    }

    /// Icons then launchers for the VM and, for a template, each VM based on
    /// it; the desktop menu is rebuilt once at the end.
    pub fn update(&self, vm: &Domain, children: &[Domain], force: bool) -> Result<()> {
        self.sync_icons(vm, force)?;
        self.create(vm, false)?;

        if vm.is_template() {
            for child in children {
                let result = self
                    .sync_icons(child, force)
                    .and_then(|_| self.create(child, false));
                if let Err(e) = result {
                    error!("{}: Failed to recreate appmenus: {e:#}", child.name);
                }
            }
        }

        if let Err(e) = self.registrar.force_update() {
            warn!("{}: Problem updating the desktop menu: {e:#}", vm.name);
        }
        self.registrar.refresh_cache();
        self.registrar.invalidate_icon_cache(&vm.label.icon);

        Ok(())
    }
}
