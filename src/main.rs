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

mod internal;
mod types;
mod utils;

use crate::internal::appmenus::AppMenus;
use crate::internal::catalog_import::{ApplicationEntry, import_catalog, parse_appmenus};
use crate::internal::events::{HostEvent, Operation, command_line, operations_for};
use crate::internal::whitelist::{get_whitelist, parse_list, set_default_whitelist, set_whitelist};
use crate::types::domain_inventory::DomainInventory;
use crate::types::local_settings::AppMenusLocalSettings;
use crate::utils::desktop_menu::XdgDesktopMenu;
use crate::utils::logger;
use crate::utils::tint::ImageTinter;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{debug, error};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Initialize directory structure for appmenus (on VM creation)
    #[arg(long)]
    init: bool,

    /// Create appmenus
    #[arg(long)]
    create: bool,

    /// Remove appmenus
    #[arg(long)]
    remove: bool,

    /// Update appmenus
    #[arg(long)]
    update: bool,

    /// Previous name of a renamed VM, whose appmenus data moves to VMNAME
    #[arg(long, value_name = "NAME")]
    rename_from: Option<String>,

    /// Get list of applications available
    #[arg(long, requires = "fool")]
    get_available: bool,

    /// Required pledge for --get-available
    #[arg(long = "i-understand-format-is-unstable", id = "fool")]
    fool: bool,

    /// Get list of applications to include in the menu
    #[arg(long)]
    get_whitelist: bool,

    /// Set list of applications to include in the menu, use '-' to read from stdin
    #[arg(long, value_name = "PATH", conflicts_with = "set_default_whitelist")]
    set_whitelist: Option<String>,

    /// Set default list of applications to include in menu for VMs based on
    /// this template, use '-' to read from stdin
    #[arg(long, value_name = "PATH")]
    set_default_whitelist: Option<String>,

    /// Replace the application catalog with a GetAppmenus listing, use '-'
    /// to read from stdin
    #[arg(long = "import", value_name = "PATH")]
    import: Option<String>,

    /// Launch imported applications through their own Exec line
    #[arg(long, requires = "import")]
    legacy_exec: bool,

    /// Source VM to copy data from (for --init option)
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Force refreshing files, even when looks up to date
    #[arg(long)]
    force: bool,

    /// Run the operations the host maps to this event, e.g. property-set:label
    #[arg(long, value_name = "EVENT")]
    event: Option<HostEvent>,

    /// Settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    quiet: bool,

    #[arg(short, long)]
    verbose: bool,

    /// VMs on which perform requested actions
    #[arg(required = true, value_name = "VMNAME")]
    domains: Vec<String>,
}

/// Lists read once up front, shared by every VM of the batch.
#[derive(Default)]
struct Inputs {
    whitelist: Option<Vec<String>>,
    default_whitelist: Option<Vec<String>>,
    catalog: Option<BTreeMap<String, ApplicationEntry>>,
}

fn retrieve_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read standard input")?;
        Ok(content)
    } else {
        std::fs::read_to_string(path).context(format!("Failed to read {path}"))
    }
}

impl Cli {
    fn apply_event(&mut self) {
        let Some(event) = self.event.clone() else {
            return;
        };
        let ops = operations_for(&event);
        for vm in &self.domains {
            debug!("{vm}: {event:?} runs {}", command_line(&ops, vm).join(" "));
        }

        for op in ops {
            match op {
                Operation::Init { source } => {
                    self.init = true;
                    self.source = self.source.take().or(source);
                }
                Operation::Create => self.create = true,
                Operation::Remove => self.remove = true,
                Operation::Rename { from } => {
                    self.rename_from.get_or_insert(from);
                }
                Operation::Update { force } => {
                    self.update = true;
                    self.force |= force;
                }
                Operation::ImportCatalog => {
                    self.import.get_or_insert_with(|| "-".to_string());
                }
            }
        }
    }

    fn read_inputs(&self) -> Result<Inputs> {
        let from_stdin = [&self.set_whitelist, &self.set_default_whitelist, &self.import]
            .iter()
            .filter(|p| p.as_deref() == Some("-"))
            .count();
        if from_stdin > 1 {
            return Err(anyhow!("Only one option can read from standard input"));
        }

        let mut inputs = Inputs::default();
        if let Some(path) = &self.set_whitelist {
            inputs.whitelist = Some(parse_list(&retrieve_input(path)?));
        }
        if let Some(path) = &self.set_default_whitelist {
            inputs.default_whitelist = Some(parse_list(&retrieve_input(path)?));
        }
        if let Some(path) = &self.import {
            inputs.catalog = Some(parse_appmenus(&retrieve_input(path)?));
        }
        Ok(inputs)
    }

    fn needs_domain(&self) -> bool {
        self.init
            || self.rename_from.is_some()
            || self.create
            || self.update
            || self.get_available
            || self.get_whitelist
            || self.set_whitelist.is_some()
            || self.set_default_whitelist.is_some()
            || self.import.is_some()
    }
}

fn process_vm(
    args: &Cli,
    inputs: &Inputs,
    appmenus: &AppMenus,
    inventory: &DomainInventory,
    name: &str,
) -> Result<()> {
    // The VM may already be gone from the inventory, so remove works by name
    if args.remove {
        appmenus.remove(name, true)?;
        appmenus.remove_icons(name)?;
        let vm_dir = appmenus.paths.vm_dir(name);
        if vm_dir.exists() {
            std::fs::remove_dir_all(&vm_dir)
                .context(format!("Failed to remove {}", vm_dir.display()))?;
        }
    }

    if !args.needs_domain() {
        return Ok(());
    }

    let vm = inventory.get(name)?;

    if let Some(old_name) = &args.rename_from {
        appmenus.rename(old_name, &vm)?;
    }

    if args.init {
        let source = args
            .source
            .as_deref()
            .map(|s| inventory.get(s))
            .transpose()?;
        appmenus.init(&vm, source.as_ref())?;
    }

    if args.get_whitelist {
        if let Some(whitelist) = get_whitelist(&appmenus.paths, name)? {
            for id in whitelist {
                println!("{id}");
            }
        }
    }

    if let Some(list) = &inputs.default_whitelist {
        set_default_whitelist(&appmenus.paths, name, list)?;
    }

    if let Some(list) = &inputs.whitelist {
        set_whitelist(&appmenus.paths, name, list)?;
    }

    if let Some(catalog) = &inputs.catalog {
        let templates_dir = appmenus
            .paths
            .templates_dir(&vm)
            .filter(|_| vm.updateable())
            .ok_or_else(|| anyhow!("VM '{name}' does not own an application catalog"))?;
        import_catalog(&templates_dir, catalog, args.legacy_exec)?;
    }

    if args.create {
        appmenus.sync_icons(&vm, args.force)?;
        appmenus.create(&vm, true)?;
    }

    if args.update {
        let children = inventory.children_of(name)?;
        appmenus.update(&vm, &children, args.force)?;
    }

    if args.get_available {
        for entry in appmenus.get_available(&vm)? {
            let entry = entry?;
            println!("{} - {}", entry.id, entry.name);
        }
    }

    Ok(())
}

/// Runs the requested actions on every VM of the batch. One VM failing does
/// not stop the others; the names of those that failed are returned.
fn process_batch(
    args: &Cli,
    inputs: &Inputs,
    appmenus: &AppMenus,
    inventory: &DomainInventory,
) -> Vec<String> {
    let mut failed = Vec::new();
    for name in &args.domains {
        if let Err(e) = process_vm(args, inputs, appmenus, inventory, name) {
            error!("{name}: {e:#}");
            failed.push(name.clone());
        }
    }
    failed
}

fn main() -> Result<()> {
    let mut args = Cli::parse();
    logger::init(logger::level_from_flags(args.quiet, args.verbose));

    args.apply_event();

    let settings = AppMenusLocalSettings::load(args.config.as_deref())?;
    settings.check_ok()?;
    let inventory = DomainInventory::load(&settings.domains_file())?;
    let inputs = args.read_inputs()?;

    let registrar = XdgDesktopMenu::new(settings.registrar.clone());
    let appmenus = AppMenus::new(&settings, &registrar, &ImageTinter);

    let failed = process_batch(&args, &inputs, &appmenus, &inventory);
    if !failed.is_empty() {
        return Err(anyhow!("Failed to process: {}", failed.join(", ")));
    }

    Ok(())
}
