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
use crate::types::domain::{Domain, DomainKind};
use crate::types::{DomainClass, Label, VirtMode};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One VM as recorded by the host, with its template referenced by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainRecord {
    pub name: String,
    pub class: DomainClass,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub label: Label,
    #[serde(default)]
    pub provides_network: bool,
    #[serde(default)]
    pub virt_mode: VirtMode,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub features: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DomainInventory {
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
}

impl DomainInventory {
    /// A missing inventory file is an empty inventory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read domain inventory {}", path.display()))?;
        serde_yaml::from_str(&content)
            .context(format!("Failed to parse domain inventory {}", path.display()))
    }

    fn record(&self, name: &str) -> Option<&DomainRecord> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Resolves a VM together with its whole template chain.
    pub fn get(&self, name: &str) -> Result<Domain> {
        self.resolve(name, &mut Vec::new())
    }

    fn resolve(&self, name: &str, chain: &mut Vec<String>) -> Result<Domain> {
        if chain.iter().any(|n| n == name) {
            return Err(anyhow!(
                "Template cycle detected: {} -> {}",
                chain.join(" -> "),
                name
            ));
        }
        chain.push(name.to_string());

        let record = self
            .record(name)
            .ok_or_else(|| AppMenusError::UnknownDomain {
                name: name.to_string(),
            })?;

        let kind = match record.class {
            DomainClass::StandaloneVM => DomainKind::Standalone,
            DomainClass::TemplateVM => DomainKind::Template,
            DomainClass::AppVM | DomainClass::DispVM => {
                let template_name = record
                    .template
                    .as_deref()
                    .ok_or_else(|| anyhow!("VM '{}' has no template", record.name))?;
                let template = Box::new(
                    self.resolve(template_name, chain)
                        .context(format!("Failed to resolve template of '{}'", record.name))?,
                );
                if record.class == DomainClass::AppVM {
                    DomainKind::AppVm { template }
                } else {
                    DomainKind::DispVm { template }
                }
            }
        };

        Ok(Domain {
            label: record.label.clone(),
            provides_network: record.provides_network,
            virt_mode: record.virt_mode,
            internal: record.internal,
            features: record.features.clone(),
            ..Domain::new(record.name.clone(), kind)
        })
    }

    /// VMs directly based on `template_name`, in inventory order.
    pub fn children_of(&self, template_name: &str) -> Result<Vec<Domain>> {
        self.domains
            .iter()
            .filter(|d| d.template.as_deref() == Some(template_name))
            .map(|d| self.get(&d.name))
            .collect()
    }
}
