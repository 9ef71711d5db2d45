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

use crate::types::domain::{FEATURE_APPMENUS_DISPVM, FEATURE_INTERNAL};
use anyhow::{Result, anyhow};
use std::str::FromStr;

/// Host lifecycle events the appmenus react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    DomainCreated,
    DomainCloned { source: String },
    DomainRemoved,
    DomainRenamed { old_name: String },
    PropertySet { property: String },
    FeatureSet { feature: String },
    FeatureDeleted { feature: String },
    TemplatePostinstall,
}

/// Parses the host's event names, e.g. `property-set:label`,
/// `domain-clone-files:fedora-40` or `domain-renamed:old-name`.
impl FromStr for HostEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg.to_string())),
            None => (s, None),
        };
        let missing = || anyhow!("Event '{name}' needs an argument");

        Ok(match name {
            "domain-create-on-disk" => HostEvent::DomainCreated,
            "domain-clone-files" => HostEvent::DomainCloned {
                source: arg.ok_or_else(missing)?,
            },
            "domain-remove-from-disk" => HostEvent::DomainRemoved,
            "domain-renamed" => HostEvent::DomainRenamed {
                old_name: arg.ok_or_else(missing)?,
            },
            "property-set" => HostEvent::PropertySet {
                property: arg.ok_or_else(missing)?,
            },
            "domain-feature-set" => HostEvent::FeatureSet {
                feature: arg.ok_or_else(missing)?,
            },
            "domain-feature-delete" => HostEvent::FeatureDeleted {
                feature: arg.ok_or_else(missing)?,
            },
            "template-postinstall" => HostEvent::TemplatePostinstall,
            _ => return Err(anyhow!("Unknown event: {s}")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Init { source: Option<String> },
    Create,
    Remove,
    /// Carry whitelists and catalog over from the VM's previous name.
    Rename { from: String },
    Update { force: bool },
    /// Read a catalog listing from standard input.
    ImportCatalog,
}

pub fn operations_for(event: &HostEvent) -> Vec<Operation> {
    match event {
        HostEvent::DomainCreated => vec![Operation::Init { source: None }, Operation::Create],
        HostEvent::DomainCloned { source } => vec![
            Operation::Init {
                source: Some(source.clone()),
            },
            Operation::Create,
        ],
        HostEvent::DomainRemoved => vec![Operation::Remove],
        HostEvent::DomainRenamed { old_name } => vec![
            Operation::Rename {
                from: old_name.clone(),
            },
            Operation::Create,
        ],
        HostEvent::PropertySet { property } => match property.as_str() {
            "label" | "provides_network" => vec![Operation::Update { force: true }],
            _ => Vec::new(),
        },
        HostEvent::FeatureSet { feature } | HostEvent::FeatureDeleted { feature }
            if feature == FEATURE_APPMENUS_DISPVM =>
        {
            vec![Operation::Update { force: true }]
        }
        HostEvent::FeatureSet { feature } if feature == FEATURE_INTERNAL => {
            vec![Operation::Remove]
        }
        HostEvent::FeatureDeleted { feature } if feature == FEATURE_INTERNAL => {
            vec![Operation::Create]
        }
        HostEvent::FeatureSet { .. } | HostEvent::FeatureDeleted { .. } => Vec::new(),
        HostEvent::TemplatePostinstall => vec![
            Operation::ImportCatalog,
            Operation::Update { force: false },
        ],
    }
}

/// Command line a dispatcher runs for `ops` on `vm_name`.
pub fn command_line(ops: &[Operation], vm_name: &str) -> Vec<String> {
    let mut args = vec!["qvm-appmenus".to_string(), "--quiet".to_string()];
    for op in ops {
        match op {
            Operation::Init { source } => {
                args.push("--init".to_string());
                if let Some(source) = source {
                    args.push(format!("--source={source}"));
                }
            }
            Operation::Create => args.push("--create".to_string()),
            Operation::Remove => args.push("--remove".to_string()),
            Operation::Rename { from } => args.push(format!("--rename-from={from}")),
            Operation::Update { force } => {
                if *force {
                    args.push("--force".to_string());
                }
                args.push("--update".to_string());
            }
            Operation::ImportCatalog => {
                args.push("--import".to_string());
                args.push("-".to_string());
            }
        }
    }
    args.push(vm_name.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(event: &str) -> Vec<Operation> {
        operations_for(&event.parse().unwrap())
    }

    #[test]
    fn test_lifecycle_events() {
        assert_eq!(
            ops("domain-create-on-disk"),
            vec![Operation::Init { source: None }, Operation::Create]
        );
        assert_eq!(
            ops("domain-clone-files:work"),
            vec![
                Operation::Init {
                    source: Some("work".to_string())
                },
                Operation::Create
            ]
        );
        assert_eq!(ops("domain-remove-from-disk"), vec![Operation::Remove]);
        assert_eq!(
            ops("domain-renamed:work"),
            vec![
                Operation::Rename {
                    from: "work".to_string()
                },
                Operation::Create
            ]
        );
    }

    #[test]
    fn test_property_and_feature_events() {
        assert_eq!(ops("property-set:label"), vec![Operation::Update { force: true }]);
        assert_eq!(
            ops("property-set:provides_network"),
            vec![Operation::Update { force: true }]
        );
        assert!(ops("property-set:memory").is_empty());
        assert_eq!(
            ops("domain-feature-delete:appmenus-dispvm"),
            vec![Operation::Update { force: true }]
        );
        assert_eq!(ops("domain-feature-set:internal"), vec![Operation::Remove]);
        assert_eq!(ops("domain-feature-delete:internal"), vec![Operation::Create]);
        assert!(ops("domain-feature-set:gui").is_empty());
    }

    #[test]
    fn test_bad_events() {
        assert!("domain-clone-files".parse::<HostEvent>().is_err());
        assert!("domain-renamed".parse::<HostEvent>().is_err());
        assert!("domain-started".parse::<HostEvent>().is_err());
    }

    #[test]
    fn test_command_line() {
        assert_eq!(
            command_line(&ops("domain-clone-files:work"), "copy"),
            vec!["qvm-appmenus", "--quiet", "--init", "--source=work", "--create", "copy"]
        );
        assert_eq!(
            command_line(&ops("template-postinstall"), "fedora"),
            vec!["qvm-appmenus", "--quiet", "--import", "-", "--update", "fedora"]
        );
        assert_eq!(
            command_line(&ops("domain-renamed:work"), "personal"),
            vec!["qvm-appmenus", "--quiet", "--rename-from=work", "--create", "personal"]
        );
    }
}
