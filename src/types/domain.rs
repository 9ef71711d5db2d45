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

use crate::types::local_settings::InternalFlagSource;
use crate::types::{Label, VirtMode};
use std::collections::BTreeMap;

/// Feature enabling menu entries that launch in a disposable VM.
pub const FEATURE_APPMENUS_DISPVM: &str = "appmenus-dispvm";
/// Feature hiding a VM from the menu entirely.
pub const FEATURE_INTERNAL: &str = "internal";

#[derive(Debug, Clone, PartialEq)]
pub enum DomainKind {
    /// Owns its catalog, is not a template for anything.
    Standalone,
    /// Owns its catalog and shares it with the VMs based on it.
    Template,
    /// Borrows the catalog of its template.
    AppVm { template: Box<Domain> },
    /// Short-lived instance based on a disposable template (itself an AppVm).
    DispVm { template: Box<Domain> },
}

/// A VM with its template chain already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub name: String,
    pub kind: DomainKind,
    pub label: Label,
    pub provides_network: bool,
    pub virt_mode: VirtMode,
    pub internal: bool,
    pub features: BTreeMap<String, String>,
}

impl Domain {
    pub fn new(name: impl Into<String>, kind: DomainKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: Label::default(),
            provides_network: false,
            virt_mode: VirtMode::default(),
            internal: false,
            features: BTreeMap::new(),
        }
    }

    /// Whether the VM keeps its own catalog (`apps.templates`, `apps.tempicons`).
    pub fn updateable(&self) -> bool {
        matches!(self.kind, DomainKind::Standalone | DomainKind::Template)
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, DomainKind::Template)
    }

    pub fn is_disposable(&self) -> bool {
        matches!(self.kind, DomainKind::DispVm { .. })
    }

    pub fn template(&self) -> Option<&Domain> {
        match &self.kind {
            DomainKind::AppVm { template } | DomainKind::DispVm { template } => Some(template),
            DomainKind::Standalone | DomainKind::Template => None,
        }
    }

    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }

    /// Looks the feature up on this VM first, then along the template chain.
    pub fn feature_with_template(&self, name: &str) -> Option<&str> {
        self.feature(name)
            .or_else(|| self.template().and_then(|t| t.feature_with_template(name)))
    }

    pub fn dispvm_menus_enabled(&self) -> bool {
        self.feature_with_template(FEATURE_APPMENUS_DISPVM)
            .is_some_and(is_truthy)
    }

    pub fn is_internal(&self, source: InternalFlagSource) -> bool {
        match source {
            InternalFlagSource::Property => self.internal,
            InternalFlagSource::Feature => self.feature(FEATURE_INTERNAL).is_some_and(is_truthy),
        }
    }

    /// Internal VMs and disposable instances never get menu entries.
    pub fn excluded_from_menu(&self, source: InternalFlagSource) -> bool {
        self.is_disposable() || self.is_internal(source)
    }
}

/// Feature values are strings; empty, `0` and `false` count as unset.
pub fn is_truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false" | "False")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Domain {
        Domain::new("fedora", DomainKind::Template)
    }

    #[test]
    fn test_updateable_by_kind() {
        let appvm = Domain::new(
            "work",
            DomainKind::AppVm {
                template: Box::new(template()),
            },
        );
        assert!(template().updateable());
        assert!(Domain::new("sa", DomainKind::Standalone).updateable());
        assert!(!appvm.updateable());
        assert_eq!(appvm.template().map(|t| t.name.as_str()), Some("fedora"));
    }

    #[test]
    fn test_feature_with_template_falls_back() {
        let mut tpl = template();
        tpl.features
            .insert(FEATURE_APPMENUS_DISPVM.to_string(), "1".to_string());
        let mut appvm = Domain::new(
            "work",
            DomainKind::AppVm {
                template: Box::new(tpl),
            },
        );
        assert!(appvm.dispvm_menus_enabled());

        appvm
            .features
            .insert(FEATURE_APPMENUS_DISPVM.to_string(), String::new());
        assert!(!appvm.dispvm_menus_enabled());
    }

    #[test]
    fn test_internal_flag_source() {
        let mut vm = template();
        vm.internal = true;
        assert!(vm.is_internal(InternalFlagSource::Property));
        assert!(!vm.is_internal(InternalFlagSource::Feature));

        vm.features
            .insert(FEATURE_INTERNAL.to_string(), "1".to_string());
        vm.internal = false;
        assert!(vm.is_internal(InternalFlagSource::Feature));
    }

    #[test]
    fn test_disposable_excluded_from_menu() {
        let dvm_template = Domain::new(
            "fedora-dvm",
            DomainKind::AppVm {
                template: Box::new(template()),
            },
        );
        let disp = Domain::new(
            "disp1234",
            DomainKind::DispVm {
                template: Box::new(dvm_template),
            },
        );
        assert!(disp.excluded_from_menu(InternalFlagSource::Feature));
        assert!(!template().excluded_from_menu(InternalFlagSource::Feature));
    }
}
