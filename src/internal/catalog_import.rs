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

use crate::internal::helpers::list_file_names;
use crate::internal::render::write_if_changed;
use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Keys kept from a VM's desktop files. Localized variants are dropped.
const KEPT_KEYS: [&str; 6] = ["Name", "GenericName", "Comment", "Categories", "Exec", "Icon"];

/// An application as reported by the VM, before it becomes a catalog template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationEntry {
    /// Desktop file name without `.desktop`, e.g. `org.gnome.Cheese`.
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

/// Ids become file names in the catalog, so they must stay a single plain
/// path component.
pub fn is_valid_app_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains("..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

/// Parses `<file>.desktop:<Key>=<Value>` lines into entries keyed by id.
/// Lines with an unusable id are dropped.
pub fn parse_appmenus(input: &str) -> BTreeMap<String, ApplicationEntry> {
    let mut entries: BTreeMap<String, ApplicationEntry> = BTreeMap::new();
    let mut rejected = BTreeSet::new();

    for line in input.lines() {
        let Some((file, pair)) = line.split_once(':') else {
            continue;
        };
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !KEPT_KEYS.contains(&key) {
            continue;
        }
        let Some(id) = file.trim().strip_suffix(".desktop") else {
            continue;
        };
        if !is_valid_app_id(id) {
            if rejected.insert(id.to_string()) {
                warn!("Skipping application with invalid id '{}'", id.escape_debug());
            }
            continue;
        }

        entries
            .entry(id.to_string())
            .or_insert_with(|| ApplicationEntry {
                id: id.to_string(),
                ..Default::default()
            })
            .attributes
            .insert(key.to_string(), value.trim().to_string());
    }

    entries
}

/// Catalog template for one application.
///
/// `legacy` keeps the VM's own `Exec` line wrapped in `qvm-run` instead of
/// starting the app through the `qubes.StartApp` service; such templates
/// have no disposable variant.
pub fn template_text(entry: &ApplicationEntry, legacy: bool) -> Result<String> {
    let id = &entry.id;
    if !is_valid_app_id(id) {
        return Err(anyhow!("Invalid application id '{}'", id.escape_debug()));
    }
    let attr = |key: &str| entry.attributes.get(key).map(String::as_str);

    let name = attr("Name").ok_or_else(|| anyhow!("Application '{id}' has no Name"))?;

    let mut lines = vec![
        "[Desktop Entry]".to_string(),
        "Version=1.0".to_string(),
        "Type=Application".to_string(),
        "Terminal=false".to_string(),
        "X-Qubes-VmName=%VMNAME%".to_string(),
    ];
    if attr("Icon").is_some() {
        lines.push(format!("Icon=%VMDIR%/apps.icons/{id}.png"));
    }
    lines.push(format!("Name=%VMNAME%: {name}"));
    if let Some(generic) = attr("GenericName") {
        lines.push(format!("GenericName=%VMNAME%: {generic}"));
    }
    if let Some(comment) = attr("Comment") {
        lines.push(format!("Comment={comment}"));
    }

    let mut categories = attr("Categories").unwrap_or_default().to_string();
    if !categories.is_empty() && !categories.ends_with(';') {
        categories.push(';');
    }
    lines.push(format!("Categories={categories}X-Qubes-VM;"));

    if legacy {
        let exec = attr("Exec").ok_or_else(|| anyhow!("Application '{id}' has no Exec"))?;
        lines.push(format!("Exec=qvm-run -q -a %VMNAME% -- '{exec}'"));
    } else {
        lines.push(format!(
            "Exec=qvm-run -q -a --service -- %VMNAME% qubes.StartApp+{id}"
        ));
        lines.push(format!(
            "X-Qubes-DispvmExec=qvm-run -q -a --service --dispvm=%VMNAME% -- qubes.StartApp+{id}"
        ));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Ok(text)
}

/// Replaces the catalog in `templates_dir` with `entries`.
/// Returns whether any template was written or removed.
pub fn import_catalog(
    templates_dir: &Path,
    entries: &BTreeMap<String, ApplicationEntry>,
    legacy: bool,
) -> Result<bool> {
    std::fs::create_dir_all(templates_dir)
        .context(format!("Failed to create {}", templates_dir.display()))?;

    let mut changed = false;
    let mut written = Vec::new();
    for entry in entries.values() {
        let text = match template_text(entry, legacy) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping application: {e:#}");
                continue;
            }
        };
        let file_name = format!("{}.desktop", entry.id);
        changed |= write_if_changed(&text, &templates_dir.join(&file_name))?;
        written.push(file_name);
    }

    for file_name in list_file_names(templates_dir)? {
        if !file_name.ends_with(".desktop") || written.contains(&file_name) {
            continue;
        }
        info!("Removing application template {file_name}");
        std::fs::remove_file(templates_dir.join(&file_name))
            .context(format!("Failed to remove template {file_name}"))?;
        changed = true;
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INPUT: &str = "\
org.gnome.Nautilus.desktop:Name=Files
org.gnome.Nautilus.desktop:Name[de]=Dateien
org.gnome.Nautilus.desktop:Comment=Access and organize files
org.gnome.Nautilus.desktop:Exec=qubes-desktop-run /usr/share/applications/org.gnome.Nautilus.desktop
org.gnome.Nautilus.desktop:Icon=system-file-manager
org.gnome.Nautilus.desktop:Keywords=folder;manager;
evince.desktop:Name=Document Viewer
evince.desktop:Comment=View multi-page documents
evince.desktop:Categories=GNOME;GTK;Office;Viewer;Graphics;2DGraphics;VectorGraphics;
evince.desktop:Exec=qubes-desktop-run /usr/share/applications/evince.desktop
evince.desktop:Icon=evince
garbage line
";

    fn evince() -> ApplicationEntry {
        parse_appmenus(INPUT).remove("evince").unwrap()
    }

    #[test]
    fn test_parse_appmenus() {
        let entries = parse_appmenus(INPUT);
        assert_eq!(entries.len(), 2);

        let nautilus = &entries["org.gnome.Nautilus"];
        assert_eq!(nautilus.attributes["Name"], "Files");
        assert_eq!(nautilus.attributes["Icon"], "system-file-manager");
        assert!(!nautilus.attributes.contains_key("Keywords"));
        assert!(!nautilus.attributes.contains_key("Name[de]"));
    }

    #[test]
    fn test_template_text() {
        let expected = "[Desktop Entry]\n\
            Version=1.0\n\
            Type=Application\n\
            Terminal=false\n\
            X-Qubes-VmName=%VMNAME%\n\
            Icon=%VMDIR%/apps.icons/evince.png\n\
            Name=%VMNAME%: Document Viewer\n\
            Comment=View multi-page documents\n\
            Categories=GNOME;GTK;Office;Viewer;Graphics;2DGraphics;VectorGraphics;X-Qubes-VM;\n\
            Exec=qvm-run -q -a --service -- %VMNAME% qubes.StartApp+evince\n\
            X-Qubes-DispvmExec=qvm-run -q -a --service --dispvm=%VMNAME% -- qubes.StartApp+evince\n";
        assert_eq!(template_text(&evince(), false).unwrap(), expected);
    }

    #[test]
    fn test_template_text_legacy() {
        let text = template_text(&evince(), true).unwrap();
        assert!(text.ends_with(
            "Exec=qvm-run -q -a %VMNAME% -- 'qubes-desktop-run /usr/share/applications/evince.desktop'\n"
        ));
        assert!(!text.contains("X-Qubes-DispvmExec"));
    }

    #[test]
    fn test_import_catalog_replaces_old_templates() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("apps.templates");
        std::fs::create_dir_all(&templates).unwrap();
        std::fs::write(templates.join("gone.desktop"), "old").unwrap();

        let mut entries = parse_appmenus(INPUT);
        entries.insert(
            "nameless".to_string(),
            ApplicationEntry {
                id: "nameless".to_string(),
                ..Default::default()
            },
        );

        assert!(import_catalog(&templates, &entries, false).unwrap());
        assert_eq!(
            list_file_names(&templates).unwrap(),
            vec!["evince.desktop", "org.gnome.Nautilus.desktop"]
        );
        assert!(!import_catalog(&templates, &entries, false).unwrap());
    }

    #[test]
    fn test_app_id_validation() {
        assert!(is_valid_app_id("org.gnome.Nautilus"));
        assert!(is_valid_app_id("libreoffice-writer"));
        assert!(is_valid_app_id("c++-ide_2"));
        assert!(!is_valid_app_id(""));
        assert!(!is_valid_app_id("../../../escaped"));
        assert!(!is_valid_app_id("sub/dir"));
        assert!(!is_valid_app_id(".hidden"));
        assert!(!is_valid_app_id("a..b"));
        assert!(!is_valid_app_id("with space"));
        assert!(!is_valid_app_id("tab\there"));
    }

    #[test]
    fn test_import_skips_ids_escaping_the_catalog() {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("base/fedora/apps.templates");
        let input = "\
../../../escaped.desktop:Name=Evil
../../../escaped.desktop:Exec=rm -rf ~
sub/dir.desktop:Name=Nested
evince.desktop:Name=Document Viewer
";

        let mut entries = parse_appmenus(input);
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["evince"]);

        // Entries built by hand go through the same check when written
        entries.insert(
            "../escaped".to_string(),
            ApplicationEntry {
                id: "../escaped".to_string(),
                attributes: BTreeMap::from([("Name".to_string(), "Evil".to_string())]),
            },
        );
        assert!(template_text(&entries["../escaped"], false).is_err());

        assert!(import_catalog(&templates, &entries, false).unwrap());
        assert_eq!(list_file_names(&templates).unwrap(), vec!["evince.desktop"]);
        assert!(!dir.path().join("escaped.desktop").exists());
        assert!(!dir.path().join("base/fedora/escaped.desktop").exists());
        assert!(!dir.path().join("base/escaped.desktop").exists());
    }
}
