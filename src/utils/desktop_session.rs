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

use std::env;
use std::sync::OnceLock;

/// Desktop environment facts that decide which caches must be poked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopSession {
    /// `KDE_SESSION_VERSION` when running under KDE.
    pub kde_version: Option<String>,
    pub plasma: bool,
}

impl DesktopSession {
    pub fn from_vars(
        kde_session_uid: Option<&str>,
        kde_session_version: Option<&str>,
        desktop_session: Option<&str>,
    ) -> Self {
        let kde_version =
            kde_session_uid.map(|_| kde_session_version.unwrap_or("4").to_string());

        Self {
            kde_version,
            plasma: desktop_session.is_some_and(|s| s.contains("plasma")),
        }
    }

    /// KDE keeps its own menu database, rebuilt by `kbuildsycoca<N>`.
    pub fn sycoca_command(&self) -> Option<String> {
        self.kde_version
            .as_ref()
            .map(|version| format!("kbuildsycoca{version}"))
    }
}

pub fn get_desktop_session() -> &'static DesktopSession {
    static DESKTOP_SESSION_CACHE: OnceLock<DesktopSession> = OnceLock::new();

    DESKTOP_SESSION_CACHE.get_or_init(|| {
        let uid = env::var("KDE_SESSION_UID").ok();
        let version = env::var("KDE_SESSION_VERSION").ok();
        let session = env::var("DESKTOP_SESSION").ok();
        DesktopSession::from_vars(uid.as_deref(), version.as_deref(), session.as_deref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_kde() {
        let session = DesktopSession::from_vars(None, Some("5"), Some("gnome"));
        assert_eq!(session.sycoca_command(), None);
        assert!(!session.plasma);
    }

    #[test]
    fn test_kde_default_version() {
        let session = DesktopSession::from_vars(Some("1000"), None, None);
        assert_eq!(session.sycoca_command().as_deref(), Some("kbuildsycoca4"));
    }

    #[test]
    fn test_plasma() {
        let session = DesktopSession::from_vars(Some("1000"), Some("5"), Some("plasmawayland"));
        assert_eq!(session.sycoca_command().as_deref(), Some("kbuildsycoca5"));
        assert!(session.plasma);
    }
}
