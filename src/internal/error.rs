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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppMenusError {
    #[error("Creating Disposable VM menu entries not supported by this template ({template})")]
    DispvmNotSupported { template: String },

    #[error("Template '{template}' does not contain a 'Name=%VMNAME%: ' line")]
    MalformedTemplate { template: String },

    #[error("No such domain: {name}")]
    UnknownDomain { name: String },
}
