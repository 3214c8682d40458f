/*
 *  Copyright (C) 2025 Michael Bachmann
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU Affero General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU Affero General Public License for more details.
 *
 *  You should have received a copy of the GNU Affero General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("line {line}: malformed '{key}': {reason}")]
    Malformed { line: usize, key: String, reason: String },
    #[error("line {line}: unknown network type '{nettype}'")]
    UnknownNetworkType { line: usize, nettype: String },
    #[error("line {line}: unknown address type '{addrtype}'")]
    UnknownAddressType { line: usize, addrtype: String },
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("attribute '{key}' appeared before any media description and is not a session-scope attribute")]
    AttributeOutOfScope { key: String },
}

pub type Result<T> = std::result::Result<T, Error>;
