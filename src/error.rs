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
use std::{io, net::AddrParseError};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid IP address: {0}")]
    InvalidIp(#[from] AddrParseError),
    #[error("NIC with specified name or address not found: {0}")]
    NoSuchNic(String),
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum ClockError {
    #[error("PTP error: {0}")]
    Ptp(#[from] crate::ptp::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("NIC {0} does not support PTP hardware timestamping")]
    PtpNotSupported(String),
    #[error("clock steering error: {0}")]
    Steering(String),
}

impl ClockError {
    pub fn steering<E: std::fmt::Display>(e: E) -> Self {
        ClockError::Steering(e.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ClockResult<T> = Result<T, ClockError>;
