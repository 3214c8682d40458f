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

//! An RFC 8866 session description parser/emitter with the AES67/RAVENNA
//! attribute extensions (`ts-refclk`, `mediaclk`, `clock-domain`,
//! `clock-deviation`, `source-filter`, `group:DUP`, `mid`).

mod emit;
pub mod error;
mod parse;
pub mod types;

pub use emit::emit;
pub use error::{Error, Result};
pub use parse::parse;
pub use types::*;
