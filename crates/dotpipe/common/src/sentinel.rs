// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Sentinel Registry
//!
//! Unique marker values that travel through pipelines without colliding with
//! user data. A sentinel is never produced by converting user data into a
//! [`Value`](crate::value::Value), and `Value::None` is a separate variant, so
//! a sentinel can only appear where the library (or a callback) put one.

use std::fmt;

/// Marker values used by the engine and by individual stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sentinel {
    /// No value was supplied (absent prior result, unbound source)
    Missing,
    /// Drop this entry from the output
    Drop,
    /// Keep this entry unchanged
    Keep,
    /// End of sequence in peek-ahead pairs
    End,
    /// Use the full collection size in a k-selection range
    Pool,
}

pub const MISSING: Sentinel = Sentinel::Missing;
pub const DROP: Sentinel = Sentinel::Drop;
pub const KEEP: Sentinel = Sentinel::Keep;
pub const END: Sentinel = Sentinel::End;
pub const POOL: Sentinel = Sentinel::Pool;

impl Sentinel {
    /// All sentinels, in declaration order
    pub const ALL: [Sentinel; 5] = [MISSING, DROP, KEEP, END, POOL];

    /// Readable name for debugging
    pub fn name(&self) -> &'static str {
        match self {
            Sentinel::Missing => "MISSING",
            Sentinel::Drop => "DROP",
            Sentinel::Keep => "KEEP",
            Sentinel::End => "END",
            Sentinel::Pool => "POOL",
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}
