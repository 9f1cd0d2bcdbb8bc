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

//! Dice notation

use crate::rng::RngHandle;
use dotpipe_common::{PipeError, PipeResult};
use std::fmt;
use std::str::FromStr;

/// `count` dice with `sides` faces each, plus a flat `modifier`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl Dice {
    pub fn new(count: u32, sides: u32, modifier: i64) -> PipeResult<Self> {
        if count == 0 || sides == 0 {
            return Err(PipeError::argument("roll", "dice count and sides must be positive"));
        }
        let dice = Self { count, sides, modifier };
        let (lowest, highest) = dice.bounds();
        if i64::try_from(lowest).is_err() || i64::try_from(highest).is_err() {
            return Err(PipeError::argument(
                "roll",
                format!("{dice} can total outside the 64-bit integer range"),
            ));
        }
        Ok(dice)
    }

    /// A single die with `sides` faces
    pub fn single(sides: u32) -> PipeResult<Self> {
        Self::new(1, sides, 0)
    }

    /// Smallest and largest possible totals
    fn bounds(&self) -> (i128, i128) {
        let modifier = i128::from(self.modifier);
        let count = i128::from(self.count);
        (count + modifier, count * i128::from(self.sides) + modifier)
    }

    pub fn roll(&self, rng: &RngHandle) -> i64 {
        let faces: i128 = (0..self.count)
            .map(|_| i128::from(rng.randint(1, i64::from(self.sides))))
            .sum();
        let total = faces + i128::from(self.modifier);
        // Only reachable by building a `Dice` literal that `new` would reject
        total.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

impl FromStr for Dice {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipeError::argument("roll", format!("invalid dice notation '{s}'"));
        let s = s.trim();

        let (count, rest) = s.split_once(['d', 'D']).ok_or_else(invalid)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| invalid())?
        };

        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(at) => {
                let (sides, modifier) = rest.split_at(at);
                (sides, modifier.parse::<i64>().map_err(|_| invalid())?)
            }
            None => (rest, 0),
        };
        let sides = sides.parse::<u32>().map_err(|_| invalid())?;

        Self::new(count, sides, modifier)
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notation() {
        assert_eq!("3d6".parse::<Dice>().unwrap(), Dice::new(3, 6, 0).unwrap());
        assert_eq!("1d12+3".parse::<Dice>().unwrap(), Dice::new(1, 12, 3).unwrap());
        assert_eq!("2d8-1".parse::<Dice>().unwrap(), Dice::new(2, 8, -1).unwrap());
        assert_eq!("d20".parse::<Dice>().unwrap(), Dice::single(20).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "6", "3x6", "0d6", "3d0", "3d6+", "3d6+x"] {
            assert!(bad.parse::<Dice>().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_totals_must_fit_in_i64() {
        let err = Dice::new(u32::MAX, u32::MAX, i64::MAX).unwrap_err();
        assert_eq!(err.kind(), dotpipe_common::ErrorKind::ArgumentShape);
        assert!(Dice::new(1, 6, i64::MAX).is_err());
        assert!(format!("1d6+{}", i64::MAX).parse::<Dice>().is_err());

        let edge = Dice::new(1, 1, i64::MAX - 1).unwrap();
        assert_eq!(edge.roll(&RngHandle::seeded(1)), i64::MAX);
        let low = Dice::new(2, 1, i64::MIN).unwrap();
        assert_eq!(low.roll(&RngHandle::seeded(1)), i64::MIN + 2);
    }

    #[test]
    fn test_roll_saturates_for_unchecked_literals() {
        let dice = Dice {
            count: 2,
            sides: 1,
            modifier: i64::MAX,
        };
        assert_eq!(dice.roll(&RngHandle::seeded(1)), i64::MAX);
    }

    #[test]
    fn test_display_round_trips() {
        for notation in ["3d6", "1d12+3", "2d8-1"] {
            assert_eq!(notation.parse::<Dice>().unwrap().to_string(), notation);
        }
    }

    #[test]
    fn test_roll_bounds() {
        let rng = RngHandle::seeded(11);
        let dice = Dice::new(2, 4, 1).unwrap();
        for _ in 0..100 {
            assert!((3..=9).contains(&dice.roll(&rng)));
        }
    }
}
