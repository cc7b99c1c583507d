//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::Error;

// Represent a routing level, or a combination of both of them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LevelType {
    L1,
    L2,
    All,
}

// An iterator over the levels defined by a `LevelType`.
pub struct LevelTypeIterator {
    level_type: LevelType,
    idx: usize,
}

// Represents a single routing level.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LevelNumber {
    L1 = 1,
    L2 = 2,
}

// Container for storing separate values for level 1 and level 2.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Levels<T> {
    pub l1: T,
    pub l2: T,
}

bitflags! {
    // Levels an edge participates in.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct LevelFlags: u8 {
        const L1 = 0x01;
        const L2 = 0x02;
    }
}

// ===== impl LevelType =====

impl LevelType {
    pub fn intersects(&self, level: impl Into<LevelType>) -> bool {
        let level = level.into();
        match self {
            LevelType::L1 => matches!(level, LevelType::L1 | LevelType::All),
            LevelType::L2 => matches!(level, LevelType::L2 | LevelType::All),
            LevelType::All => true,
        }
    }
}

impl From<LevelNumber> for LevelType {
    fn from(level: LevelNumber) -> LevelType {
        match level {
            LevelNumber::L1 => LevelType::L1,
            LevelNumber::L2 => LevelType::L2,
        }
    }
}

impl From<LevelType> for LevelFlags {
    fn from(level_type: LevelType) -> LevelFlags {
        match level_type {
            LevelType::L1 => LevelFlags::L1,
            LevelType::L2 => LevelFlags::L2,
            LevelType::All => LevelFlags::all(),
        }
    }
}

impl IntoIterator for LevelType {
    type Item = LevelNumber;
    type IntoIter = LevelTypeIterator;

    fn into_iter(self) -> Self::IntoIter {
        LevelTypeIterator::new(self)
    }
}

// ===== impl LevelTypeIterator =====

impl LevelTypeIterator {
    const LEVELS: [LevelNumber; 2] = [LevelNumber::L1, LevelNumber::L2];

    fn new(level_type: LevelType) -> Self {
        Self { level_type, idx: 0 }
    }
}

impl Iterator for LevelTypeIterator {
    type Item = LevelNumber;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < Self::LEVELS.len() {
            let level = Self::LEVELS[self.idx];
            self.idx += 1;

            if self.level_type.intersects(level) {
                return Some(level);
            }
        }
        None
    }
}

// ===== impl LevelNumber =====

impl std::fmt::Display for LevelNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl TryFrom<u8> for LevelNumber {
    type Error = Error;

    fn try_from(level: u8) -> Result<LevelNumber, Error> {
        match level {
            1 => Ok(LevelNumber::L1),
            2 => Ok(LevelNumber::L2),
            _ => Err(Error::InvalidLevel(level)),
        }
    }
}

impl From<LevelNumber> for LevelFlags {
    fn from(level: LevelNumber) -> LevelFlags {
        match level {
            LevelNumber::L1 => LevelFlags::L1,
            LevelNumber::L2 => LevelFlags::L2,
        }
    }
}

// ===== impl Levels =====

impl<T> Levels<T> {
    pub fn new(l1: T, l2: T) -> Self {
        Levels { l1, l2 }
    }

    pub fn get(&self, level: impl Into<LevelNumber>) -> &T {
        let level = level.into();
        match level {
            LevelNumber::L1 => &self.l1,
            LevelNumber::L2 => &self.l2,
        }
    }

    pub fn get_mut(&mut self, level: impl Into<LevelNumber>) -> &mut T {
        let level = level.into();
        match level {
            LevelNumber::L1 => &mut self.l1,
            LevelNumber::L2 => &mut self.l2,
        }
    }
}

impl<T: Clone> Levels<T> {
    // Returns a container holding the same value on both levels.
    pub fn both(value: T) -> Self {
        Levels {
            l1: value.clone(),
            l2: value,
        }
    }
}

// ===== impl LevelFlags =====

impl LevelFlags {
    pub fn has_level(&self, level: LevelNumber) -> bool {
        self.contains(LevelFlags::from(level))
    }

    pub fn levels(&self) -> impl Iterator<Item = LevelNumber> + '_ {
        LevelType::All
            .into_iter()
            .filter(move |level| self.has_level(*level))
    }
}

// ===== unit tests =====
