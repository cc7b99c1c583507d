//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::PathBuf;

use tracing::{error, warn};

use crate::collections::{EdgeIndex, NodeIndex};
use crate::level::LevelNumber;

// Simulator errors.
#[derive(Debug)]
pub enum Error {
    // Topology construction
    TopologyError(TopologyError),
    InvalidLevel(u8),
    DuplicateNode(String),
    DuplicateInterface(String, String),
    // Lookups
    NodeNotFound(String),
    NodeIndexNotFound(NodeIndex),
    EdgeNotFound(String, String),
    EdgeIndexNotFound(EdgeIndex),
    // SPF
    SpfRootOverloaded(String, LevelNumber),
    SpfRootPseudonode(String, LevelNumber),
    SpfRootLevelMismatch(String, LevelNumber),
    DistancePseudonodePair(String, String),
    // Fast reroute
    ProtectedEdgeNotLocal(String, String),
    ProtectedEdgeInactive(String, String, LevelNumber),
}

// Errors that occur while loading a topology description.
#[derive(Debug)]
pub enum TopologyError {
    ReadError(PathBuf, std::io::Error),
    TomlError(toml::de::Error),
    JsonError(serde_json::Error),
    UnknownFormat(PathBuf),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::TopologyError(error) => {
                error.log();
            }
            Error::InvalidLevel(level) => {
                warn!(%level, "{}", self);
            }
            Error::DuplicateNode(name) | Error::NodeNotFound(name) => {
                warn!(%name, "{}", self);
            }
            Error::DuplicateInterface(name, ifname)
            | Error::EdgeNotFound(name, ifname) => {
                warn!(%name, %ifname, "{}", self);
            }
            Error::NodeIndexNotFound(node_idx) => {
                warn!(?node_idx, "{}", self);
            }
            Error::EdgeIndexNotFound(edge_idx) => {
                warn!(?edge_idx, "{}", self);
            }
            Error::SpfRootOverloaded(name, level)
            | Error::SpfRootPseudonode(name, level)
            | Error::SpfRootLevelMismatch(name, level) => {
                warn!(%name, %level, "{}", self);
            }
            Error::DistancePseudonodePair(source, dest) => {
                error!(%source, %dest, "{}", self);
            }
            Error::ProtectedEdgeNotLocal(name, ifname) => {
                warn!(%name, %ifname, "{}", self);
            }
            Error::ProtectedEdgeInactive(name, ifname, level) => {
                warn!(%name, %ifname, %level, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TopologyError(error) => error.fmt(f),
            Error::InvalidLevel(..) => {
                write!(f, "invalid level number")
            }
            Error::DuplicateNode(..) => {
                write!(f, "duplicate node name")
            }
            Error::DuplicateInterface(..) => {
                write!(f, "duplicate interface name")
            }
            Error::NodeNotFound(..) => {
                write!(f, "node not found")
            }
            Error::NodeIndexNotFound(..) => {
                write!(f, "node index not found")
            }
            Error::EdgeNotFound(..) => {
                write!(f, "edge not found")
            }
            Error::EdgeIndexNotFound(..) => {
                write!(f, "edge index not found")
            }
            Error::SpfRootOverloaded(..) => {
                write!(f, "SPF root is overloaded")
            }
            Error::SpfRootPseudonode(..) => {
                write!(f, "SPF root is a pseudo-node")
            }
            Error::SpfRootLevelMismatch(..) => {
                write!(f, "SPF root doesn't participate in the level")
            }
            Error::DistancePseudonodePair(..) => {
                write!(f, "distance between two pseudo-nodes is undefined")
            }
            Error::ProtectedEdgeNotLocal(..) => {
                write!(f, "protected edge doesn't belong to the computing node")
            }
            Error::ProtectedEdgeInactive(..) => {
                write!(f, "protected edge isn't active in the level")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TopologyError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TopologyError> for Error {
    fn from(error: TopologyError) -> Error {
        Error::TopologyError(error)
    }
}

// ===== impl TopologyError =====

impl TopologyError {
    pub(crate) fn log(&self) {
        match self {
            TopologyError::ReadError(path, error) => {
                warn!(path = %path.display(), error = %with_source(error), "{}", self);
            }
            TopologyError::TomlError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            TopologyError::JsonError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            TopologyError::UnknownFormat(path) => {
                warn!(path = %path.display(), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::ReadError(..) => {
                write!(f, "failed to read topology file")
            }
            TopologyError::TomlError(..) => {
                write!(f, "failed to parse TOML topology")
            }
            TopologyError::JsonError(..) => {
                write!(f, "failed to parse JSON topology")
            }
            TopologyError::UnknownFormat(..) => {
                write!(f, "unknown topology file format")
            }
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopologyError::ReadError(_, error) => Some(error),
            TopologyError::TomlError(error) => Some(error),
            TopologyError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for TopologyError {
    fn from(error: toml::de::Error) -> TopologyError {
        TopologyError::TomlError(error)
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(error: serde_json::Error) -> TopologyError {
        TopologyError::JsonError(error)
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
