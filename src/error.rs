use thiserror::Error;

use crate::groups::GroupId;
use crate::topology::FaceId;

/// Top-level error type for the papercut engine.
#[derive(Debug, Error)]
pub enum PapercutError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("malformed group list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to topology and scene lookups.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("face {0} is outside the topology")]
    FaceOutOfRange(FaceId),
}

/// Rejections of group partition mutations.
///
/// A rejected operation never mutates the partition; the message is meant
/// to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("would disconnect source group {group}")]
    WouldDisconnectSource { face: FaceId, group: GroupId },

    #[error("no shared edge between face {face} and group {group}")]
    NoSharedEdge { face: FaceId, group: GroupId },

    #[error("would disconnect group {group}")]
    WouldDisconnectGroup { face: FaceId, group: GroupId },

    #[error("face {face} is not a member of group {group}")]
    FaceNotInGroup { face: FaceId, group: GroupId },

    #[error("group {0} does not exist")]
    GroupNotFound(GroupId),

    #[error("cannot delete the only remaining group")]
    LastGroup,

    #[error("face {0} is outside the topology")]
    FaceOutOfRange(FaceId),
}

/// Problems found while validating an imported group list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("group id 0 is not a valid group id")]
    ZeroGroupId,

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("group {0} appears more than once")]
    DuplicateGroup(GroupId),

    #[error("face {face} of group {group} is outside the topology")]
    FaceOutOfRange { face: FaceId, group: GroupId },

    #[error("face {face} is claimed by groups {first} and {second}")]
    DuplicateFace {
        face: FaceId,
        first: GroupId,
        second: GroupId,
    },

    #[error("group {0} is not edge-connected")]
    Disconnected(GroupId),
}

/// Convenience type alias for results using [`PapercutError`].
pub type Result<T> = std::result::Result<T, PapercutError>;
