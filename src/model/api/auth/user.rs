use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::db::voter::VoterCore;

/// Different privilege levels, ordered from least to most privileged.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Admin = 1,
}

impl Rights {
    /// The rights held by the given voter account.
    pub fn of(voter: &VoterCore) -> Self {
        if voter.is_admin {
            Self::Admin
        } else {
            Self::Voter
        }
    }
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

/// A role an endpoint can demand of its caller.
pub trait Role {
    /// The minimum rights needed to act in this role.
    const RIGHTS: Rights;
}

/// Any signed-in user.
pub enum VoterRole {}

impl Role for VoterRole {
    const RIGHTS: Rights = Rights::Voter;
}

/// Signed-in administrators only.
pub enum AdminRole {}

impl Role for AdminRole {
    const RIGHTS: Rights = Rights::Admin;
}
