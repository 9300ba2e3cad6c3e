use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account role. Stored and transmitted as the lowercase token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Petitioner,
    Admin,
    Clerk,
    Speaker,
    Committee,
}

/// Something a route needs the caller to be able to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitPetition,
    ReviewPetitions,
    RecordStatusChange,
    ManageUsers,
    UploadFiles,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Petitioner,
        Role::Admin,
        Role::Clerk,
        Role::Speaker,
        Role::Committee,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Petitioner => "petitioner",
            Role::Admin => "admin",
            Role::Clerk => "clerk",
            Role::Speaker => "speaker",
            Role::Committee => "committee",
        }
    }

    /// The one authorization rule every route goes through.
    pub fn allows(self, capability: Capability) -> bool {
        use Capability::*;

        match capability {
            SubmitPetition => matches!(self, Role::Petitioner | Role::Admin),
            ReviewPetitions => !matches!(self, Role::Petitioner),
            RecordStatusChange => matches!(self, Role::Clerk | Role::Admin),
            ManageUsers => matches!(self, Role::Admin),
            UploadFiles => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
