use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Processing status of a submitted petition.
///
/// Stored and serialized as the upper-snake token (`UNDER_REVIEW`). Parsing
/// also accepts the human label shown to clerks ("Under Review") and a few
/// legacy spellings, so every status a clerk can pick maps onto exactly one
/// variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum PetitionStatus {
    #[default]
    Pending,
    Submitted,
    UnderReview,
    AwaitingResponse,
    ForwardedToSpeaker,
    ForwardedToSenateClerk,
    ReferredToCommittee,
    ReturnedForAmendment,
    InProgress,
    OnHold,
    Approved,
    Rejected,
    Resolved,
    Withdrawn,
    Cancelled,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown petition status '{0}'")]
pub struct UnknownStatus(pub String);

impl PetitionStatus {
    pub const ALL: [PetitionStatus; 16] = [
        PetitionStatus::Pending,
        PetitionStatus::Submitted,
        PetitionStatus::UnderReview,
        PetitionStatus::AwaitingResponse,
        PetitionStatus::ForwardedToSpeaker,
        PetitionStatus::ForwardedToSenateClerk,
        PetitionStatus::ReferredToCommittee,
        PetitionStatus::ReturnedForAmendment,
        PetitionStatus::InProgress,
        PetitionStatus::OnHold,
        PetitionStatus::Approved,
        PetitionStatus::Rejected,
        PetitionStatus::Resolved,
        PetitionStatus::Withdrawn,
        PetitionStatus::Cancelled,
        PetitionStatus::Archived,
    ];

    pub fn as_str(self) -> &'static str {
        use PetitionStatus::*;

        match self {
            Pending => "PENDING",
            Submitted => "SUBMITTED",
            UnderReview => "UNDER_REVIEW",
            AwaitingResponse => "AWAITING_RESPONSE",
            ForwardedToSpeaker => "FORWARDED_TO_SPEAKER",
            ForwardedToSenateClerk => "FORWARDED_TO_SENATE_CLERK",
            ReferredToCommittee => "REFERRED_TO_COMMITTEE",
            ReturnedForAmendment => "RETURNED_FOR_AMENDMENT",
            InProgress => "IN_PROGRESS",
            OnHold => "ON_HOLD",
            Approved => "APPROVED",
            Rejected => "REJECTED",
            Resolved => "RESOLVED",
            Withdrawn => "WITHDRAWN",
            Cancelled => "CANCELLED",
            Archived => "ARCHIVED",
        }
    }

    /// Label used as the default verification step title.
    pub fn label(self) -> &'static str {
        use PetitionStatus::*;

        match self {
            Pending => "Pending",
            Submitted => "Submitted",
            UnderReview => "Under Review",
            AwaitingResponse => "Awaiting Response",
            ForwardedToSpeaker => "Application Accepted - Forwarded to Speaker",
            ForwardedToSenateClerk => "Application Forwarded to Clerk of the Senate",
            ReferredToCommittee => "Referred to Committee",
            ReturnedForAmendment => "Application Returned for Amendment",
            InProgress => "In Progress",
            OnHold => "On Hold",
            Approved => "Approved",
            Rejected => "Rejected",
            Resolved => "Resolved",
            Withdrawn => "Withdrawn",
            Cancelled => "Cancelled",
            Archived => "Archived",
        }
    }

    fn from_alias(token: &str) -> Option<Self> {
        match token {
            "FORWARDED" => Some(PetitionStatus::ForwardedToSpeaker),
            "COMPLETED" => Some(PetitionStatus::Resolved),
            "CANCELED" => Some(PetitionStatus::Cancelled),
            _ => None,
        }
    }
}

/// Upper-case, with every run of non-alphanumerics collapsed to `_`.
fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

impl FromStr for PetitionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize(s);
        PetitionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == token || normalize(status.label()) == token)
            .or_else(|| PetitionStatus::from_alias(&token))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl TryFrom<String> for PetitionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PetitionStatus> for &'static str {
    fn from(status: PetitionStatus) -> Self {
        status.as_str()
    }
}

impl fmt::Display for PetitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
