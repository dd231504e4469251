//! Webhook related structures

use crate::error::HookError;

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Data extracted from a push event payload
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub owner: String,
    pub name: String,
    pub git_ref: String,
}

impl PushEvent {
    /// Extract the fields needed for repository resolution.
    /// The owner is `repository.owner.name`, or `login` when `name` is absent.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, HookError> {
        let repository = payload
            .get("repository")
            .ok_or_else(|| HookError::InvalidPayload("missing repository".into()))?;

        let name = repository
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| HookError::InvalidPayload("missing repository.name".into()))?;

        let owner = repository
            .get("owner")
            .and_then(|o| o.get("name").or_else(|| o.get("login")))
            .and_then(|n| n.as_str())
            .ok_or_else(|| HookError::InvalidPayload("missing repository.owner.name".into()))?;

        let git_ref = payload
            .get("ref")
            .and_then(|r| r.as_str())
            .ok_or_else(|| HookError::InvalidPayload("missing ref".into()))?;

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            git_ref: git_ref.to_string(),
        })
    }

    /// Branch name when the ref is `refs/heads/<branch>`.
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix(BRANCH_REF_PREFIX)
    }
}
