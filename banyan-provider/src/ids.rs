//! Composite identifiers

use std::fmt;
use std::str::FromStr;

const SEPARATOR: &str = "..";

/// State id of a policy attachment: `<policy_id>..<attached_to_type>..<attached_to_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyAttachmentId {
    pub policy_id: String,
    pub attached_to_type: String,
    pub attached_to_id: String,
}

impl PolicyAttachmentId {
    pub fn new(
        policy_id: impl Into<String>,
        attached_to_type: impl Into<String>,
        attached_to_id: impl Into<String>,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            attached_to_type: attached_to_type.into(),
            attached_to_id: attached_to_id.into(),
        }
    }
}

impl fmt::Display for PolicyAttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.policy_id,
            self.attached_to_type,
            self.attached_to_id,
            sep = SEPARATOR
        )
    }
}

impl FromStr for PolicyAttachmentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(SEPARATOR).collect();
        match parts.as_slice() {
            [policy, kind, target] if !policy.is_empty() && !kind.is_empty() && !target.is_empty() => {
                Ok(Self::new(*policy, *kind, *target))
            }
            _ => Err(format!(
                "invalid policy attachment id '{}', expected <policy_id>..<attached_to_type>..<attached_to_id>",
                s
            )),
        }
    }
}
