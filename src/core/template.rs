use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Pre/post wrapping applied around a message for one role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleTemplate {
    pub pre_message: String,
    pub post_message: String,
}

/// A prompt template: per-role pre/post message wrapping.
///
/// Roles without an entry pass their text through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    roles: HashMap<String, RoleTemplate>,
}

impl PromptTemplate {
    /// The trivial template: a `user` role entry with empty pre/post, so
    /// user messages are submitted exactly as given.
    pub fn passthrough() -> Self {
        Self::default().with_role("user", "", "")
    }

    /// Add or replace the wrapping for a role. Returns `self` for chaining.
    pub fn with_role(
        mut self,
        role: impl Into<String>,
        pre: impl Into<String>,
        post: impl Into<String>,
    ) -> Self {
        self.roles.insert(
            role.into(),
            RoleTemplate {
                pre_message: pre.into(),
                post_message: post.into(),
            },
        );
        self
    }

    /// Wrap `text` with the pre/post strings registered for `role`.
    pub fn apply(&self, role: &str, text: &str) -> String {
        match self.roles.get(role) {
            Some(t) if !t.pre_message.is_empty() || !t.post_message.is_empty() => {
                format!("{}{}{}", t.pre_message, text, t.post_message)
            }
            _ => text.to_string(),
        }
    }
}
