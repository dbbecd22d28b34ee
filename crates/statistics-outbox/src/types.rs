//! Core identifier and recipient types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Correlation identifier linking an uploaded bundle to its acknowledgement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl MessageId {
    /// Returns the raw integer value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MessageId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Addressable recipient of statistic summaries (a player UUID string).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub String);

impl RecipientId {
    /// Creates a new random recipient ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a recipient ID from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the recipient ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecipientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecipientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Immutable snapshot of the recipients interested in one bundle.
///
/// Cloning shares the underlying slice. Duplicates are removed on
/// construction, first occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipientSet(Arc<[RecipientId]>);

impl RecipientSet {
    /// Snapshot the given recipients.
    pub fn new(recipients: impl IntoIterator<Item = RecipientId>) -> Self {
        let mut unique: Vec<RecipientId> = Vec::new();
        for recipient in recipients {
            if !unique.contains(&recipient) {
                unique.push(recipient);
            }
        }
        Self(unique.into())
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, recipient: &RecipientId) -> bool {
        self.0.contains(recipient)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecipientId> {
        self.0.iter()
    }
}

impl FromIterator<RecipientId> for RecipientSet {
    fn from_iter<I: IntoIterator<Item = RecipientId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a RecipientSet {
    type Item = &'a RecipientId;
    type IntoIter = std::slice::Iter<'a, RecipientId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
