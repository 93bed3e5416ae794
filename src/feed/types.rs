use chrono::{DateTime, Utc};

// ============================================================================
// Timeline Entry Types
// ============================================================================

/// Who produced a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The local account holder.
    LocalUser,
    /// The contact on the other side of the conversation.
    Counterparty,
    /// Synthesized lifecycle content, not present upstream.
    System,
}

/// How a timeline entry is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular chat message bubble.
    Text,
    /// A short centered pill (assignment changes and similar).
    Note,
    /// A bordered lifecycle banner (conversation opened/closed).
    Event,
}

/// One item of the conversation timeline.
///
/// Entries are immutable once assembled; the store only ever adds whole
/// chunks in front of existing content, so rendered entries never change
/// shape under the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Unique within one feed identity. Real entries carry the upstream id;
    /// synthetic entries derive theirs from the neighboring real entry.
    pub id: String,
    /// Display text, whitespace-normalized at assembly time.
    pub text: String,
    pub sender: Sender,
    pub kind: EntryKind,
    /// Display timestamp; ordering within a chunk only.
    pub timestamp: DateTime<Utc>,
}

impl FeedEntry {
    /// True for entries synthesized by the assembler rather than fetched.
    pub fn is_synthetic(&self) -> bool {
        self.sender == Sender::System
    }
}
