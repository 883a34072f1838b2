//! The statistics aggregate and its accumulation operations.
//!
//! [`StatsAggregate`] is the sole mutable entity of the pipeline: one
//! instance per run, written by exactly one owner, returned by value once the
//! fetch phase completes. All counting operations are additive - recording
//! the same message twice counts it twice.
//!
//! # Example
//!
//! ```
//! use mailbox_stats::{Address, Envelope, MessageMetadata, StatsAggregate};
//!
//! let mut aggregate = StatsAggregate::new();
//! let message = MessageMetadata {
//!     seq: 1,
//!     size: Some(13009),
//!     envelope: Some(Envelope {
//!         subject: Some("New sign-in from [Chrome] on [Mac]".into()),
//!         from: vec![Address {
//!             name: Some("Google".into()),
//!             address: Some("no-reply@accounts.google.com".into()),
//!         }],
//!     }),
//! };
//!
//! aggregate.process_message(&message).expect("well-formed message");
//! assert_eq!(aggregate.tag_counts().get("[Chrome]"), Some(&1));
//! assert_eq!(aggregate.sizes(), &[13009]);
//! ```

use crate::error::{Error, Result};
use crate::metadata::MessageMetadata;
use crate::tags::extract_tags;
use indexmap::IndexMap;
use serde::Serialize;

/// In-memory accumulation of counts and size samples across one run.
///
/// Counter maps preserve first-insertion order, which is what makes ranking
/// ties deterministic (see [`rank_descending`](crate::report::rank_descending)).
///
/// Invariants:
/// - the sum of tag counts equals the total tag occurrences seen,
/// - the sum of sender counts equals the number of messages with a non-empty
///   sender,
/// - `sizes.len()` equals the number of processed messages (messages with a
///   missing sender are excluded from the sender counters only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsAggregate {
    tag_counts: IndexMap<String, u64>,
    sender_counts: IndexMap<String, u64>,
    sizes: Vec<u64>,
}

impl StatsAggregate {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of each tag in the sequence.
    ///
    /// Repeated tags each count; the first occurrence of a tag initializes
    /// its counter to 1.
    pub fn record_tags<'a, I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for tag in tags {
            if let Some(count) = self.tag_counts.get_mut(tag) {
                *count += 1;
            } else {
                self.tag_counts.insert(tag.to_owned(), 1);
            }
        }
    }

    /// Records one message from the given sender.
    ///
    /// A missing or empty address is a no-op: such messages still contribute
    /// to the size sample but not to the sender counters.
    pub fn record_sender(&mut self, address: Option<&str>) {
        let Some(address) = address.filter(|addr| !addr.is_empty()) else {
            return;
        };
        if let Some(count) = self.sender_counts.get_mut(address) {
            *count += 1;
        } else {
            self.sender_counts.insert(address.to_owned(), 1);
        }
    }

    /// Appends a size sample. Size 0 is valid and recorded.
    pub fn record_size(&mut self, size: u64) {
        self.sizes.push(size);
    }

    /// Processes one message: extracts tags from the subject, then records
    /// tags, sender, and size.
    ///
    /// A missing subject is treated as empty and a missing from-address is
    /// skipped, but a message without a size or without an envelope fails
    /// with [`Error::MalformedMessage`] before anything is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMessage`] naming the missing field.
    pub fn process_message(&mut self, message: &MessageMetadata) -> Result<()> {
        // Validate before mutating so a malformed message never leaves a
        // partial update behind.
        let size = message.size.ok_or(Error::MalformedMessage {
            seq: message.seq,
            field: "size",
        })?;
        let envelope = message.envelope.as_ref().ok_or(Error::MalformedMessage {
            seq: message.seq,
            field: "envelope",
        })?;

        let subject = envelope.subject.as_deref().unwrap_or("");
        self.record_tags(extract_tags(subject));
        self.record_sender(envelope.sender_address());
        self.record_size(u64::from(size));

        Ok(())
    }

    /// Tag occurrence counters, in first-seen order.
    #[must_use]
    pub fn tag_counts(&self) -> &IndexMap<String, u64> {
        &self.tag_counts
    }

    /// Per-sender message counters, in first-seen order.
    #[must_use]
    pub fn sender_counts(&self) -> &IndexMap<String, u64> {
        &self.sender_counts
    }

    /// Size samples in processing order.
    #[must_use]
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Total number of processed messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.sizes.len()
    }

    /// Returns `true` if no message has been processed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Address, Envelope};

    fn sign_in_message() -> MessageMetadata {
        MessageMetadata {
            seq: 20,
            size: Some(13009),
            envelope: Some(Envelope {
                subject: Some("New sign-in from [Chrome] on [Mac]".into()),
                from: vec![Address {
                    name: Some("Google".into()),
                    address: Some("no-reply@accounts.google.com".into()),
                }],
            }),
        }
    }

    #[test]
    fn test_record_tags_counts_occurrences() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_tags(["[World]", "[amazing]", "[World]", "[we]"]);

        assert_eq!(aggregate.tag_counts().get("[World]"), Some(&2));
        assert_eq!(aggregate.tag_counts().get("[amazing]"), Some(&1));
        assert_eq!(aggregate.tag_counts().get("[we]"), Some(&1));
        assert_eq!(aggregate.tag_counts().get("[not found]"), None);
    }

    #[test]
    fn test_record_tags_additive_across_calls() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_tags(["[build]"]);
        aggregate.record_tags(["[build]", "[ci]"]);

        assert_eq!(aggregate.tag_counts().get("[build]"), Some(&2));
        assert_eq!(aggregate.tag_counts().get("[ci]"), Some(&1));
    }

    #[test]
    fn test_record_sender_counts() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_sender(Some("test@test.com"));

        assert_eq!(aggregate.sender_counts().get("test@test.com"), Some(&1));
        assert_eq!(aggregate.sender_counts().get("notfound@notfound.com"), None);
    }

    #[test]
    fn test_record_sender_twice_counts_twice() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_sender(Some("test@test.com"));
        aggregate.record_sender(Some("test@test.com"));

        assert_eq!(aggregate.sender_counts().get("test@test.com"), Some(&2));
    }

    #[test]
    fn test_record_sender_absent_is_noop() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_sender(None);
        aggregate.record_sender(Some(""));

        assert!(aggregate.sender_counts().is_empty());
    }

    #[test]
    fn test_record_size_zero_is_recorded() {
        let mut aggregate = StatsAggregate::new();
        aggregate.record_size(0);

        assert_eq!(aggregate.sizes(), &[0]);
        assert_eq!(aggregate.message_count(), 1);
    }

    #[test]
    fn test_process_message() {
        let mut aggregate = StatsAggregate::new();
        aggregate.process_message(&sign_in_message()).unwrap();

        assert_eq!(aggregate.tag_counts().get("[Chrome]"), Some(&1));
        assert_eq!(aggregate.tag_counts().get("[Mac]"), Some(&1));
        assert_eq!(
            aggregate.sender_counts().get("no-reply@accounts.google.com"),
            Some(&1)
        );
        assert_eq!(aggregate.sizes(), &[13009]);
    }

    #[test]
    fn test_process_message_twice_doubles_everything() {
        // Aggregation is explicitly additive, not idempotent
        let mut aggregate = StatsAggregate::new();
        let message = sign_in_message();
        aggregate.process_message(&message).unwrap();
        aggregate.process_message(&message).unwrap();

        assert_eq!(aggregate.tag_counts().get("[Chrome]"), Some(&2));
        assert_eq!(aggregate.tag_counts().get("[Mac]"), Some(&2));
        assert_eq!(
            aggregate.sender_counts().get("no-reply@accounts.google.com"),
            Some(&2)
        );
        assert_eq!(aggregate.sizes(), &[13009, 13009]);
    }

    #[test]
    fn test_process_message_missing_size_is_malformed() {
        let mut aggregate = StatsAggregate::new();
        let mut message = sign_in_message();
        message.size = None;

        let err = aggregate.process_message(&message).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedMessage {
                seq: 20,
                field: "size"
            }
        ));
        // Nothing was recorded
        assert!(aggregate.is_empty());
        assert!(aggregate.tag_counts().is_empty());
    }

    #[test]
    fn test_process_message_missing_envelope_is_malformed() {
        let mut aggregate = StatsAggregate::new();
        let message = MessageMetadata {
            seq: 3,
            size: Some(100),
            envelope: None,
        };

        let err = aggregate.process_message(&message).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedMessage {
                seq: 3,
                field: "envelope"
            }
        ));
        assert!(aggregate.is_empty());
    }

    #[test]
    fn test_process_message_missing_sender_is_skipped() {
        let mut aggregate = StatsAggregate::new();
        let message = MessageMetadata {
            seq: 5,
            size: Some(4096),
            envelope: Some(Envelope {
                subject: Some("[newsletter] weekly digest".into()),
                from: Vec::new(),
            }),
        };

        aggregate.process_message(&message).unwrap();

        // Size and tags recorded, sender counters untouched
        assert_eq!(aggregate.sizes(), &[4096]);
        assert_eq!(aggregate.tag_counts().get("[newsletter]"), Some(&1));
        assert!(aggregate.sender_counts().is_empty());
    }

    #[test]
    fn test_process_message_missing_subject_is_empty() {
        let mut aggregate = StatsAggregate::new();
        let message = MessageMetadata {
            seq: 6,
            size: Some(512),
            envelope: Some(Envelope {
                subject: None,
                from: vec![Address {
                    name: None,
                    address: Some("a@b.c".into()),
                }],
            }),
        };

        aggregate.process_message(&message).unwrap();

        assert!(aggregate.tag_counts().is_empty());
        assert_eq!(aggregate.sender_counts().get("a@b.c"), Some(&1));
        assert_eq!(aggregate.sizes(), &[512]);
    }

    #[test]
    fn test_counter_invariants() {
        let mut aggregate = StatsAggregate::new();
        aggregate.process_message(&sign_in_message()).unwrap();
        aggregate
            .process_message(&MessageMetadata {
                seq: 21,
                size: Some(200),
                envelope: Some(Envelope {
                    subject: Some("[Chrome] again".into()),
                    from: Vec::new(),
                }),
            })
            .unwrap();

        // 2 tags from the first message + 1 from the second
        let tag_total: u64 = aggregate.tag_counts().values().sum();
        assert_eq!(tag_total, 3);

        // Only the first message has a sender
        let sender_total: u64 = aggregate.sender_counts().values().sum();
        assert_eq!(sender_total, 1);

        // Both messages contribute a size sample
        assert_eq!(aggregate.message_count(), 2);
    }
}
