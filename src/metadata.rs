//! Message metadata as retrieved from a mailbox server.
//!
//! These types mirror the wire shape: fields a server may omit are optional
//! here, and validation happens at aggregation time
//! ([`StatsAggregate::process_message`](crate::StatsAggregate::process_message)),
//! not at retrieval time. The types carry no backend dependency so any
//! [`MailboxClient`](crate::MailboxClient) implementation can produce them.

/// The subset of a retrieved message needed for aggregation.
///
/// Produced once per message by the mailbox client, consumed once by the
/// aggregation pipeline.
#[derive(Debug, Clone)]
pub struct MessageMetadata {
    /// Message sequence number within the selected mailbox.
    pub seq: u32,
    /// Message size in bytes. Absence makes the message malformed.
    pub size: Option<u32>,
    /// Structured envelope metadata. Absence makes the message malformed.
    pub envelope: Option<Envelope>,
}

/// Structured metadata of a message (sender, subject), as opposed to its body.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    /// Subject line; a missing subject is treated as empty.
    pub subject: Option<String>,
    /// The "from" address list, possibly empty.
    pub from: Vec<Address>,
}

impl Envelope {
    /// Returns the sender address: the first non-empty address of the "from"
    /// list, or `None` when the list is empty or its first entry carries no
    /// usable address.
    #[must_use]
    pub fn sender_address(&self) -> Option<&str> {
        self.from
            .first()
            .and_then(|addr| addr.address.as_deref())
            .filter(|addr| !addr.is_empty())
    }
}

/// A single entry of an envelope address list.
#[derive(Debug, Clone, Default)]
pub struct Address {
    /// Display name, if any.
    pub name: Option<String>,
    /// The address itself, e.g. `user@example.com`.
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_address_first_entry() {
        let envelope = Envelope {
            subject: None,
            from: vec![
                Address {
                    name: Some("Google".into()),
                    address: Some("no-reply@accounts.google.com".into()),
                },
                Address {
                    name: None,
                    address: Some("second@example.com".into()),
                },
            ],
        };
        assert_eq!(
            envelope.sender_address(),
            Some("no-reply@accounts.google.com")
        );
    }

    #[test]
    fn test_sender_address_absent() {
        assert_eq!(Envelope::default().sender_address(), None);

        let nameless = Envelope {
            subject: None,
            from: vec![Address::default()],
        };
        assert_eq!(nameless.sender_address(), None);
    }

    #[test]
    fn test_sender_address_empty_string_is_absent() {
        let envelope = Envelope {
            subject: None,
            from: vec![Address {
                name: None,
                address: Some(String::new()),
            }],
        };
        assert_eq!(envelope.sender_address(), None);
    }
}
