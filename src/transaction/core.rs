//! Defines the transaction records read from the feed and the rows kept in the store.

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{
    Error,
    timestamp::{normalize_timestamp, parse_timestamp},
};

// ============================================================================
// FEED RECORDS
// ============================================================================

/// One transaction ("story") as it appears in the payment service's feed.
///
/// The fields the sync engine understands are modelled explicitly. Everything
/// else in the upstream object is kept verbatim in [TransactionRecord::extra]
/// and written back out when the record is serialized, so API clients see the
/// feed exactly as it was received.
///
/// Deserialization never fails because of an unexpected nested shape: a field
/// that does not look like what is expected becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The globally unique ID of the transaction.
    ///
    /// Records without an ID cannot be deduplicated and are never stored.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// When the transaction happened, as an ISO-8601 string.
    #[serde(
        rename = "date",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub occurred_at: Option<String>,

    /// The signed amount, e.g. "- $12.50". The sign indicates the direction of
    /// the money; the text is never parsed into a number.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,

    /// The kind of transaction, e.g. "payment" or "charge".
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    /// The note attached to the transaction.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,

    /// Who sent and who received the money.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,

    /// Upstream fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The note on a transaction. The feed sends either a bare string or an object
/// holding the text in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Note {
    /// A bare note string.
    Text(String),
    /// A note object.
    Content {
        /// The note text.
        #[serde(default, deserialize_with = "lenient_text")]
        content: Option<String>,
    },
}

/// The parties involved in a transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// The party the money came from.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sender: Option<Party>,
    /// The party the money went to.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Party>,
    /// What happened, e.g. `{"action": "pay"}`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Upstream fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A sender or receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// The account handle.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The name shown in the feed.
    #[serde(
        rename = "displayName",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    /// Upstream fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Party {
    /// The party's display name, falling back to the username.
    pub fn display_identifier(&self) -> Option<String> {
        self.display_name.clone().or_else(|| self.username.clone())
    }
}

/// The action behind a transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// E.g. "pay" or "charge".
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Upstream fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionRecord {
    /// The note text, whichever form the note came in.
    pub fn note_text(&self) -> Option<String> {
        match &self.note {
            Some(Note::Text(text)) => Some(text.clone()),
            Some(Note::Content { content }) => content.clone(),
            None => None,
        }
    }

    /// The sender's display identifier.
    pub fn sender(&self) -> Option<String> {
        self.title
            .as_ref()
            .and_then(|title| title.sender.as_ref())
            .and_then(Party::display_identifier)
    }

    /// The receiver's display identifier.
    pub fn receiver(&self) -> Option<String> {
        self.title
            .as_ref()
            .and_then(|title| title.receiver.as_ref())
            .and_then(Party::display_identifier)
    }

    /// When the transaction happened, if the timestamp is present and readable.
    pub fn occurred_at_timestamp(&self) -> Option<OffsetDateTime> {
        self.occurred_at.as_deref().and_then(parse_timestamp)
    }

    /// Flatten the record into the shape the store keeps.
    ///
    /// A readable transaction date is rewritten in UTC; anything else is kept
    /// verbatim.
    ///
    /// # Errors
    /// Returns [Error::MissingId] if the record has no ID.
    pub fn to_new_transaction(&self) -> Result<NewTransaction, Error> {
        let id = self.id.clone().ok_or(Error::MissingId)?;

        Ok(NewTransaction {
            id,
            transaction_date: self.occurred_at.as_deref().map(normalize_timestamp),
            note: self.note_text(),
            amount: self.amount.clone(),
            kind: self.kind.clone(),
            sender: self.sender(),
            receiver: self.receiver(),
        })
    }
}

/// Deserialize any JSON value, keeping it only if it has the shape of `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Deserialize a string, accepting numbers and booleans as their text form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

// ============================================================================
// STORE ROWS
// ============================================================================

/// A transaction about to be inserted into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The transaction ID, the store's primary key.
    pub id: String,
    /// When the transaction happened.
    pub transaction_date: Option<String>,
    /// The flattened note text.
    pub note: Option<String>,
    /// The signed amount text.
    pub amount: Option<String>,
    /// The kind of transaction.
    pub kind: Option<String>,
    /// The sender's display identifier.
    pub sender: Option<String>,
    /// The receiver's display identifier.
    pub receiver: Option<String>,
}

/// A transaction as kept in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// The transaction ID.
    pub id: String,
    /// When the transaction happened.
    pub transaction_date: Option<String>,
    /// The flattened note text.
    pub note: Option<String>,
    /// The signed amount text.
    pub amount: Option<String>,
    /// The kind of transaction.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The sender's display identifier.
    pub sender: Option<String>,
    /// The receiver's display identifier.
    pub receiver: Option<String>,
    /// When the row was written.
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}
