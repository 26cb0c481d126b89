//! Error types for `dailyfacts-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown category: {0:?}")]
  UnknownCategory(String),

  #[error("at least one category must be selected")]
  EmptyCategorySelection,

  #[error("invalid notification time {0:?}, expected HH:MM")]
  InvalidNotificationTime(String),

  #[error("pause duration must be positive and in range")]
  InvalidPauseDuration,

  #[error("fact text must not be empty")]
  EmptyFactText,

  #[error("no fact is currently displayed")]
  NoCurrentFact,

  /// The key-value persistence collaborator failed.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The fact pool could not be reached.
  #[error("fact source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The payment provider could not be reached.
  #[error("payment provider error: {0}")]
  Payment(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("a payment intent id is required")]
  MissingPaymentId,

  #[error("payment {id} has status {status:?}")]
  PaymentNotSucceeded { id: String, status: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// The short message shown to the user for this failure.
  pub fn user_message(&self) -> String {
    match self {
      Self::Storage(_) => {
        "Something went wrong saving your data. Please try again later.".into()
      }
      Self::Source(_) => "Failed to fetch fact. Please check your connection.".into(),
      Self::Payment(_) | Self::PaymentNotSucceeded { .. } | Self::MissingPaymentId => {
        "Upgrade failed. Please try again.".into()
      }
      Self::Serialization(_) => {
        "Stored data could not be read. Please try again later.".into()
      }
      other => other.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
