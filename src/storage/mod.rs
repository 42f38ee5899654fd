//! Persistence backends.
//!
//! One [`Store`] contract, two implementations: flat JSON files for local
//! deployments and hosted Postgres for production. The backend is a static
//! deployment decision made at startup — never both in one process.

pub mod files;
pub mod json;
pub mod postgres;

pub use files::FileStore;
pub use json::JsonStore;
pub use postgres::PgStore;

use crate::domain::models::{ChatMessage, ChatUser, Contact, Feedback, Material};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage contract shared by both backends. Handlers only ever see this
/// trait, so they stay backend-agnostic. Listings return newest-first.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_contact(&self, contact: &Contact) -> Result<(), StorageError>;
    async fn list_contacts(&self) -> Result<Vec<Contact>, StorageError>;

    async fn insert_chat_user(&self, user: &ChatUser) -> Result<(), StorageError>;
    async fn find_chat_user(&self, id: Uuid) -> Result<Option<ChatUser>, StorageError>;
    async fn find_chat_user_by_email(&self, email: &str)
        -> Result<Option<ChatUser>, StorageError>;
    async fn list_chat_users(&self) -> Result<Vec<ChatUser>, StorageError>;

    async fn insert_chat_message(&self, message: &ChatMessage) -> Result<(), StorageError>;
    async fn list_chat_messages(&self) -> Result<Vec<ChatMessage>, StorageError>;

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError>;
    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError>;
    /// Rows with `display_publicly = true` and `status = "approved"` only.
    async fn list_public_testimonials(&self) -> Result<Vec<Feedback>, StorageError>;

    async fn insert_material(&self, material: &Material) -> Result<(), StorageError>;
    async fn list_materials(&self) -> Result<Vec<Material>, StorageError>;
    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StorageError>;
    /// Returns whether a row existed for `id`.
    async fn remove_material(&self, id: Uuid) -> Result<bool, StorageError>;
}
