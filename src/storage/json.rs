//! Flat-file backend: one pretty-printed JSON array per entity under the
//! data directory, rewritten whole on every mutation.
//!
//! All access goes through a single writer lock. The original read-modify-
//! write pattern this reproduces had no locking at all and could drop an
//! append under concurrent writers; serializing in-process closes that hole.
//! Two processes sharing a data directory are still unsafe — use the
//! Postgres backend there.

use super::{StorageError, Store};
use crate::domain::models::{ChatMessage, ChatUser, Contact, Feedback, Material};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

const CONTACTS_FILE: &str = "contacts.json";
const CHAT_USERS_FILE: &str = "chat-users.json";
const CHAT_MESSAGES_FILE: &str = "chat-messages.json";
const FEEDBACK_FILE: &str = "feedback.json";
const MATERIALS_FILE: &str = "materials.json";

const ALL_FILES: [&str; 5] = [
    CONTACTS_FILE,
    CHAT_USERS_FILE,
    CHAT_MESSAGES_FILE,
    FEEDBACK_FILE,
    MATERIALS_FILE,
];

pub struct JsonStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Create the data directory and seed each entity file with an empty
    /// array, matching the layout the admin tooling expects.
    pub async fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).await?;
        for name in ALL_FILES {
            let path = dir.join(name);
            if fs::metadata(&path).await.is_err() {
                fs::write(&path, b"[]").await?;
            }
        }
        tracing::info!("JSON store ready at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn read_all<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StorageError> {
        match fs::read(self.path(name)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all<T: Serialize>(&self, name: &str, items: &[T]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(items)?;
        fs::write(self.path(name), bytes).await?;
        Ok(())
    }

    async fn append<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
        item: &T,
    ) -> Result<(), StorageError>
    where
        T: Clone,
    {
        let _guard = self.lock.lock().await;
        let mut items: Vec<T> = self.read_all(name).await?;
        items.push(item.clone());
        self.write_all(name, &items).await
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn insert_contact(&self, contact: &Contact) -> Result<(), StorageError> {
        self.append(CONTACTS_FILE, contact).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut contacts: Vec<Contact> = self.read_all(CONTACTS_FILE).await?;
        contacts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(contacts)
    }

    async fn insert_chat_user(&self, user: &ChatUser) -> Result<(), StorageError> {
        self.append(CHAT_USERS_FILE, user).await
    }

    async fn find_chat_user(&self, id: Uuid) -> Result<Option<ChatUser>, StorageError> {
        let _guard = self.lock.lock().await;
        let users: Vec<ChatUser> = self.read_all(CHAT_USERS_FILE).await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn find_chat_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ChatUser>, StorageError> {
        let _guard = self.lock.lock().await;
        let users: Vec<ChatUser> = self.read_all(CHAT_USERS_FILE).await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn list_chat_users(&self) -> Result<Vec<ChatUser>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut users: Vec<ChatUser> = self.read_all(CHAT_USERS_FILE).await?;
        users.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(users)
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> Result<(), StorageError> {
        self.append(CHAT_MESSAGES_FILE, message).await
    }

    async fn list_chat_messages(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut messages: Vec<ChatMessage> = self.read_all(CHAT_MESSAGES_FILE).await?;
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(messages)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError> {
        self.append(FEEDBACK_FILE, feedback).await
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut feedback: Vec<Feedback> = self.read_all(FEEDBACK_FILE).await?;
        feedback.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(feedback)
    }

    async fn list_public_testimonials(&self) -> Result<Vec<Feedback>, StorageError> {
        let mut feedback = self.list_feedback().await?;
        feedback.retain(Feedback::is_public);
        Ok(feedback)
    }

    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        self.append(MATERIALS_FILE, material).await
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut materials: Vec<Material> = self.read_all(MATERIALS_FILE).await?;
        materials.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        Ok(materials)
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StorageError> {
        let _guard = self.lock.lock().await;
        let materials: Vec<Material> = self.read_all(MATERIALS_FILE).await?;
        Ok(materials.into_iter().find(|m| m.id == id))
    }

    async fn remove_material(&self, id: Uuid) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        let mut materials: Vec<Material> = self.read_all(MATERIALS_FILE).await?;
        let before = materials.len();
        materials.retain(|m| m.id != id);
        if materials.len() == before {
            return Ok(false);
        }
        self.write_all(MATERIALS_FILE, &materials).await?;
        Ok(true)
    }
}
