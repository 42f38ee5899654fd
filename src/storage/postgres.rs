//! Hosted-Postgres backend.
//!
//! Single-statement inserts, selects and deletes only — no multi-statement
//! transactions span handlers; the database's own row semantics are the
//! concurrency story. Queries are bound at runtime so the crate builds
//! without a live database.

use super::{StorageError, Store};
use crate::domain::models::{ChatMessage, ChatUser, Contact, Feedback, Material};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgStore {
    pool: PgPool,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id UUID PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        phone VARCHAR(50) NOT NULL,
        course VARCHAR(255) NOT NULL,
        message TEXT NOT NULL,
        "timestamp" TIMESTAMPTZ NOT NULL,
        status VARCHAR(50) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_users (
        id UUID PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        phone VARCHAR(50) NOT NULL,
        "timestamp" TIMESTAMPTZ NOT NULL,
        status VARCHAR(50) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        user_info JSONB NOT NULL,
        message TEXT NOT NULL,
        "timestamp" TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id UUID PRIMARY KEY,
        student_name VARCHAR(255) NOT NULL,
        student_email VARCHAR(255) NOT NULL,
        course_completed VARCHAR(255) NOT NULL,
        student_role VARCHAR(255),
        overall_rating INTEGER NOT NULL CHECK (overall_rating >= 1 AND overall_rating <= 5),
        instructor_rating INTEGER NOT NULL CHECK (instructor_rating >= 1 AND instructor_rating <= 5),
        content_rating INTEGER NOT NULL CHECK (content_rating >= 1 AND content_rating <= 5),
        feedback_text TEXT NOT NULL,
        improvements TEXT,
        display_publicly BOOLEAN NOT NULL DEFAULT FALSE,
        image_data TEXT,
        status VARCHAR(50) NOT NULL DEFAULT 'approved',
        "timestamp" TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS materials (
        id UUID PRIMARY KEY,
        title VARCHAR(255) NOT NULL,
        course VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        filename VARCHAR(255) NOT NULL,
        original_name VARCHAR(255) NOT NULL,
        file_size BIGINT NOT NULL,
        file_path TEXT NOT NULL,
        upload_date TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_contacts_timestamp ON contacts("timestamp" DESC)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_chat_users_email ON chat_users(email)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_feedback_course ON feedback(course_completed)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_feedback_display ON feedback(display_publicly, status)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_materials_course ON materials(course)"#,
];

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                e
            })?;
        let store = Self { pool };
        store.init_schema().await?;
        tracing::info!("Database connection established");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_contact(&self, contact: &Contact) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO contacts (id, name, email, phone, course, message, "timestamp", status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.course)
        .bind(&contact.message)
        .bind(contact.timestamp)
        .bind(&contact.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, StorageError> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email, phone, course, message, "timestamp", status
            FROM contacts
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn insert_chat_user(&self, user: &ChatUser) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO chat_users (id, name, email, phone, "timestamp", status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.timestamp)
        .bind(&user.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_chat_user(&self, id: Uuid) -> Result<Option<ChatUser>, StorageError> {
        let user = sqlx::query_as::<_, ChatUser>(
            r#"
            SELECT id, name, email, phone, "timestamp", status
            FROM chat_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_chat_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ChatUser>, StorageError> {
        let user = sqlx::query_as::<_, ChatUser>(
            r#"
            SELECT id, name, email, phone, "timestamp", status
            FROM chat_users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_chat_users(&self) -> Result<Vec<ChatUser>, StorageError> {
        let users = sqlx::query_as::<_, ChatUser>(
            r#"
            SELECT id, name, email, phone, "timestamp", status
            FROM chat_users
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, user_id, user_info, message, "timestamp")
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(&message.user_id)
        .bind(&message.user_info)
        .bind(&message.message)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_chat_messages(&self) -> Result<Vec<ChatMessage>, StorageError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, user_id, user_info, message, "timestamp"
            FROM chat_messages
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, student_name, student_email, course_completed, student_role,
                overall_rating, instructor_rating, content_rating,
                feedback_text, improvements, display_publicly, image_data,
                status, "timestamp"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(feedback.id)
        .bind(&feedback.student_name)
        .bind(&feedback.student_email)
        .bind(&feedback.course_completed)
        .bind(&feedback.student_role)
        .bind(feedback.overall_rating)
        .bind(feedback.instructor_rating)
        .bind(feedback.content_rating)
        .bind(&feedback.feedback_text)
        .bind(&feedback.improvements)
        .bind(feedback.display_publicly)
        .bind(&feedback.image_data)
        .bind(&feedback.status)
        .bind(feedback.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StorageError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, student_name, student_email, course_completed, student_role,
                   overall_rating, instructor_rating, content_rating,
                   feedback_text, improvements, display_publicly, image_data,
                   status, "timestamp"
            FROM feedback
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    async fn list_public_testimonials(&self) -> Result<Vec<Feedback>, StorageError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, student_name, student_email, course_completed, student_role,
                   overall_rating, instructor_rating, content_rating,
                   feedback_text, improvements, display_publicly, image_data,
                   status, "timestamp"
            FROM feedback
            WHERE display_publicly = TRUE
              AND status = 'approved'
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    async fn insert_material(&self, material: &Material) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                id, title, course, description, filename, original_name,
                file_size, file_path, upload_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(material.id)
        .bind(&material.title)
        .bind(&material.course)
        .bind(&material.description)
        .bind(&material.filename)
        .bind(&material.original_name)
        .bind(material.file_size)
        .bind(&material.file_path)
        .bind(material.upload_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_materials(&self) -> Result<Vec<Material>, StorageError> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, title, course, description, filename, original_name,
                   file_size, file_path, upload_date
            FROM materials
            ORDER BY upload_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StorageError> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, title, course, description, filename, original_name,
                   file_size, file_path, upload_date
            FROM materials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(material)
    }

    async fn remove_material(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
