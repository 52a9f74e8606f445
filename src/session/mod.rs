//! Session records and feature documents
//!
//! A wizard run writes into two places:
//!
//! - the **session record** at `features/{documentId}`, tagged with a
//!   `sessionId` field and read back by later steps to build prompts
//! - the **feature document**, `users/{uid}/feature/{documentId}` when a user
//!   id is known, else the session record itself
//!
//! Storage is behind [`DocumentStore`]. Writes merge; nothing is retried.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const FEATURES_COLLECTION: &str = "features";
pub const USERS_COLLECTION: &str = "users";
pub const USER_FEATURE_COLLECTION: &str = "feature";
pub const WAITLIST_COLLECTION: &str = "waitlist";

/// Field on session records used to look them up
pub const SESSION_ID_FIELD: &str = "sessionId";
pub const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid document path '{0}'")]
    InvalidPath(String),

    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unreadable store response: {0}")]
    Malformed(String),

    #[error("Local store file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No session record for session '{0}'")]
    MissingSession(String),
}

/// A stored value: plain text or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Flatten to prompt text; list entries are comma-joined
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::Text(s) if s.is_empty() => Vec::new(),
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// Slash-separated document path with an even number of segments
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(Self(path.to_string()))
    }

    pub fn session_record(document_id: &str) -> Self {
        Self(format!("{}/{}", FEATURES_COLLECTION, document_id))
    }

    pub fn user_feature(uid: &str, document_id: &str) -> Self {
        Self(format!(
            "{}/{}/{}/{}",
            USERS_COLLECTION, uid, USER_FEATURE_COLLECTION, document_id
        ))
    }

    pub fn waitlist(email: &str) -> Result<Self, StoreError> {
        if email.is_empty() || email.contains('/') {
            return Err(StoreError::InvalidPath(format!(
                "{}/{}",
                WAITLIST_COLLECTION, email
            )));
        }
        Ok(Self(format!("{}/{}", WAITLIST_COLLECTION, email)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection path this document lives in
    pub fn collection(&self) -> &str {
        self.0.rsplit_once('/').map(|(c, _)| c).unwrap_or("")
    }

    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map(|(_, id)| id).unwrap_or(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

/// Who is driving the wizard, as far as routing and storage care
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    SignedOut,
    Anonymous {
        uid: String,
    },
    Identified {
        uid: String,
    },
}

impl AuthState {
    pub fn uid(&self) -> Option<&str> {
        match self {
            AuthState::SignedOut => None,
            AuthState::Anonymous { uid } | AuthState::Identified { uid } => Some(uid.as_str()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthState::Anonymous { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthState::SignedOut => "signed out",
            AuthState::Anonymous { .. } => "guest",
            AuthState::Identified { .. } => "signed in",
        }
    }
}

/// Identifiers that tie the steps of one wizard run together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub document_id: String,
    #[serde(default)]
    pub auth: AuthState,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, document_id: impl Into<String>, auth: AuthState) -> Self {
        Self {
            session_id: session_id.into(),
            document_id: document_id.into(),
            auth,
        }
    }

    /// Fresh ids for a new run
    pub fn generate(auth: AuthState) -> Self {
        Self::new(
            Uuid::new_v4().to_string(),
            Uuid::new_v4().simple().to_string(),
            auth,
        )
    }

    pub fn session_record(&self) -> DocumentPath {
        DocumentPath::session_record(&self.document_id)
    }

    /// Where step selections are persisted
    pub fn feature_document(&self) -> DocumentPath {
        match self.auth.uid() {
            Some(uid) => DocumentPath::user_feature(uid, &self.document_id),
            None => self.session_record(),
        }
    }
}

/// Fields earlier pages contribute to the session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    FinalProblemStatement,
    AcceptanceCriteria,
    TargetCustomer,
    MarketSize,
    Hypothesis,
}

impl SessionField {
    pub fn key(&self) -> &'static str {
        match self {
            SessionField::FinalProblemStatement => "finalProblemStatement",
            SessionField::AcceptanceCriteria => "acceptanceCriteria",
            SessionField::TargetCustomer => "targetCustomer",
            SessionField::MarketSize => "marketSize",
            SessionField::Hypothesis => "hypothesis",
        }
    }
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Minimal document database contract
pub trait DocumentStore: Send + Sync {
    /// First document in `collection` whose `field` equals `value`
    fn query_first<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> StoreFuture<'a, Option<Document>>;

    fn get<'a>(&'a self, path: &'a DocumentPath) -> StoreFuture<'a, Option<Document>>;

    /// Write `fields`, leaving every other field of the document untouched
    fn merge<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()>;

    /// Replace the document with `fields`
    fn set<'a>(&'a self, path: &'a DocumentPath, fields: Fields) -> StoreFuture<'a, ()>;
}

/// Session-aware facade over a [`DocumentStore`]
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn DocumentStore>,
}

impl SessionStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    async fn session_document(&self, session_id: &str) -> Result<Option<Document>, StoreError> {
        self.inner
            .query_first(FEATURES_COLLECTION, SESSION_ID_FIELD, session_id)
            .await
    }

    /// Read one field from the session record
    pub async fn get_field(
        &self,
        session_id: &str,
        field: &str,
    ) -> Result<Option<String>, StoreError> {
        let doc = self.session_document(session_id).await?;
        Ok(doc.and_then(|d| d.fields.get(field).map(FieldValue::as_text)))
    }

    /// Read several fields in order; absent ones come back empty
    pub async fn get_fields(
        &self,
        session_id: &str,
        fields: &[SessionField],
    ) -> Result<Vec<String>, StoreError> {
        let doc = self.session_document(session_id).await?;
        if doc.is_none() {
            warn!(session_id, "no session record found; prompt fields will be empty");
        }
        Ok(fields
            .iter()
            .map(|field| {
                doc.as_ref()
                    .and_then(|d| d.fields.get(field.key()))
                    .map(FieldValue::as_text)
                    .unwrap_or_default()
            })
            .collect())
    }

    pub async fn merge_fields(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        debug!(%path, keys = ?fields.keys().collect::<Vec<_>>(), "merging fields");
        self.inner.merge(path, fields).await
    }

    pub async fn set_document(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.inner.set(path, fields).await
    }

    pub async fn load_document(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.inner.get(path).await
    }

    /// Write the initial session record for a new run
    pub async fn create_record(
        &self,
        ctx: &SessionContext,
        intake: Fields,
    ) -> Result<DocumentPath, StoreError> {
        let path = ctx.session_record();
        let mut fields = intake;
        fields.insert(
            SESSION_ID_FIELD.to_string(),
            FieldValue::Text(ctx.session_id.clone()),
        );
        fields.insert(
            CREATED_AT_FIELD.to_string(),
            FieldValue::Text(Utc::now().to_rfc3339()),
        );
        self.inner.merge(&path, fields).await?;
        info!(session_id = %ctx.session_id, %path, "session record created");
        Ok(path)
    }

    /// Confirm a resumed session still has a record
    pub async fn ensure_record(&self, ctx: &SessionContext) -> Result<(), StoreError> {
        match self.session_document(&ctx.session_id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::MissingSession(ctx.session_id.clone())),
        }
    }
}
