//! MongoDB backend.
//!
//! One `MongoStore` owns the three collections (`bugs`, `bugs_archive`,
//! `projects`) and implements `BugStore`, `BugArchive`, and
//! `ProjectDirectory`. Records serialize through serde, so documents carry
//! the same camelCase fields as the wire format. Timestamps are stored as
//! fixed-width RFC 3339 strings; range queries compare them
//! lexicographically.

use async_trait::async_trait;
use bugvault_core::{timefmt, ArchivedBug, BugRecord, BugStatus, Project, Solution, Timestamp};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use std::collections::HashMap;
use tracing::info;

use crate::error::StorageError;
use crate::traits::{
    BugArchive, BugPage, BugStore, ProjectDirectory, RecurrenceUpdate, SearchQuery, StatsSummary,
};

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "bugvault".to_string(),
        }
    }
}

/// MongoDB-backed storage for bugs, the archive, and the project directory.
#[derive(Clone)]
pub struct MongoStore {
    bugs: Collection<BugRecord>,
    archive: Collection<ArchivedBug>,
    projects: Collection<Project>,
}

fn backend_err<E: std::fmt::Display>(err: E) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl MongoStore {
    /// Connect and bind the collections. Fails with
    /// `StorageError::Unavailable` when the server cannot be reached.
    pub async fn connect(config: &MongoConfig) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let db = client.database(&config.database);
        info!(database = %config.database, "connected to document store");
        Ok(Self {
            bugs: db.collection("bugs"),
            archive: db.collection("bugs_archive"),
            projects: db.collection("projects"),
        })
    }

    /// Create the indexes the query paths rely on. Idempotent; called once
    /// at startup.
    pub async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let unique = IndexOptions::builder().unique(true).build();

        self.bugs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "bugId": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .map_err(backend_err)?;
        // Dedup signature lookup. Deliberately NOT unique: concurrent first
        // reports of a signature may race into two records, and the merge
        // maintenance pass reconciles them later.
        self.bugs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "projectId": 1, "errorCode": 1 })
                    .build(),
            )
            .await
            .map_err(backend_err)?;
        self.bugs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "projectId": 1, "createdAt": -1 })
                    .build(),
            )
            .await
            .map_err(backend_err)?;
        self.bugs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "updatedAt": 1 })
                    .build(),
            )
            .await
            .map_err(backend_err)?;
        self.bugs
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "title": "text", "message": "text", "errorCode": "text" })
                    .build(),
            )
            .await
            .map_err(backend_err)?;

        self.projects
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "apiKey": 1 })
                    .options(unique)
                    .build(),
            )
            .await
            .map_err(backend_err)?;
        self.archive
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "projectId": 1, "archivedAt": -1 })
                    .build(),
            )
            .await
            .map_err(backend_err)?;

        Ok(())
    }
}

/// Build the filter document for a project-scoped search.
fn search_filter(project_id: &str, query: &SearchQuery) -> Document {
    let mut filter = doc! { "projectId": project_id };
    if let Some(text) = &query.text {
        filter.insert("$text", doc! { "$search": text.as_str() });
    }
    if !query.severities.is_empty() {
        let severities: Vec<String> = query
            .severities
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        filter.insert("severity", doc! { "$in": severities });
    }
    if !query.statuses.is_empty() {
        let statuses: Vec<String> = query
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        filter.insert("status", doc! { "$in": statuses });
    }
    if let Some(code) = &query.error_code {
        filter.insert("errorCode", code.as_str());
    }
    let mut created = Document::new();
    if let Some(from) = &query.created_from {
        created.insert("$gte", timefmt::format(from));
    }
    if let Some(to) = &query.created_to {
        created.insert("$lte", timefmt::format(to));
    }
    if !created.is_empty() {
        filter.insert("createdAt", created);
    }
    if let Some(min) = query.min_occurrences {
        filter.insert("occurrences", doc! { "$gte": min });
    }
    filter
}

#[async_trait]
impl BugStore for MongoStore {
    async fn find_by_signature(
        &self,
        project_id: &str,
        error_code: &str,
    ) -> Result<Option<BugRecord>, StorageError> {
        self.bugs
            .find_one(doc! { "projectId": project_id, "errorCode": error_code })
            .sort(doc! { "createdAt": 1 })
            .await
            .map_err(backend_err)
    }

    async fn insert(&self, record: &BugRecord) -> Result<(), StorageError> {
        self.bugs.insert_one(record).await.map_err(backend_err)?;
        Ok(())
    }

    async fn record_recurrence(
        &self,
        bug_id: &str,
        update: &RecurrenceUpdate,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError> {
        let context = to_bson(&update.context).map_err(backend_err)?;
        let mut set = doc! {
            "message": update.message.as_str(),
            "context": context,
            "updatedAt": timefmt::format(&now),
        };
        if let Some(trace) = &update.stack_trace {
            set.insert("stackTrace", trace.as_str());
        }
        self.bugs
            .find_one_and_update(
                doc! { "bugId": bug_id },
                doc! { "$inc": { "occurrences": 1 }, "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_err)
    }

    async fn apply_solution(
        &self,
        bug_id: &str,
        status: BugStatus,
        solution: &Solution,
        now: Timestamp,
    ) -> Result<Option<BugRecord>, StorageError> {
        let solution = to_bson(solution).map_err(backend_err)?;
        self.bugs
            .find_one_and_update(
                doc! { "bugId": bug_id },
                doc! { "$set": {
                    "status": status.as_str(),
                    "solution": solution,
                    "updatedAt": timefmt::format(&now),
                } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(backend_err)
    }

    async fn find_by_id(&self, bug_id: &str) -> Result<Option<BugRecord>, StorageError> {
        self.bugs
            .find_one(doc! { "bugId": bug_id })
            .await
            .map_err(backend_err)
    }

    async fn list_by_project(
        &self,
        project_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<BugPage, StorageError> {
        let filter = doc! { "projectId": project_id };
        let total = self
            .bugs
            .count_documents(filter.clone())
            .await
            .map_err(backend_err)?;
        let bugs: Vec<BugRecord> = self
            .bugs
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit.max(0))
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)?;
        Ok(BugPage { bugs, total })
    }

    async fn search(
        &self,
        project_id: &str,
        query: &SearchQuery,
    ) -> Result<BugPage, StorageError> {
        let filter = search_filter(project_id, query);
        let total = self
            .bugs
            .count_documents(filter.clone())
            .await
            .map_err(backend_err)?;
        let bugs: Vec<BugRecord> = self
            .bugs
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(query.offset.max(0) as u64)
            .limit(query.limit.max(0))
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)?;
        Ok(BugPage { bugs, total })
    }

    async fn aggregate_stats(&self, project_id: &str) -> Result<StatsSummary, StorageError> {
        let mut cursor = self
            .bugs
            .find(doc! { "projectId": project_id })
            .await
            .map_err(backend_err)?;
        let mut summary = StatsSummary::default();
        while let Some(record) = cursor.try_next().await.map_err(backend_err)? {
            summary.absorb(&record);
        }
        Ok(summary)
    }

    async fn project_records(&self, project_id: &str) -> Result<Vec<BugRecord>, StorageError> {
        self.bugs
            .find(doc! { "projectId": project_id })
            .sort(doc! { "createdAt": -1 })
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)
    }

    async fn duplicate_groups(&self) -> Result<Vec<Vec<BugRecord>>, StorageError> {
        let mut cursor = self.bugs.find(doc! {}).await.map_err(backend_err)?;
        let mut by_signature: HashMap<(String, String), Vec<BugRecord>> = HashMap::new();
        while let Some(record) = cursor.try_next().await.map_err(backend_err)? {
            by_signature
                .entry((record.project_id.clone(), record.error_code.clone()))
                .or_default()
                .push(record);
        }
        let mut groups: Vec<Vec<BugRecord>> = by_signature
            .into_values()
            .filter(|group| group.len() > 1)
            .collect();
        for group in &mut groups {
            group.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        groups.sort_by(|a, b| a[0].bug_id.cmp(&b[0].bug_id));
        Ok(groups)
    }

    async fn adjust_occurrences(
        &self,
        bug_id: &str,
        delta: i64,
        now: Timestamp,
    ) -> Result<(), StorageError> {
        self.bugs
            .update_one(
                doc! { "bugId": bug_id },
                doc! {
                    "$inc": { "occurrences": delta },
                    "$set": { "updatedAt": timefmt::format(&now) },
                },
            )
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn resolved_before(&self, cutoff: Timestamp) -> Result<Vec<BugRecord>, StorageError> {
        self.bugs
            .find(doc! {
                "status": "resolved",
                "updatedAt": { "$lt": timefmt::format(&cutoff) },
            })
            .sort(doc! { "updatedAt": 1 })
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)
    }

    async fn delete(&self, bug_id: &str) -> Result<bool, StorageError> {
        let result = self
            .bugs
            .delete_one(doc! { "bugId": bug_id })
            .await
            .map_err(backend_err)?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl BugArchive for MongoStore {
    async fn store(&self, bug: &ArchivedBug) -> Result<(), StorageError> {
        self.archive.insert_one(bug).await.map_err(backend_err)?;
        Ok(())
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<ArchivedBug>, StorageError> {
        self.archive
            .find(doc! { "projectId": project_id })
            .sort(doc! { "archivedAt": -1 })
            .await
            .map_err(backend_err)?
            .try_collect()
            .await
            .map_err(backend_err)
    }
}

#[async_trait]
impl ProjectDirectory for MongoStore {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Project>, StorageError> {
        self.projects
            .find_one(doc! { "apiKey": api_key })
            .await
            .map_err(backend_err)
    }

    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>, StorageError> {
        self.projects
            .find_one(doc! { "projectId": project_id })
            .await
            .map_err(backend_err)
    }

    async fn insert(&self, project: &Project) -> Result<(), StorageError> {
        self.projects
            .insert_one(project)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
