//! Row-level diffs sent to `user/offlineshoppinglists/{id}/sync`
//!
//! Mutations are staged per list in [`StagedRows`] and turned into exactly
//! one [`SyncPayload`] when the list is synced. The remote accepts a single
//! diff key per call, so staging resolves in the order
//! `DeletedRows` > `ChangedRows` > `CreatedRows`, falling back to the whole
//! record when nothing is staged.

use serde::Serialize;

use crate::types::ShoppingList;

/// `SourceId` the remote expects on rows created or changed by a client
pub const CLIENT_SOURCE_ID: i64 = -1;

/// A row to be created on the remote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewRow {
    pub offline_id: String,
    pub product_name: String,
    pub source_id: i64,
    pub is_striked_over: bool,
    pub article_group_id: i64,
}

impl NewRow {
    /// A fresh, unchecked row with a generated offline id
    pub fn new(product_name: impl Into<String>, article_group_id: i64) -> Self {
        Self {
            offline_id: uuid::Uuid::new_v4().to_string(),
            product_name: product_name.into(),
            source_id: CLIENT_SOURCE_ID,
            is_striked_over: false,
            article_group_id,
        }
    }
}

/// A change to an existing row's checked state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangedRow {
    pub offline_id: String,
    pub is_striked_over: bool,
    pub source_id: i64,
}

impl ChangedRow {
    pub fn new(offline_id: impl Into<String>, is_striked_over: bool) -> Self {
        Self {
            offline_id: offline_id.into(),
            is_striked_over,
            source_id: CLIENT_SOURCE_ID,
        }
    }
}

/// Diffs staged against one list between syncs
///
/// Each collection is created on first use and drained by
/// [`SyncPayload::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedRows {
    pub created: Option<Vec<NewRow>>,
    pub changed: Option<Vec<ChangedRow>>,
    pub deleted: Option<Vec<String>>,
}

impl StagedRows {
    pub fn stage_created(&mut self, row: NewRow) {
        self.created.get_or_insert_with(Vec::new).push(row);
    }

    pub fn stage_changed(&mut self, row: ChangedRow) {
        self.changed.get_or_insert_with(Vec::new).push(row);
    }

    pub fn stage_deleted<I, S>(&mut self, offline_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deleted
            .get_or_insert_with(Vec::new)
            .extend(offline_ids.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.changed.is_none() && self.deleted.is_none()
    }
}

/// The single body posted by one sync call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncPayload {
    Created {
        #[serde(rename = "CreatedRows")]
        rows: Vec<NewRow>,
    },
    Changed {
        #[serde(rename = "ChangedRows")]
        rows: Vec<ChangedRow>,
    },
    Deleted {
        #[serde(rename = "DeletedRows")]
        offline_ids: Vec<String>,
    },
    FullReplace(ShoppingList),
}

impl SyncPayload {
    /// Pick the payload for `list`, draining `staged`
    ///
    /// Only the highest-priority diff is sent. Lower-priority diffs staged
    /// alongside it are dropped with the rest of the staging; the caller
    /// refreshes from the remote afterwards.
    pub fn select(list: &ShoppingList, staged: StagedRows) -> Self {
        let StagedRows {
            created,
            changed,
            deleted,
        } = staged;

        if let Some(offline_ids) = deleted {
            return SyncPayload::Deleted { offline_ids };
        }
        if let Some(rows) = changed {
            return SyncPayload::Changed { rows };
        }
        if let Some(rows) = created {
            return SyncPayload::Created { rows };
        }
        SyncPayload::FullReplace(list.clone())
    }

    /// Name of the diff key this payload carries, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SyncPayload::Created { .. } => "CreatedRows",
            SyncPayload::Changed { .. } => "ChangedRows",
            SyncPayload::Deleted { .. } => "DeletedRows",
            SyncPayload::FullReplace(_) => "FullReplace",
        }
    }
}
