//! To-do entity adapter
//!
//! Presents each cached shopping list as a to-do list: one item per row,
//! summary = product name, uid = offline id, completed = struck over.
//! User mutations are staged on the coordinator, synced, and followed by a
//! refresh.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinator::ShoppingListCoordinator;
use crate::error::{Error, Result};
use crate::sync::{ChangedRow, NewRow};
use crate::types::{ShoppingList, ShoppingListEntry};

/// Status of a to-do item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoItemStatus {
    NeedsAction,
    Completed,
}

impl TodoItemStatus {
    /// Map a row's `IsStrikedOver` flag
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            TodoItemStatus::Completed
        } else {
            TodoItemStatus::NeedsAction
        }
    }

    /// The `IsStrikedOver` flag for this status
    pub fn is_checked(self) -> bool {
        self == TodoItemStatus::Completed
    }
}

/// A to-do item as the host sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub summary: Option<String>,
    pub uid: Option<String>,
    pub status: TodoItemStatus,
}

impl TodoItem {
    /// A new, unchecked item with no uid yet
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            uid: None,
            status: TodoItemStatus::NeedsAction,
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_status(mut self, status: TodoItemStatus) -> Self {
        self.status = status;
        self
    }
}

impl From<&ShoppingListEntry> for TodoItem {
    fn from(row: &ShoppingListEntry) -> Self {
        Self {
            summary: Some(row.product_name.clone()),
            uid: row.offline_id.clone(),
            status: TodoItemStatus::from_checked(row.is_striked_over),
        }
    }
}

/// One shopping list exposed as a to-do list entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListTodo {
    list_id: i64,
    unique_id: String,
    name: String,
}

impl ShoppingListTodo {
    /// Entity for `list`, unique within the config entry `entry_id`
    pub fn new(entry_id: &str, list: &ShoppingList) -> Self {
        Self {
            list_id: list.id,
            unique_id: format!("{}-{}", entry_id, list.id),
            name: list.title.clone(),
        }
    }

    /// One entity per cached list
    pub fn for_lists(entry_id: &str, lists: &[ShoppingList]) -> Vec<Self> {
        lists.iter().map(|list| Self::new(entry_id, list)).collect()
    }

    pub fn list_id(&self) -> i64 {
        self.list_id
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current items, read from the coordinator's snapshot
    ///
    /// Empty if the list has disappeared from the snapshot.
    pub fn items(&self, coordinator: &ShoppingListCoordinator) -> Vec<TodoItem> {
        coordinator
            .get_shopping_list(self.list_id)
            .map(|list| list.rows.iter().map(TodoItem::from).collect())
            .unwrap_or_default()
    }

    /// Add a row for `item`
    ///
    /// # Returns
    ///
    /// The offline id generated for the new row
    pub async fn create_item(
        &self,
        coordinator: &mut ShoppingListCoordinator,
        item: &TodoItem,
    ) -> Result<String> {
        if item.status != TodoItemStatus::NeedsAction {
            return Err(Error::invalid_input("Only active tasks may be created."));
        }
        let summary = item
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::invalid_input("A new item needs a summary"))?;

        let article_group = coordinator.get_article_group(summary);
        let offline_id =
            coordinator.stage_created(self.list_id, NewRow::new(summary, article_group))?;
        debug!(
            "Creating '{}' ({}) in list {} with article group {}",
            summary, offline_id, self.list_id, article_group
        );

        coordinator.sync_list(self.list_id).await?;
        coordinator.request_refresh().await;
        Ok(offline_id)
    }

    /// Push `item`'s checked state
    pub async fn update_item(
        &self,
        coordinator: &mut ShoppingListCoordinator,
        item: &TodoItem,
    ) -> Result<()> {
        let uid = item
            .uid
            .as_deref()
            .ok_or_else(|| Error::invalid_input("An updated item needs a uid"))?;

        coordinator.stage_changed(
            self.list_id,
            ChangedRow::new(uid, item.status.is_checked()),
        )?;

        coordinator.sync_list(self.list_id).await?;
        coordinator.request_refresh().await;
        Ok(())
    }

    /// Delete the rows with these uids
    pub async fn delete_items(
        &self,
        coordinator: &mut ShoppingListCoordinator,
        uids: &[String],
    ) -> Result<()> {
        coordinator.stage_deleted(self.list_id, uids)?;

        coordinator.sync_list(self.list_id).await?;
        coordinator.request_refresh().await;
        Ok(())
    }

    /// Reordering is not supported by the remote diff format; the list is
    /// re-sent whole and refreshed
    pub async fn move_item(
        &self,
        coordinator: &mut ShoppingListCoordinator,
        uid: &str,
        previous_uid: Option<&str>,
    ) -> Result<()> {
        debug!(
            "Move of {} after {:?} in list {} re-syncs the whole list",
            uid, previous_uid, self.list_id
        );

        coordinator.sync_list(self.list_id).await?;
        coordinator.request_refresh().await;
        Ok(())
    }
}
