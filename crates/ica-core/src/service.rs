//! To-do list service
//!
//! Owns the coordinator and one [`ShoppingListTodo`] per cached list, and
//! drives both from a single task: scheduled refreshes, user commands and
//! shutdown are multiplexed with `tokio::select!`, so refreshes and
//! mutations never overlap.

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::coordinator::ShoppingListCoordinator;
use crate::error::{Error, Result};
use crate::todo::{ShoppingListTodo, TodoItem, TodoItemStatus};

/// A user action addressed to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoCommand {
    /// Add an unchecked item to a list
    CreateItem { list_id: i64, summary: String },

    /// Set an item's checked state
    UpdateItem {
        list_id: i64,
        uid: String,
        status: TodoItemStatus,
    },

    /// Delete items from a list
    DeleteItems { list_id: i64, uids: Vec<String> },

    /// Reorder an item; re-syncs the whole list
    MoveItem {
        list_id: i64,
        uid: String,
        previous_uid: Option<String>,
    },

    /// Log every list and its items
    Show,

    /// Refresh now instead of waiting for the next tick
    Refresh,

    /// Create an empty list
    CreateList {
        title: String,
        comment: String,
        store_sorting: bool,
    },

    /// Delete a list by offline id
    DeleteList { offline_id: String },
}

/// Coordinator plus the to-do entities derived from its snapshot
pub struct TodoService {
    coordinator: ShoppingListCoordinator,
    entry_id: String,
    entities: Vec<ShoppingListTodo>,
}

impl TodoService {
    /// Perform the first refresh and create one entity per list
    ///
    /// Unlike scheduled refreshes, a failure here is returned: the caller
    /// should retry setup later.
    pub async fn setup(
        mut coordinator: ShoppingListCoordinator,
        entry_id: impl Into<String>,
    ) -> Result<Self> {
        coordinator.refresh().await?;

        let entry_id = entry_id.into();
        let entities = ShoppingListTodo::for_lists(&entry_id, coordinator.shopping_lists());
        info!("Set up {} shopping list(s) as to-do lists", entities.len());

        Ok(Self {
            coordinator,
            entry_id,
            entities,
        })
    }

    pub fn coordinator(&self) -> &ShoppingListCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ShoppingListCoordinator {
        &mut self.coordinator
    }

    pub fn entities(&self) -> &[ShoppingListTodo] {
        &self.entities
    }

    /// Items of the entity for `list_id`
    pub fn items(&self, list_id: i64) -> Option<Vec<TodoItem>> {
        self.entities
            .iter()
            .find(|entity| entity.list_id() == list_id)
            .map(|entity| entity.items(&self.coordinator))
    }

    /// Apply one command
    pub async fn handle(&mut self, command: TodoCommand) -> Result<()> {
        debug!("Handling {:?}", command);

        match command {
            TodoCommand::CreateItem { list_id, summary } => {
                let entity = self.entity(list_id)?;
                let uid = entity
                    .create_item(&mut self.coordinator, &TodoItem::new(summary))
                    .await?;
                debug!("Created item {} in list {}", uid, list_id);
            }
            TodoCommand::UpdateItem {
                list_id,
                uid,
                status,
            } => {
                let entity = self.entity(list_id)?;
                let item = self.current_item(list_id, &uid).with_status(status);
                entity.update_item(&mut self.coordinator, &item).await?;
            }
            TodoCommand::DeleteItems { list_id, uids } => {
                let entity = self.entity(list_id)?;
                entity.delete_items(&mut self.coordinator, &uids).await?;
            }
            TodoCommand::MoveItem {
                list_id,
                uid,
                previous_uid,
            } => {
                let entity = self.entity(list_id)?;
                entity
                    .move_item(&mut self.coordinator, &uid, previous_uid.as_deref())
                    .await?;
            }
            TodoCommand::Show => self.log_lists(),
            TodoCommand::Refresh => self.coordinator.refresh().await?,
            TodoCommand::CreateList {
                title,
                comment,
                store_sorting,
            } => {
                self.coordinator
                    .create_list(&title, &comment, store_sorting)
                    .await?;
            }
            TodoCommand::DeleteList { offline_id } => {
                self.coordinator.delete_list(&offline_id).await?;
            }
        }

        self.rebuild_entities();
        Ok(())
    }

    /// Run until Ctrl+C
    pub async fn run(&mut self, commands: mpsc::Receiver<TodoCommand>) -> Result<()> {
        self.run_with_shutdown(commands, None).await
    }

    /// Run until `shutdown_rx` fires, or until Ctrl+C when none is given
    ///
    /// The first scheduled refresh happens one interval after start, since
    /// [`setup`](Self::setup) already refreshed. Failed refreshes and
    /// commands are logged and the loop keeps running. Once the command
    /// channel closes, only scheduled refreshes remain.
    pub async fn run_with_shutdown(
        &mut self,
        mut commands: mpsc::Receiver<TodoCommand>,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        let period = self.coordinator.update_interval();
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl+C: {}", e);
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        info!("Refreshing every {}s", period.as_secs());

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    if let Err(e) = self.coordinator.refresh().await {
                        warn!("Scheduled refresh failed, retrying next interval: {}", e);
                    }
                    self.rebuild_entities();
                }

                Some(command) = commands.recv() => {
                    if let Err(e) = self.handle(command).await {
                        error!("Command failed: {}", e);
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("To-do service stopped");
        Ok(())
    }

    fn entity(&self, list_id: i64) -> Result<ShoppingListTodo> {
        self.entities
            .iter()
            .find(|entity| entity.list_id() == list_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("No to-do list for shopping list {}", list_id)))
    }

    /// The item with `uid`, or a bare item carrying only the uid
    fn current_item(&self, list_id: i64, uid: &str) -> TodoItem {
        self.coordinator
            .get_shopping_list(list_id)
            .and_then(|list| list.row(uid))
            .map(TodoItem::from)
            .unwrap_or(TodoItem {
                summary: None,
                uid: Some(uid.to_string()),
                status: TodoItemStatus::NeedsAction,
            })
    }

    /// Lists may appear or disappear with any refresh
    fn rebuild_entities(&mut self) {
        let entities = ShoppingListTodo::for_lists(&self.entry_id, self.coordinator.shopping_lists());
        if entities != self.entities {
            debug!("To-do lists changed: {} now", entities.len());
            self.entities = entities;
        }
    }

    fn log_lists(&self) {
        for entity in &self.entities {
            info!("[{}] {} ({})", entity.list_id(), entity.name(), entity.unique_id());
            for item in entity.items(&self.coordinator) {
                let mark = if item.status.is_checked() { "x" } else { " " };
                info!(
                    "  [{}] {} ({})",
                    mark,
                    item.summary.as_deref().unwrap_or_default(),
                    item.uid.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

impl std::fmt::Debug for TodoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoService")
            .field("coordinator", &self.coordinator)
            .field("entry_id", &self.entry_id)
            .field("entities", &self.entities.len())
            .finish()
    }
}
