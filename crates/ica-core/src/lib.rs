// # ica-core
//
// Core library for syncing ICA shopping lists as to-do lists.
//
// ## Architecture Overview
//
// - **ShoppingApi**: Trait for reaching the ICA handla API
// - **ShoppingListCoordinator**: Owns the list snapshot, memoized reference
//   data and staged row diffs
// - **ShoppingListTodo**: Presents one list as a to-do list
// - **TodoService**: Single task driving scheduled refreshes and commands
//
// ## Design Principles
//
// 1. **Remote is authoritative**: every mutation is followed by a refresh
// 2. **One diff per sync**: staged rows resolve to a single payload
// 3. **Library-First**: the daemon is a thin shell over this crate

pub mod traits;
pub mod coordinator;
pub mod config;
pub mod error;
pub mod service;
pub mod sync;
pub mod todo;
pub mod types;

// Re-export core types for convenience
pub use traits::ShoppingApi;
pub use coordinator::{CoordinatorEvent, ShoppingListCoordinator};
pub use config::{CoordinatorConfig, Credentials, IcaConfig};
pub use error::{Error, Result, SetupError};
pub use service::{TodoCommand, TodoService};
pub use sync::{ChangedRow, NewRow, StagedRows, SyncPayload};
pub use todo::{ShoppingListTodo, TodoItem, TodoItemStatus};
