//! # Repository Module
//!
//! Database repositories for the equipment store.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  CLI / UI                                                               │
//! │       │                                                                 │
//! │       │  db.equipment().adjust_quantity(id, -2, "Manual Update", "")   │
//! │       ▼                                                                 │
//! │  EquipmentRepository              HistoryRepository                    │
//! │  ├── list_all / get_by_id         ├── search(query)                    │
//! │  ├── create / create_batch        ├── for_equipment(id)                │
//! │  ├── adjust_quantity              └── count_for(id)                    │
//! │  ├── update_fields                                                     │
//! │  └── delete                        (read-only)                         │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  SQLite: equipment ◄──────────── transactions (ON DELETE CASCADE)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`EquipmentRepository`](equipment::EquipmentRepository) - Current state and the write protocol
//! - [`HistoryRepository`](history::HistoryRepository) - Audit-log queries

pub mod equipment;
pub mod history;
