//! # Repository Module
//!
//! SQLite repositories behind the store interfaces.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RegisterService                                                       │
//! │       │                                                                 │
//! │       │  store.atomic_transition(id, &Transition::Enclose { .. })      │
//! │       ▼                                                                 │
//! │  impl RegisterStore for Database                                       │
//! │       │                                                                 │
//! │       │  db.registers().transition(id, &transition)                    │
//! │       ▼                                                                 │
//! │  RegisterRepository                                                    │
//! │  ├── insert / get_by_id / list                                         │
//! │  ├── transition        (guarded UPDATE … WHERE state = ?)              │
//! │  └── add_item / remove_item / live_items                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RegisterRepository`](register::RegisterRepository) - Registers and correction items
//! - [`SalesRepository`](sales::SalesRepository) - Payment events and sales lines

pub mod register;
pub mod sales;
