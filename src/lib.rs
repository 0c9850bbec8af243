//! Core library for Order Intake.
//! Normalizes purchase-order data of varying shapes (JSON exports, AI extraction
//! output, loose `key:value` lists) into a fixed summary table, expands and edits
//! part lines, and keeps an append-only store of saved snapshots.

pub mod config;
pub mod extract;
mod gui;
pub mod kv;
pub mod locate;
pub mod mutate;
pub mod normalize;
pub mod order;
pub mod session;
pub mod statics;
pub mod store;
pub mod value;

pub use config::AppConfig;
pub use gui::run_gui;
pub use kv::parse_key_value_list;
pub use locate::{LocatedOrder, OrderLocation, locate_order};
pub use mutate::{MutationError, PartLineEdit, PartLineOp, apply_part_line_op};
pub use normalize::normalize_document;
pub use order::{DetailRow, OrderShape, SummaryRow, expand_details, project_summary};
pub use session::{Session, SessionEvent, read_document_file};
pub use store::{JsonFileStore, SaveRecord, SaveStore, StoreError};
