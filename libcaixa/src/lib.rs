//! Caixa - Cash book automation for spreadsheet ledgers
//! ---
//!
//! The core behind a small-business ledger kept in a spreadsheet: shorthand dates
//! are normalized as they are typed, project and account codes are filled in from
//! a reference sheet, running balances are kept per account and rows are colored
//! by their payment status.
//!
//! The host (a spreadsheet runtime, or the in-memory [`Workbook`][sheet::Workbook]
//! used by tests) reports edits to a [`Book`][book::Book] and invokes its menu
//! [`Action`][book::Action]s.
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// A1 notation: columns, cells and ranges, open-ended or not.
pub mod address;

/// pt-BR amount parsing and rendering.
pub mod amount;

pub mod balance;

/// The bookkeeping workbook, its edit hook and its menu actions.
///
/// [`Book`][book::Book] owns the workbook together with the current
/// [`Layout`][layout::Layout], the reference cache and the host services
/// (clock, notifier and remote documents).
pub mod book;

/// Time-limited caching of reference tables.
pub mod cache;

/// Shorthand date entry, e.g. `0110` for the first of October.
pub mod date;

pub mod entry;
pub mod error;

/// Copying reference data in from other documents.
pub mod import;

/// Where things live on the ledger, and the `option` directives to move them.
pub mod layout;

pub mod lookup;
pub mod notify;

/// Row colors by payment status.
pub mod paint;

/// Our pest entrypoints, A1 references and option documents.
pub mod parser;

/// In-memory sheets standing in for the host's.
pub mod sheet;

pub mod sort;

pub use book::{Action, Book, Edit};
pub use error::BookError;
pub use layout::Layout;
pub use sheet::{Sheet, Value, Workbook};
