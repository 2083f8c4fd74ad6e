//! History view: filtering, sorting and the manage-mode delete workflow.
//!
//! Everything here works on a [`DisplayRecord`](crate::models::DisplayRecord)
//! snapshot and never touches the store except through
//! [`ManageMode::confirm`].

mod filter;
mod manage;

pub use filter::*;
pub use manage::*;
