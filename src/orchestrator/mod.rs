//! Application-level orchestration.
//!
//! `file_list` owns the output file list and the upload submission; `controller` drives
//! it from UI commands; `validate` holds the client-side upload checks.

#[cfg_attr(not(feature = "tui"), allow(dead_code))]
mod controller;
mod file_list;
mod validate;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{run_controller, UiCommand};
pub use file_list::FileListController;
