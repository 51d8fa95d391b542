//! File operations module for Markport
//!
//! Native dialogs for choosing where exported files are written.

pub mod dialogs;
