//! Template rendering core: field formatting, placeholder discovery and
//! substitution.

pub mod form;
pub mod format;
pub mod placeholder;
pub mod substitute;

pub use format::{format, format_with, FormatPolicy, MonetaryStyle};
pub use placeholder::{extract, reconcile};
pub use substitute::render;
