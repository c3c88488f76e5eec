//! CLI formatting utilities.
//!
//! Shared colours, headers and tables so every command renders output the
//! same way.

mod headers;
mod output;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::print_key_value;
pub use status::{print_success, print_warning};
pub use tables::{print_edge_table, print_version_table};
