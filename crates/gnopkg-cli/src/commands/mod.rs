//! Command implementations.
//!
//! Each command lives in its own module and exposes an `execute` function
//! taking its parsed arguments.

pub mod dev;
pub mod graph;
pub mod list;
pub mod modfile;
pub mod resolve;
pub(crate) mod utils;

pub use dev::execute as dev_execute;
pub use graph::execute as graph_execute;
pub use list::execute as list_execute;
pub use modfile::execute as mod_execute;
pub use resolve::execute as resolve_execute;
