// Command definitions and handlers live in the library so they can be tested
#[path = "commands.rs"]
pub mod commands;
#[path = "handlers.rs"]
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{build_config, expand_path, handle_links, handle_products, handle_status};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
