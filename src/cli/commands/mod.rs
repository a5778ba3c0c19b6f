//! CLI command implementations.

mod chat;
mod config;
mod docs;
mod hello;
mod plan;
mod serve;

pub use chat::run_chat;
pub use config::run_config;
pub use docs::run_docs;
pub use hello::run_hello;
pub use plan::run_plan;
pub use serve::run_serve;
