pub mod agent;
pub mod builtin;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod service;
pub mod validation;
