pub mod api;
pub mod chat;
pub mod language;
pub mod nearby;
