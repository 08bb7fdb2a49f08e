pub mod archive;
pub mod commands;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod runtime;
