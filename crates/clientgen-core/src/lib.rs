//! Clientgen Core Library
//!
//! This library turns an OpenAPI v3 document into a single, self-contained
//! Rust source file: one record per component schema, a root service doing
//! the HTTP plumbing, and one service per tag with a synchronous and an
//! asynchronous method per endpoint.

pub mod config;
pub mod emit;
pub mod error;
pub mod generate;
pub mod openapi;
pub mod resolver;
pub mod source;
pub mod templates;
pub mod utils;

pub use crate::{
    config::Options,
    error::{Error, Result},
    generate::{generate, generate_at, generate_document_at, render, render_document},
    openapi::OpenApiContext,
};
