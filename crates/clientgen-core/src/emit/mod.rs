//! Emitters writing the sections of the generated file into a [`SourceFile`].
//!
//! [`SourceFile`]: crate::source::SourceFile

pub mod calls;
pub mod root;
pub mod types;

pub use calls::emit_call_groups;
pub use root::emit_api_root;
pub use types::emit_types;
