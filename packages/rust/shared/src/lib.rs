//! Shared types, error model, and configuration for Datawalker.
//!
//! This crate is the foundation depended on by all other Datawalker crates.
//! It provides:
//! - [`DatawalkerError`], the unified error type
//! - Domain types ([`SectionConfig`], [`ExtractedContent`], [`ScriptFragment`], ...)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractConfig, MountRuleConfig, OutputConfig, SourceConfig, StyleRewriteConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{DatawalkerError, Result};
pub use types::{
    ExtractedContent, LocatorMiss, ScriptFragment, SectionConfig, SectionSpec, SourceLocation,
    StyleFragment, escape_attr, title_case,
};
