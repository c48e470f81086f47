//! Cockpit Core - the cockpit editor
//!
//! Ties the entity tree, link propagation and the persistence pipeline
//! together around one current document:
//! - [`CockpitEditor`]: load, edit, link and duplicate; every change is
//!   autosaved (debounced or immediate)
//! - [`Selection`]: current domain / element / sub-element / map point
//! - [`EditorConfig`]: TOML configuration with environment overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use cockpit_core::{CockpitEditor, EditorConfig};
//! use cockpit_model::{ElementPatch, Status};
//!
//! let config = EditorConfig::load("cockpit.toml")?;
//! let editor = CockpitEditor::from_config(&config, Some(&token))?;
//! editor.start();
//! editor.load_cockpit(&cockpit_id).await?;
//! editor.update_element(&pump_id, &ElementPatch::new().with_status(Status::Critical));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod selection;

mod editor;

pub use config::{EditorConfig, ENDPOINT_ENV};
pub use editor::CockpitEditor;
pub use error::{ConfigError, EditorError};
pub use selection::Selection;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
