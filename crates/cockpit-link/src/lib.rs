//! Cockpit Link - link groups between duplicated entities
//!
//! Keeps elements and sub-elements that stand for the same real-world
//! concept mirrored on a restricted field set:
//! - Resolves link-group siblings and the most critical peer
//! - Propagates direct edits to every other member, exactly once each
//! - Merges statuses so a linked status never drops in severity
//! - Links, unlinks and duplicates with auto-link
//!
//! # Example
//!
//! ```rust,ignore
//! use cockpit_link::{update_element, Origin};
//! use cockpit_model::{ElementPatch, Status};
//!
//! let patch = ElementPatch::new().with_status(Status::Critical);
//! let report = update_element(&mut cockpit, &pump_id, &patch, Origin::Direct);
//! println!("mirrored onto {} siblings", report.propagated.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod duplicate;
pub mod link;
pub mod propagate;
pub mod resolver;

pub use duplicate::{duplicate_element, duplicate_element_linked, duplicate_sub_element_linked};
pub use link::{
    link_element, link_sub_element, unlink_element, unlink_sub_element, LinkOptions, LinkReport,
};
pub use propagate::{update_element, update_linked, update_sub_element, Origin, PropagationReport};
pub use resolver::{
    element_siblings, merged_status, most_critical_sibling, siblings, sub_element_siblings,
    Elements, LinkKind, SubElements,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
