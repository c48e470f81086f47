//! Cockpit Model
//!
//! In-memory owned hierarchy of a cockpit dashboard:
//! Cockpit → Domain → Category → Element → SubCategory → SubElement,
//! plus map points owned by domains.
//!
//! # Core Concepts
//!
//! - [`Cockpit`]: root document, serialized as camelCase JSON
//! - [`Status`]: fixed severity order, merged by [`most_critical_status`]
//! - [`LinkGroupId`]: weak relation between copies of the same concept
//! - [`ElementPatch`] / [`SubElementPatch`]: shallow updates with a mirrored subset
//! - [`order`]: dense zero-based sibling ordering helpers
//!
//! The model is pure data. Link propagation lives in `cockpit-link`,
//! persistence in `cockpit-sync`.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod clone;
mod cockpit;
mod element;
mod error;
mod id;
mod patch;
mod status;
mod tree;

pub mod order;

pub use cockpit::{
    Category, Cockpit, CockpitSummary, Domain, GeoPoint, MapBounds, MapElement, TemplateType,
};
pub use element::{
    names_match, Element, Linkable, Orientation, Position, Size, SubCategory, SubElement,
};
pub use error::ModelError;
pub use id::{EntityId, LinkGroupId};
pub use order::{Identified, Ordered};
pub use patch::{
    ContainerPatch, DomainPatch, ElementPatch, LinkedPatch, MapElementPatch, SubElementPatch,
};
pub use status::{most_critical_status, Status};
pub use tree::{ElementLocation, SubElementLocation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
