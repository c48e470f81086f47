//! Status-bearing entities
//!
//! - [`Element`]: primary unit, owns sub-categories
//! - [`SubCategory`]: ordered container of sub-elements
//! - [`SubElement`]: leaf unit
//!
//! Elements and sub-elements may carry a `linkedGroupId`, a weak relation to
//! copies of the same concept elsewhere in the tree.

use crate::id::{deserialize_group_id, EntityId, LinkGroupId};
use crate::status::Status;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Layout direction of a container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Position on a background canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Display size on a background canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Entity that can belong to a link group
pub trait Linkable {
    /// Display name
    fn name(&self) -> &str;

    /// Current status
    fn status(&self) -> Status;

    /// Link group, if any
    fn linked_group_id(&self) -> Option<&LinkGroupId>;

    /// Join (or leave, with `None`) a link group
    fn set_linked_group_id(&mut self, group: Option<LinkGroupId>);
}

/// Primary status-bearing unit of a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub show_value: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_group_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_group_id: Option<LinkGroupId>,
    #[serde(default)]
    pub category_id: EntityId,
    #[serde(default)]
    pub sub_categories: Vec<SubCategory>,
    /// Fields this crate does not model, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create an element with a fresh id
    #[must_use]
    pub fn new(category_id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            order,
            status: Status::Ok,
            icon: None,
            icon2: None,
            icon3: None,
            value: None,
            unit: None,
            position: None,
            size: None,
            show_value: false,
            linked_group_id: None,
            category_id,
            sub_categories: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Builder: set status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Iterate every owned sub-element
    pub fn sub_elements(&self) -> impl Iterator<Item = &SubElement> {
        self.sub_categories.iter().flat_map(|sc| sc.sub_elements.iter())
    }

    /// Iterate every owned sub-element mutably
    pub fn sub_elements_mut(&mut self) -> impl Iterator<Item = &mut SubElement> {
        self.sub_categories
            .iter_mut()
            .flat_map(|sc| sc.sub_elements.iter_mut())
    }

    /// Clear this element's link and those of every owned sub-element
    pub fn sever_links(&mut self) {
        self.linked_group_id = None;
        for sub in self.sub_elements_mut() {
            sub.linked_group_id = None;
        }
    }

    /// Find a sub-category by case-insensitive name
    #[must_use]
    pub fn sub_category_named(&self, name: &str) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|sc| names_match(&sc.name, name))
    }
}

impl Linkable for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.status
    }

    fn linked_group_id(&self) -> Option<&LinkGroupId> {
        self.linked_group_id.as_ref()
    }

    fn set_linked_group_id(&mut self, group: Option<LinkGroupId>) {
        self.linked_group_id = group;
    }
}

/// Ordered container of sub-elements owned by one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub element_id: EntityId,
    #[serde(default)]
    pub sub_elements: Vec<SubElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubCategory {
    /// Create a sub-category with a fresh id
    #[must_use]
    pub fn new(element_id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            order,
            orientation: Orientation::default(),
            element_id,
            sub_elements: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Find a sub-element by case-insensitive name
    #[must_use]
    pub fn sub_element_named(&self, name: &str) -> Option<&SubElement> {
        self.sub_elements.iter().find(|se| names_match(&se.name, name))
    }
}

/// Leaf status-bearing unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubElement {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_group_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_group_id: Option<LinkGroupId>,
    #[serde(default)]
    pub sub_category_id: EntityId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubElement {
    /// Create a sub-element with a fresh id
    #[must_use]
    pub fn new(sub_category_id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            order,
            status: Status::Ok,
            icon: None,
            value: None,
            unit: None,
            linked_group_id: None,
            sub_category_id,
            extra: Map::new(),
        }
    }

    /// Builder: set status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

impl Linkable for SubElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.status
    }

    fn linked_group_id(&self) -> Option<&LinkGroupId> {
        self.linked_group_id.as_ref()
    }

    fn set_linked_group_id(&mut self, group: Option<LinkGroupId>) {
        self.linked_group_id = group;
    }
}

/// Case-insensitive, whitespace-trimmed name comparison used for link unions
#[inline]
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_group_id_reads_as_none() {
        let json = r#"{"id":"e1","name":"Pump","linkedGroupId":""}"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert!(element.linked_group_id.is_none());
        assert_eq!(element.status, Status::Ok);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let json = r#"{"id":"e1","name":"Pump","status":"critique","publication":{"on":true}}"#;
        let element: Element = serde_json::from_str(json).unwrap();
        assert_eq!(element.status, Status::Critical);
        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["publication"]["on"], Value::Bool(true));
        assert_eq!(back["status"], Value::String("critique".into()));

        let json = r#"{"id":"sc1","name":"Valves","elementId":"e1","collapsed":true}"#;
        let sub_category: SubCategory = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&sub_category).unwrap();
        assert_eq!(back["collapsed"], Value::Bool(true));
        assert_eq!(back["elementId"], Value::String("e1".into()));
    }

    #[test]
    fn sever_links_clears_sub_elements() {
        let mut element = Element::new(EntityId::new("c"), "Pump", 0);
        element.linked_group_id = Some(LinkGroupId::new("g"));
        let mut sc = SubCategory::new(element.id.clone(), "Valves", 0);
        let mut se = SubElement::new(sc.id.clone(), "V1", 0);
        se.linked_group_id = Some(LinkGroupId::new("g2"));
        sc.sub_elements.push(se);
        element.sub_categories.push(sc);

        element.sever_links();

        assert!(element.linked_group_id.is_none());
        assert!(element.sub_elements().all(|se| se.linked_group_id.is_none()));
    }

    #[test]
    fn names_match_ignores_case_and_padding() {
        assert!(names_match(" Valves", "valves "));
        assert!(!names_match("Valves", "Valve"));
    }
}
