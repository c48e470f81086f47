//! Cockpit document and its containers
//!
//! A [`Cockpit`] is the root document: an ordered list of [`Domain`]s, each
//! holding ordered [`Category`]s of elements plus type-specific payload
//! (map points, background image, ...). Children are exclusively owned by
//! their parent's list.

use crate::element::{Element, Orientation};
use crate::id::EntityId;
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Root document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cockpit {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrolling_banner: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub use_original_view: bool,
    /// Zone metadata, carried opaquely
    #[serde(default)]
    pub zones: Vec<Value>,
    /// Template-icon map, carried opaquely
    #[serde(default)]
    pub template_icons: Map<String, Value>,
    /// Data-history structure, carried opaquely
    #[serde(default)]
    pub data_history: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_data_date: Option<String>,
    /// Server-side commit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cockpit {
    /// Create an empty cockpit with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(EntityId::generate(), name)
    }

    /// Create an empty cockpit with a known id
    #[must_use]
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            domains: Vec::new(),
            logo: None,
            scrolling_banner: None,
            shared_with: Vec::new(),
            use_original_view: false,
            zones: Vec::new(),
            template_icons: Map::new(),
            data_history: Value::Null,
            selected_data_date: None,
            updated_at: None,
        }
    }

    /// Decode a cockpit document and repair its parent ids
    ///
    /// # Errors
    /// Returns `ModelError::InvalidDocument` on malformed JSON
    pub fn from_json(json: &str) -> Result<Self, crate::ModelError> {
        let mut cockpit: Cockpit = serde_json::from_str(json)?;
        cockpit.repair_parent_links();
        Ok(cockpit)
    }

    /// Summary entry for cockpit lists
    #[must_use]
    pub fn summary(&self) -> CockpitSummary {
        CockpitSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Lightweight listing entry for non-current cockpits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CockpitSummary {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Domain template discriminator
///
/// Tags unknown to this build are kept verbatim in [`TemplateType::Other`]
/// so the document is written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateType {
    #[default]
    Standard,
    Map,
    Background,
    HoursTracking,
    Alerts,
    Other(String),
}

impl TemplateType {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TemplateType::Standard => "standard",
            TemplateType::Map => "map",
            TemplateType::Background => "background",
            TemplateType::HoursTracking => "hours-tracking",
            TemplateType::Alerts => "alerts",
            TemplateType::Other(tag) => tag,
        }
    }
}

impl From<String> for TemplateType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "standard" => TemplateType::Standard,
            "map" => TemplateType::Map,
            "background" => TemplateType::Background,
            "hours-tracking" => TemplateType::HoursTracking,
            "alerts" => TemplateType::Alerts,
            _ => TemplateType::Other(tag),
        }
    }
}

impl From<TemplateType> for String {
    fn from(template: TemplateType) -> Self {
        match template {
            TemplateType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a coordinate
    #[inline]
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Visible area of a map domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBounds {
    pub north_west: GeoPoint,
    pub south_east: GeoPoint,
}

/// Named, ordered top-level container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_elements: Vec<MapElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_bounds: Option<MapBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Type-specific payload not modelled here (incidents, hours, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Domain {
    /// Create a domain with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>, template_type: TemplateType, order: u32) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            order,
            template_type,
            categories: Vec::new(),
            map_elements: Vec::new(),
            map_bounds: None,
            background_image: None,
            extra: Map::new(),
        }
    }
}

/// Named, ordered, oriented container of elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub domain_id: EntityId,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    /// Create a category with a fresh id
    #[must_use]
    pub fn new(domain_id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            order,
            orientation: Orientation::default(),
            domain_id,
            elements: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Positioned point on a map domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapElement {
    pub id: EntityId,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Optional element this point stands for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<EntityId>,
    #[serde(default)]
    pub domain_id: EntityId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapElement {
    /// Create a map point with a fresh id
    #[must_use]
    pub fn new(domain_id: EntityId, name: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            lat: point.lat,
            lng: point.lng,
            status: Status::Ok,
            icon: None,
            element_id: None,
            domain_id,
            extra: Map::new(),
        }
    }

    /// Coordinate of this point
    #[inline]
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_document() {
        let json = r#"{
            "id": "ck1",
            "name": "Plant",
            "updatedAt": "2026-01-02T03:04:05Z",
            "domains": [{
                "id": "d1", "name": "Water", "templateType": "map",
                "categories": [{"id": "c1", "name": "Pumps", "elements": [
                    {"id": "e1", "name": "Pump 1", "subCategories": [
                        {"id": "sc1", "name": "Valves", "subElements": [{"id": "se1", "name": "V1"}]}
                    ]}
                ]}],
                "mapElements": [{"id": "m1", "name": "Site", "lat": 1.5, "lng": 2.5}],
                "incidents": [1, 2]
            }]
        }"#;
        let cockpit = Cockpit::from_json(json).unwrap();
        let domain = &cockpit.domains[0];
        assert_eq!(domain.template_type, TemplateType::Map);
        assert_eq!(domain.extra["incidents"], serde_json::json!([1, 2]));
        assert_eq!(domain.categories[0].domain_id.as_str(), "d1");
        let element = &domain.categories[0].elements[0];
        assert_eq!(element.category_id.as_str(), "c1");
        assert_eq!(element.sub_categories[0].element_id.as_str(), "e1");
        assert_eq!(element.sub_categories[0].sub_elements[0].sub_category_id.as_str(), "sc1");
        assert_eq!(domain.map_elements[0].domain_id.as_str(), "d1");
        assert!(cockpit.updated_at.is_some());
    }

    #[test]
    fn unknown_template_type_round_trips_verbatim() {
        let json = r#"{"id":"d","name":"x","templateType":"weather"}"#;
        let domain: Domain = serde_json::from_str(json).unwrap();
        assert_eq!(domain.template_type, TemplateType::Other("weather".into()));

        let written = serde_json::to_value(&domain).unwrap();
        assert_eq!(written["templateType"], "weather");
        let hours = serde_json::to_value(Domain::new("H", TemplateType::HoursTracking, 0)).unwrap();
        assert_eq!(hours["templateType"], "hours-tracking");
    }

    #[test]
    fn unknown_category_fields_survive_a_round_trip() {
        let json = r#"{"id":"c1","name":"C","domainId":"d1","horizontal":true,"layout":{"cols":3}}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.extra["horizontal"], true);

        let written = serde_json::to_value(&category).unwrap();
        assert_eq!(written["horizontal"], true);
        assert_eq!(written["layout"], serde_json::json!({"cols": 3}));
    }

    #[test]
    fn summary_copies_identity() {
        let cockpit = Cockpit::new("Plant");
        let summary = cockpit.summary();
        assert_eq!(summary.id, cockpit.id);
        assert_eq!(summary.name, "Plant");
    }
}
