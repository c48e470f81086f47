//! Testing utilities for the cockpit workspace
//!
//! Shared fixtures and a scripted transport.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cockpit_model::{
    Category, Cockpit, Domain, Element, EntityId, GeoPoint, MapElement, Status, SubCategory,
    SubElement, TemplateType,
};
use cockpit_sync::{
    CockpitPayload, MemoryStorage, SyncConfig, SyncService, Transport, TransportError,
    WriteResponse,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Ids of the interesting nodes in [`plant_cockpit`]
#[derive(Debug, Clone)]
pub struct PlantIds {
    pub water: EntityId,
    pub map: EntityId,
    pub pumps_x: EntityId,
    pub pumps_y: EntityId,
    pub pump: EntityId,
    pub valves: EntityId,
    pub valve: EntityId,
    pub gauge: EntityId,
}

/// Small cockpit: a standard domain with two categories and one pump,
/// plus a map domain with one point
///
/// ```text
/// Water (standard)
///   X: Pump 1 [Valves: V1, V2] , Gauge
///   Y: (empty)
/// Sites (map)
///   HQ @ 48.85,2.35
/// ```
pub fn plant_cockpit() -> (Cockpit, PlantIds) {
    let mut cockpit = Cockpit::with_id(EntityId::new("plant"), "Plant");

    let mut water = Domain::new("Water", TemplateType::Standard, 0);
    let mut x = Category::new(water.id.clone(), "X", 0);
    let y = Category::new(water.id.clone(), "Y", 1);

    let mut pump = Element::new(x.id.clone(), "Pump 1", 0);
    let mut valves = SubCategory::new(pump.id.clone(), "Valves", 0);
    let valve = SubElement::new(valves.id.clone(), "V1", 0);
    let valve_id = valve.id.clone();
    valves.sub_elements.push(valve);
    valves
        .sub_elements
        .push(SubElement::new(valves.id.clone(), "V2", 1));
    let valves_id = valves.id.clone();
    pump.sub_categories.push(valves);

    let gauge = Element::new(x.id.clone(), "Gauge", 1).with_status(Status::Information);

    let ids_partial = (water.id.clone(), x.id.clone(), y.id.clone(), pump.id.clone(), gauge.id.clone());
    x.elements.extend([pump, gauge]);
    water.categories.extend([x, y]);

    let mut sites = Domain::new("Sites", TemplateType::Map, 1);
    sites
        .map_elements
        .push(MapElement::new(sites.id.clone(), "HQ", GeoPoint::new(48.85, 2.35)));
    let map_id = sites.id.clone();

    cockpit.domains.extend([water, sites]);

    let ids = PlantIds {
        water: ids_partial.0,
        map: map_id,
        pumps_x: ids_partial.1,
        pumps_y: ids_partial.2,
        pump: ids_partial.3,
        valves: valves_id,
        valve: valve_id,
        gauge: ids_partial.4,
    };
    (cockpit, ids)
}

/// A PUT seen by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub cockpit_id: EntityId,
    pub payload: CockpitPayload,
}

/// In-memory [`Transport`]
///
/// PUTs answer from a script (then 200 once the script runs out) and are
/// recorded. Successful PUTs update the stored server copy, which GETs
/// return. The health check succeeds unless the transport is set offline.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<WriteResponse, TransportError>>>,
    puts: Mutex<Vec<RecordedPut>>,
    documents: Mutex<HashMap<EntityId, Cockpit>>,
    offline: Mutex<bool>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue responses for upcoming PUTs
    pub fn script(&self, responses: impl IntoIterator<Item = Result<WriteResponse, TransportError>>) {
        self.script.lock().extend(responses);
    }

    /// Queue `n` identical status responses
    pub fn respond_with(&self, status: u16, n: usize) {
        let mut script = self.script.lock();
        for _ in 0..n {
            script.push_back(Ok(WriteResponse::new(status, format!("status {status}"))));
        }
    }

    /// Store a server copy for GETs
    pub fn serve(&self, cockpit: Cockpit) {
        self.documents.lock().insert(cockpit.id.clone(), cockpit);
    }

    /// Make every request fail with a network error
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().len()
    }

    fn check_online(&self) -> Result<(), TransportError> {
        if *self.offline.lock() {
            Err(TransportError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn put_cockpit(
        &self,
        id: &EntityId,
        payload: &CockpitPayload,
    ) -> Result<WriteResponse, TransportError> {
        self.check_online()?;
        self.puts.lock().push(RecordedPut {
            cockpit_id: id.clone(),
            payload: payload.clone(),
        });
        let response = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(WriteResponse::ok()));
        if matches!(&response, Ok(r) if r.is_success()) {
            let mut documents = self.documents.lock();
            let doc = documents
                .entry(id.clone())
                .or_insert_with(|| Cockpit::with_id(id.clone(), payload.name.clone()));
            doc.name = payload.name.clone();
            doc.domains = payload.domains.clone();
            doc.updated_at = Some(Utc::now());
        }
        response
    }

    async fn fetch_cockpit(&self, id: &EntityId) -> Result<Cockpit, TransportError> {
        self.check_online()?;
        self.documents
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                code: 404,
                message: format!("cockpit {id} not found"),
            })
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        self.check_online()
    }
}

/// Sync service over in-memory storage and `transport`
pub fn memory_service(transport: &Arc<ScriptedTransport>) -> (Arc<MemoryStorage>, SyncService) {
    memory_service_with(transport, &SyncConfig::default())
}

/// Sync service with an explicit config
pub fn memory_service_with(
    transport: &Arc<ScriptedTransport>,
    config: &SyncConfig,
) -> (Arc<MemoryStorage>, SyncService) {
    let storage = Arc::new(MemoryStorage::new());
    let service = SyncService::new(config, storage.clone(), transport.clone()).unwrap();
    (storage, service)
}

/// Timestamp `secs` seconds before now
pub fn seconds_ago(secs: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::seconds(secs)
}
