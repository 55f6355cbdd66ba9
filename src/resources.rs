//! Read-only resource hierarchy: workspace → projects → flights → data
//! products.
//!
//! Each level exposes a single list-children operation delegating to the
//! shared [`ApiClient`]. Nothing is cached: listing twice performs two round
//! trips and returns independently allocated objects.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{ApiClient, ClientOptions};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::util::date_portion;

const PROJECTS_ENDPOINT: &str = "/api/v1/projects";

fn raster_filter(has_raster: Option<bool>) -> Vec<(&'static str, String)> {
    match has_raster {
        Some(flag) => vec![("has_raster", flag.to_string())],
        None => Vec::new(),
    }
}

fn parse_children<T: DeserializeOwned>(endpoint: &str, body: Value) -> Result<Vec<T>> {
    serde_json::from_value(body).map_err(|source| Error::Json {
        endpoint: endpoint.to_string(),
        source,
    })
}

// Wire records: the typed fields each resource needs, with every other
// server field preserved verbatim in the flattened map.

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    id: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FlightRecord {
    id: String,
    project_id: String,
    #[serde(default)]
    acquisition_date: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DataProductRecord {
    id: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Root resource for an authenticated connection.
#[derive(Debug, Clone)]
pub struct Workspace {
    client: ApiClient,
    api_key: Option<String>,
}

impl Workspace {
    /// Opens a workspace over an authenticated session.
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self> {
        Self::with_options(base_url, session, ClientOptions::default())
    }

    pub fn with_options(
        base_url: &str,
        session: Arc<Session>,
        options: ClientOptions,
    ) -> Result<Self> {
        let api_key = session.api_key();
        let client = ApiClient::with_options(base_url, session, options)?;
        Ok(Self { client, api_key })
    }

    /// API key recorded at login. Not used for request authentication.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Client handle shared with every resource fetched through this
    /// workspace.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Lists the projects visible to this session.
    ///
    /// `Some(_)` sends the `has_raster` filter; `None` omits the parameter
    /// so the server applies its own default.
    pub fn get_projects(&self, has_raster: Option<bool>) -> Result<ProjectCollection> {
        let params = raster_filter(has_raster);
        let body = self.client.get(PROJECTS_ENDPOINT, &params)?;
        let records: Vec<ProjectRecord> = parse_children(PROJECTS_ENDPOINT, body)?;
        let collection = records
            .into_iter()
            .map(|record| Project::from_record(self.client.clone(), record))
            .collect();
        Ok(ProjectCollection { collection })
    }
}

/// A project, addressable root of flights.
#[derive(Debug, Clone)]
pub struct Project {
    client: ApiClient,
    pub id: String,
    /// Server-provided fields beyond `id`, preserved verbatim.
    pub properties: Map<String, Value>,
}

impl Project {
    fn from_record(client: ApiClient, record: ProjectRecord) -> Self {
        Self {
            client,
            id: record.id,
            properties: record.extra,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Lists this project's flights.
    pub fn get_flights(&self, has_raster: Option<bool>) -> Result<FlightCollection> {
        let endpoint = format!("{}/{}/flights", PROJECTS_ENDPOINT, self.id);
        let params = raster_filter(has_raster);
        let body = self.client.get(&endpoint, &params)?;
        let records: Vec<FlightRecord> = parse_children(&endpoint, body)?;
        let collection = records
            .into_iter()
            .map(|record| Flight::from_record(self.client.clone(), record))
            .collect();
        Ok(FlightCollection { collection })
    }
}

/// A flight within a project.
#[derive(Debug, Clone)]
pub struct Flight {
    client: ApiClient,
    pub id: String,
    /// Parent project id; flights cannot be addressed without it.
    pub project_id: String,
    /// Acquisition date, truncated to its `YYYY-MM-DD` portion.
    pub acquisition_date: Option<String>,
    pub properties: Map<String, Value>,
}

impl Flight {
    fn from_record(client: ApiClient, record: FlightRecord) -> Self {
        let acquisition_date = record
            .acquisition_date
            .map(|date| date_portion(&date).to_string());
        Self {
            client,
            id: record.id,
            project_id: record.project_id,
            acquisition_date,
            properties: record.extra,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Lists this flight's data products.
    pub fn get_data_products(&self) -> Result<DataProductCollection> {
        let endpoint = format!(
            "{}/{}/flights/{}/data_products",
            PROJECTS_ENDPOINT, self.project_id, self.id
        );
        let body = self.client.get(&endpoint, &[])?;
        let records: Vec<DataProductRecord> = parse_children(&endpoint, body)?;
        let collection = records
            .into_iter()
            .map(|record| DataProduct::from_record(self.client.clone(), record))
            .collect();
        Ok(DataProductCollection { collection })
    }
}

/// Leaf resource: a single data product of a flight.
#[derive(Debug, Clone)]
pub struct DataProduct {
    client: ApiClient,
    pub id: String,
    pub properties: Map<String, Value>,
}

impl DataProduct {
    fn from_record(client: ApiClient, record: DataProductRecord) -> Self {
        Self {
            client,
            id: record.id,
            properties: record.extra,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Ordered projects returned by a single list operation.
#[derive(Debug, Clone, Default)]
pub struct ProjectCollection {
    /// Children in server order.
    pub collection: Vec<Project>,
}

impl ProjectCollection {
    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.collection.iter()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

impl IntoIterator for ProjectCollection {
    type Item = Project;
    type IntoIter = std::vec::IntoIter<Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.collection.into_iter()
    }
}

/// Ordered flights returned by a single list operation.
#[derive(Debug, Clone, Default)]
pub struct FlightCollection {
    /// Children in server order.
    pub collection: Vec<Flight>,
}

impl FlightCollection {
    pub fn iter(&self) -> std::slice::Iter<'_, Flight> {
        self.collection.iter()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

impl IntoIterator for FlightCollection {
    type Item = Flight;
    type IntoIter = std::vec::IntoIter<Flight>;

    fn into_iter(self) -> Self::IntoIter {
        self.collection.into_iter()
    }
}

/// Ordered data products returned by a single list operation.
#[derive(Debug, Clone, Default)]
pub struct DataProductCollection {
    /// Children in server order.
    pub collection: Vec<DataProduct>,
}

impl DataProductCollection {
    pub fn iter(&self) -> std::slice::Iter<'_, DataProduct> {
        self.collection.iter()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

impl IntoIterator for DataProductCollection {
    type Item = DataProduct;
    type IntoIter = std::vec::IntoIter<DataProduct>;

    fn into_iter(self) -> Self::IntoIter {
        self.collection.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ACCESS_TOKEN_COOKIE;
    use serde_json::json;

    fn test_client() -> ApiClient {
        let session = Arc::new(Session::new());
        session.set_cookie(ACCESS_TOKEN_COOKIE, "tok", "localhost");
        ApiClient::new("http://localhost:8000", session).expect("client")
    }

    #[test]
    fn raster_filter_sends_the_flag_only_when_requested() {
        assert_eq!(
            raster_filter(Some(true)),
            vec![("has_raster", "true".to_string())]
        );
        assert_eq!(
            raster_filter(Some(false)),
            vec![("has_raster", "false".to_string())]
        );
        assert!(raster_filter(None).is_empty());
    }

    #[test]
    fn unknown_record_fields_are_preserved() {
        let record: ProjectRecord = serde_json::from_value(json!({
            "id": "p1",
            "title": "Field A",
            "centroid": {"x": 1.0, "y": 2.0}
        }))
        .expect("record");

        let project = Project::from_record(test_client(), record);
        assert_eq!(project.id, "p1");
        assert_eq!(project.property("title"), Some(&json!("Field A")));
        assert_eq!(project.property("centroid"), Some(&json!({"x": 1.0, "y": 2.0})));
        assert_eq!(project.property("id"), None);
    }

    #[test]
    fn flight_acquisition_date_is_truncated_to_a_calendar_date() {
        let record: FlightRecord = serde_json::from_value(json!({
            "id": "f1",
            "project_id": "p1",
            "acquisition_date": "2024-06-10T12:34:56",
            "sensor": "RGB"
        }))
        .expect("record");

        let flight = Flight::from_record(test_client(), record);
        assert_eq!(flight.acquisition_date.as_deref(), Some("2024-06-10"));
        assert_eq!(flight.project_id, "p1");
        assert_eq!(flight.property("sensor"), Some(&json!("RGB")));
    }

    #[test]
    fn flight_acquisition_date_without_a_time_part_is_unchanged() {
        let record: FlightRecord = serde_json::from_value(json!({
            "id": "f1",
            "project_id": "p1",
            "acquisition_date": "2024-06-10"
        }))
        .expect("record");

        let flight = Flight::from_record(test_client(), record);
        assert_eq!(flight.acquisition_date.as_deref(), Some("2024-06-10"));
    }

    #[test]
    fn flight_acquisition_date_may_be_absent() {
        let record: FlightRecord =
            serde_json::from_value(json!({"id": "f1", "project_id": "p1"})).expect("record");
        let flight = Flight::from_record(test_client(), record);
        assert_eq!(flight.acquisition_date, None);
    }

    #[test]
    fn parse_children_reports_the_endpoint_on_malformed_bodies() {
        let err = parse_children::<ProjectRecord>(PROJECTS_ENDPOINT, json!({"not": "a list"}))
            .unwrap_err();
        match err {
            Error::Json { endpoint, .. } => assert_eq!(endpoint, PROJECTS_ENDPOINT),
            other => panic!("unexpected error: {other}"),
        }
    }
}
