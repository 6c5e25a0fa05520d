use crate::response::ApiResponse;
use crate::x::service::{Raw, Service, ServiceError};
use std::fs;

pub fn load_data(file: &str) -> String {
    fs::read_to_string(format!("tests/data/{file}.json")).expect("could not find test data")
}

/// A service that answers every request from a fixture file instead of
/// the network.
pub struct StubService {
    file: &'static str,
}

impl StubService {
    pub fn new(file: &'static str) -> Self {
        Self { file }
    }
}

impl Service for StubService {
    async fn get(
        &self,
        _path: &str,
        _query: &[(String, String)],
    ) -> Result<ApiResponse, ServiceError> {
        let value = serde_json::from_str(&load_data(self.file)).expect("fixture is not JSON");
        Ok(ApiResponse::from_value(value))
    }

    async fn get_raw(
        &self,
        _path: &str,
        _query: &[(String, String)],
    ) -> Result<Raw, ServiceError> {
        Ok(Raw {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: load_data(self.file),
        })
    }
}
