use std::sync::Arc;

use anyhow::Result;
use salvo::prelude::*;
use tracing::info;

use crate::config::Config;
use crate::registry::Registry;

pub mod handlers;

use self::handlers::directory::{create_employee, create_person, list_employees, list_persons};
use self::handlers::index::index;

/// Shared per-request context, injected into the depot by `affix_state`.
#[derive(Clone)]
pub struct WebState {
    pub registry: Arc<Registry>,
}

pub fn create_router(state: WebState) -> Router {
    Router::new()
        .hoop(affix_state::inject(state))
        .get(index)
        .push(
            Router::with_path("person")
                .get(list_persons)
                .post(create_person),
        )
        .push(
            Router::with_path("employee")
                .get(list_employees)
                .post(create_employee),
        )
}

pub struct WebServer {
    config: Arc<Config>,
    state: WebState,
}

impl WebServer {
    pub fn new(config: Arc<Config>, registry: Arc<Registry>) -> Self {
        Self {
            config,
            state: WebState { registry },
        }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor)
            .serve(create_router(self.state.clone()))
            .await;

        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::sync::Arc;

    use salvo::http::StatusCode;
    use salvo::test::{ResponseExt, TestClient};
    use salvo::Service;
    use serde_json::{Value, json};
    use tempfile::NamedTempFile;

    use super::{WebState, create_router};
    use crate::config::DatabaseConfig;
    use crate::db::DatabaseManager;
    use crate::registry::Registry;

    async fn test_service() -> (Service, NamedTempFile) {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = DatabaseConfig {
            url: None,
            conn_string: None,
            filename: Some(file.path().to_string_lossy().to_string()),
            max_connections: Some(1),
            min_connections: Some(1),
        };

        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");

        let state = WebState {
            registry: Arc::new(Registry::new(Arc::new(manager))),
        };

        (Service::new(create_router(state)), file)
    }

    async fn body_json(mut res: salvo::http::Response) -> Value {
        let text = res.take_string().await.expect("response body");
        serde_json::from_str(&text).expect("response is json")
    }

    #[tokio::test]
    async fn index_page() {
        let (service, _file) = test_service().await;

        let res = TestClient::get("http://127.0.0.1:5800/")
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body = body_json(res).await;
        assert_eq!(body, json!({ "page": "index" }));
    }

    #[tokio::test]
    async fn create_person_then_list() {
        let (service, _file) = test_service().await;

        let res = TestClient::post("http://127.0.0.1:5800/person")
            .json(&json!({ "name": "Ada" }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body = body_json(res).await;
        assert_eq!(body["page"], "POST /person");
        assert_eq!(body["result"]["name"], "Ada");
        let id = body["result"]["id"].as_i64().expect("generated id");
        assert!(id > 0);

        let res = TestClient::get("http://127.0.0.1:5800/person")
            .send(&service)
            .await;
        let body = body_json(res).await;
        assert_eq!(body["page"], "GET /person");
        let persons = body["result"].as_array().expect("person list");
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0]["id"].as_i64(), Some(id));
        assert_eq!(persons[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn create_employee_then_list() {
        let (service, _file) = test_service().await;

        let res = TestClient::post("http://127.0.0.1:5800/employee")
            .json(&json!({ "name": "Grace", "salary": 750_000 }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body = body_json(res).await;
        assert_eq!(body["page"], "POST /employee");
        let employee_id = body["result"]["id"].as_i64().expect("employee id");
        assert!(body["result"]["person_id"].as_i64().expect("person id") > 0);
        assert_eq!(body["result"]["salary"].as_i64(), Some(750_000));

        let res = TestClient::get("http://127.0.0.1:5800/employee")
            .send(&service)
            .await;
        let body = body_json(res).await;
        assert_eq!(body["page"], "GET /employee");
        let records = body["result"].as_array().expect("employee list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"].as_i64(), Some(employee_id));
        assert_eq!(records[0]["name"], "Grace");
        assert_eq!(records[0]["salary"].as_i64(), Some(750_000));
    }

    #[tokio::test]
    async fn duplicate_name_error_keeps_status_200() {
        let (service, _file) = test_service().await;

        TestClient::post("http://127.0.0.1:5800/person")
            .json(&json!({ "name": "Ada" }))
            .send(&service)
            .await;

        let res = TestClient::post("http://127.0.0.1:5800/person")
            .json(&json!({ "name": "Ada" }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body = body_json(res).await;
        assert_eq!(body["page"], "POST /person");
        assert!(body.get("result").is_none());
        let error = body["error"].as_str().expect("error message");
        assert!(error.contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn failed_employee_insert_reports_error_and_orphan_person_remains() {
        let (service, _file) = test_service().await;

        let res = TestClient::post("http://127.0.0.1:5800/employee")
            .json(&json!({ "name": "Carol" }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body = body_json(res).await;
        assert_eq!(body["page"], "POST /employee");
        let error = body["error"].as_str().expect("error message");
        assert!(error.contains("NOT NULL constraint failed"));

        // The person from the first insert is still listed.
        let res = TestClient::get("http://127.0.0.1:5800/person")
            .send(&service)
            .await;
        let body = body_json(res).await;
        let persons = body["result"].as_array().expect("person list");
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0]["name"], "Carol");
    }
}
