use salvo::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::web::WebState;

/// Request bodies keep every field optional: a missing value is forwarded to
/// the store as NULL and rejected there, never validated up front.
#[derive(Debug, Deserialize)]
struct CreatePersonBody {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateEmployeeBody {
    name: Option<String>,
    salary: Option<i64>,
}

fn render_success<T: Serialize>(res: &mut Response, page: &str, result: &T) {
    res.render(Json(json!({ "page": page, "result": result })));
}

// Failures keep HTTP status 200; the error is encoded in the body.
fn render_error(res: &mut Response, page: &str, message: &str) {
    warn!(page, error = message, "request failed");
    res.render(Json(json!({ "page": page, "error": message })));
}

fn obtain_state<'a>(depot: &'a Depot, res: &mut Response, page: &str) -> Option<&'a WebState> {
    match depot.obtain::<WebState>() {
        Ok(state) => Some(state),
        Err(_) => {
            render_error(res, page, "web state not initialized");
            None
        }
    }
}

#[handler]
pub async fn list_persons(depot: &mut Depot, res: &mut Response) {
    const PAGE: &str = "GET /person";

    let Some(state) = obtain_state(depot, res, PAGE) else {
        return;
    };

    match state.registry.list_persons().await {
        Ok(persons) => render_success(res, PAGE, &persons),
        Err(err) => render_error(res, PAGE, &err.to_string()),
    }
}

#[handler]
pub async fn create_person(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    const PAGE: &str = "POST /person";

    let body = match req.parse_json::<CreatePersonBody>().await {
        Ok(body) => body,
        Err(err) => {
            render_error(res, PAGE, &err.to_string());
            return;
        }
    };

    let Some(state) = obtain_state(depot, res, PAGE) else {
        return;
    };

    match state.registry.create_person(body.name.as_deref()).await {
        Ok(person) => render_success(res, PAGE, &person),
        Err(err) => render_error(res, PAGE, &err.to_string()),
    }
}

#[handler]
pub async fn list_employees(depot: &mut Depot, res: &mut Response) {
    const PAGE: &str = "GET /employee";

    let Some(state) = obtain_state(depot, res, PAGE) else {
        return;
    };

    match state.registry.list_employees().await {
        Ok(records) => render_success(res, PAGE, &records),
        Err(err) => render_error(res, PAGE, &err.to_string()),
    }
}

#[handler]
pub async fn create_employee(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    const PAGE: &str = "POST /employee";

    let body = match req.parse_json::<CreateEmployeeBody>().await {
        Ok(body) => body,
        Err(err) => {
            render_error(res, PAGE, &err.to_string());
            return;
        }
    };

    let Some(state) = obtain_state(depot, res, PAGE) else {
        return;
    };

    match state
        .registry
        .create_employee(body.name.as_deref(), body.salary)
        .await
    {
        Ok(employee) => render_success(res, PAGE, &employee),
        Err(err) => render_error(res, PAGE, &err.to_string()),
    }
}
