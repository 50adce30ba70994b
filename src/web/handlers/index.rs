use salvo::prelude::*;
use serde_json::json;

#[handler]
pub async fn index(res: &mut Response) {
    res.render(Json(json!({ "page": "index" })));
}
