use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct SampleRecord {
    pub id: u32,
    pub name: String,
    pub age: u32,
}

#[utoipa::path(
    get,
    path = "/api/data",
    responses(
        (status = 200, description = "Fixed list of sample records", body = Vec<SampleRecord>)
    )
)]
pub async fn list_data() -> Json<Vec<SampleRecord>> {
    let records = vec![
        SampleRecord {
            id: 1,
            name: "John Doe".to_string(),
            age: 25,
        },
        SampleRecord {
            id: 2,
            name: "Jane Smith".to_string(),
            age: 30,
        },
        SampleRecord {
            id: 3,
            name: "Alice Johnson".to_string(),
            age: 22,
        },
        SampleRecord {
            id: 4,
            name: "Pavithradevi".to_string(),
            age: 77,
        },
        SampleRecord {
            id: 5,
            name: "Pavithra".to_string(),
            age: 66,
        },
    ];

    Json(records)
}

#[utoipa::path(
    post,
    path = "/api/data",
    responses(
        (status = 200, description = "Echoes the received JSON payload")
    )
)]
pub async fn receive_data(Json(received): Json<Value>) -> Json<Value> {
    info!("data received: {}", received);

    Json(json!({
        "message": "Data received successfully",
        "receivedData": received,
    }))
}
