use crate::AppState;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use campusway::edit::{self, EditError, TempEditRequest};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize)]
struct EditableDataQuery {
    collection: Option<String>,
}

#[actix_web::get("/api/temp-edit/editable-data")]
pub async fn get_editable_data(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let params = web::Query::<EditableDataQuery>::from_query(req.query_string());
    if let Err(params) = &params {
        eprintln!("{}", params);
        return HttpResponse::BadRequest().body("Invalid query parameters");
    }
    let params = params.unwrap();

    let Some(collection) = params.collection.as_deref() else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Collection parameter is required" }));
    };

    match edit::get_editable_data(state.store.as_ref(), collection, Utc::now()).await {
        Ok(buses) => HttpResponse::Ok().json(serde_json::json!({ "buses": buses })),
        Err(e) => {
            log::error!(
                "editable data fetch failed for collection {}: {}",
                collection,
                e
            );
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal Server Error" }))
        }
    }
}

#[actix_web::post("/api/temp-edit/temp-edit")]
pub async fn save_temp_edit(
    state: web::Data<AppState>,
    body: web::Json<TempEditRequest>,
) -> impl Responder {
    match edit::save_temp_edit(
        state.store.as_ref(),
        body.into_inner(),
        state.temp_change_ttl,
        Utc::now(),
    )
    .await
    {
        Ok(change) => {
            log::info!(
                "saved temporary change {} for bus {} -> {}",
                change.id,
                change.source_bus_id,
                change.target_bus_number
            );
            HttpResponse::Ok().json(serde_json::json!({ "success": true }))
        }
        Err(EditError::Invalid(reason)) => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": reason }))
        }
        Err(EditError::Store(e)) => {
            log::error!("saving temporary edit failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to save temporary edit" }))
        }
    }
}

#[derive(Deserialize)]
struct AllBusNumbersBody {
    collections: Vec<String>,
}

#[actix_web::post("/api/temp-edit/all-bus-numbers")]
pub async fn all_bus_numbers(
    state: web::Data<AppState>,
    body: web::Json<AllBusNumbersBody>,
) -> impl Responder {
    match edit::all_bus_numbers(state.store.as_ref(), &body.collections).await {
        Ok(codes) => HttpResponse::Ok().json(serde_json::json!({ "busNumbers": codes })),
        Err(e) => {
            log::error!("bus number listing failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch bus numbers" }))
        }
    }
}
