use crate::AppState;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use campusway::lookup::{self, ExamQuery};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize)]
struct BusQuery {
    collection: Option<String>,
    #[serde(rename = "examTitle")]
    exam_title: Option<String>,
    direction: Option<String>,
}

#[actix_web::get("/api/bus/stops")]
pub async fn get_stops(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let params = web::Query::<BusQuery>::from_query(req.query_string());
    if let Err(params) = &params {
        eprintln!("{}", params);
        return HttpResponse::BadRequest().body("Invalid query parameters");
    }
    let params = params.unwrap();

    let Some(collection) = params.collection.as_deref() else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Collection parameter is required" }));
    };

    let exam = ExamQuery {
        exam_title: params.exam_title.as_deref(),
        direction: params.direction.as_deref(),
    };
    match lookup::get_stops(state.store.as_ref(), collection, exam).await {
        Ok(stops) => HttpResponse::Ok().json(serde_json::json!({ "stops": stops })),
        Err(e) => {
            log::error!("stops fetch failed for collection {}: {}", collection, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch stops" }))
        }
    }
}

#[actix_web::get("/api/bus/buses/{stop_name}")]
pub async fn get_buses(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> impl Responder {
    let stop_name = path.into_inner();

    let params = web::Query::<BusQuery>::from_query(req.query_string());
    if let Err(params) = &params {
        eprintln!("{}", params);
        return HttpResponse::BadRequest().body("Invalid query parameters");
    }
    let params = params.unwrap();

    let Some(collection) = params.collection.as_deref() else {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Collection parameter is required" }));
    };

    let exam = ExamQuery {
        exam_title: params.exam_title.as_deref(),
        direction: params.direction.as_deref(),
    };
    match lookup::get_buses(state.store.as_ref(), collection, &stop_name, exam, Utc::now()).await {
        Ok(buses) => HttpResponse::Ok().json(serde_json::json!({ "buses": buses })),
        Err(e) => {
            log::error!(
                "bus fetch failed for stop {:?} in collection {}: {}",
                stop_name,
                collection,
                e
            );
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch buses" }))
        }
    }
}
