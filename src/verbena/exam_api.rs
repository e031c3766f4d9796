use crate::AppState;
use actix_web::{HttpResponse, Responder, web};
use campusway::exam;
use chrono::Utc;

#[actix_web::get("/api/exam/active")]
pub async fn get_active_exams(state: web::Data<AppState>) -> impl Responder {
    match exam::get_active_exams(state.store.as_ref(), Utc::now()).await {
        Ok(exams) => HttpResponse::Ok().json(exams),
        Err(e) => {
            log::error!("active exam fetch failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

#[actix_web::get("/api/exam/all")]
pub async fn get_all_exams(state: web::Data<AppState>) -> impl Responder {
    match exam::get_all_exams(state.store.as_ref(), Utc::now()).await {
        Ok(exams) => HttpResponse::Ok().json(exams),
        Err(e) => {
            log::error!("exam listing failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Failed to fetch exam schedules" }))
        }
    }
}
