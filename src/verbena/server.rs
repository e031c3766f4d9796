use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, middleware, web};
use campusway::config::Config;
use campusway::reaper;
use campusway::store::MemoryStore;
use chrono::TimeDelta;
use std::sync::Arc;

mod bus_api;
mod exam_api;
mod temp_edit_api;

/// Shared application state handed to every worker.
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub temp_change_ttl: TimeDelta,
}

async fn index(_req: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/plain"))
        .body("Campusway verbena API endpoint")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = Arc::new(match &config.seed_path {
        Some(path) => MemoryStore::from_seed_file(path)?,
        None => MemoryStore::new(),
    });

    // Out-of-band cleanup; query paths do not depend on it.
    tokio::spawn(reaper::run(Arc::clone(&store), config.reaper_interval));

    println!(
        "Starting verbena API server on {}:{}",
        config.bind_address, config.port
    );

    let ttl = config.temp_change_ttl;
    let app_store = Arc::clone(&store);
    HttpServer::new(move || {
        App::new()
            .wrap(DefaultHeaders::new().add(("Server", "Campusway")))
            .wrap(Cors::permissive())
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(AppState {
                store: Arc::clone(&app_store),
                temp_change_ttl: ttl,
            }))
            .route("/", web::get().to(index))
            .service(bus_api::get_stops)
            .service(bus_api::get_buses)
            .service(temp_edit_api::get_editable_data)
            .service(temp_edit_api::save_temp_edit)
            .service(temp_edit_api::all_bus_numbers)
            .service(exam_api::get_active_exams)
            .service(exam_api::get_all_exams)
    })
    .bind((config.bind_address.clone(), config.port))?
    .run()
    .await?;

    Ok(())
}
