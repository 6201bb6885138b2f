use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use prodex_search::{CategoryEntry, ProductRecord, SearchService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Serialize)]
struct SearchResponse {
    ranked_ids: Vec<String>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(service: Arc<SearchService>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(service.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register the routes. Expects `web::Data<Arc<SearchService>>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(welcome)).service(
        web::scope("/api")
            .route("/search", web::post().to(search))
            .route("/products", web::post().to(add_products))
            .route("/categories", web::post().to(add_categories)),
    );
}

async fn welcome() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the prodex search API"
    })))
}

async fn search(
    service: web::Data<Arc<SearchService>>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    info!(query = %req.query, "received search query");

    match service.search(&req.query).await {
        Ok(ranked_ids) => {
            info!(results = ranked_ids.len(), "returning ranked results");
            Ok(HttpResponse::Ok().json(SearchResponse { ranked_ids }))
        }
        Err(e) => {
            error!(error = %e, "search failed");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "detail": "Search failed."
            })))
        }
    }
}

async fn add_products(
    service: web::Data<Arc<SearchService>>,
    req: web::Json<Vec<ProductRecord>>,
) -> ActixResult<HttpResponse> {
    let products = req.into_inner();
    info!(count = products.len(), "received products to index");

    match service.insert_products(products).await {
        Ok(count) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": format!("{count} products added/updated successfully."),
            "count": count
        }))),
        Err(e) => {
            error!(error = %e, "error adding products");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "detail": "Failed to add products to the index."
            })))
        }
    }
}

async fn add_categories(
    service: web::Data<Arc<SearchService>>,
    req: web::Json<Vec<CategoryEntry>>,
) -> ActixResult<HttpResponse> {
    let entries = req.into_inner();
    info!(count = entries.len(), "received category phrases to index");

    match service.insert_categories(entries).await {
        Ok(count) => Ok(HttpResponse::Created().json(serde_json::json!({
            "message": format!("{count} categories added/updated successfully."),
            "count": count
        }))),
        Err(e) => {
            error!(error = %e, "error adding categories");
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "detail": "Failed to add categories to the index."
            })))
        }
    }
}
