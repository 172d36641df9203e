use crate::audit::now_millis;
use crate::datastore::DocumentStore;
use actix_web::{get, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[get("/")]
pub async fn banner() -> impl Responder {
    HttpResponse::Ok().body("server")
}

#[get("/status")]
pub async fn status(store: web::Data<DocumentStore>) -> impl Responder {
    HttpResponse::Ok().json(StatusPayload {
        up: true,
        timestamp: now_millis(),
        documents: store.documents().await.len(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusPayload {
    pub up: bool,
    pub timestamp: u128,
    pub documents: usize,
}
