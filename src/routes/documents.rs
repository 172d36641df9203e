use crate::datastore::{CreateOutcome, DeleteOutcome, DocumentStore};
use crate::StoreError;
use actix_web::{
    delete, get, patch, post,
    web::{Data, Query},
    HttpResponse,
};
use serde::Deserialize;
use serde_json::{json, Value};

type RouteResult = Result<HttpResponse, StoreError>;

#[derive(Debug, Deserialize)]
pub struct FileParams {
    file: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyParams {
    file: String,
    key: String,
}

#[derive(Debug, Deserialize)]
pub struct SetParams {
    file: String,
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
pub struct PairParams {
    #[serde(rename = "fileA")]
    file_a: String,
    #[serde(rename = "fileB")]
    file_b: String,
}

#[get("/get")]
pub async fn get_key(store: Data<DocumentStore>, params: Query<KeyParams>) -> RouteResult {
    let value = store.get(&params.file, &params.key).await?;
    Ok(HttpResponse::Ok().json(json!({
        "file": params.file,
        "key": params.key,
        "value": value,
    })))
}

#[patch("/set")]
pub async fn set_key(store: Data<DocumentStore>, params: Query<SetParams>) -> RouteResult {
    let SetParams { file, key, value } = params.into_inner();
    store
        .set(&file, &key, Value::String(value.clone()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "file": file, "key": key, "value": value })))
}

#[patch("/remove")]
pub async fn remove_key(store: Data<DocumentStore>, params: Query<KeyParams>) -> RouteResult {
    let removed = store.remove(&params.file, &params.key).await?;
    Ok(HttpResponse::Ok().json(json!({
        "file": params.file,
        "key": params.key,
        "removed": removed,
    })))
}

#[delete("/deleteFile")]
pub async fn delete_file(store: Data<DocumentStore>, params: Query<FileParams>) -> RouteResult {
    let outcome = store.delete_file(&params.file).await?;
    Ok(HttpResponse::Ok().json(json!({
        "file": params.file,
        "deleted": outcome == DeleteOutcome::Deleted,
    })))
}

#[post("/createFile")]
pub async fn create_file(store: Data<DocumentStore>, params: Query<FileParams>) -> RouteResult {
    let outcome = store.create_file(&params.file).await?;
    let body = json!({
        "file": params.file,
        "created": outcome == CreateOutcome::Created,
    });
    Ok(match outcome {
        CreateOutcome::Created => HttpResponse::Created().json(body),
        CreateOutcome::Denied => HttpResponse::Ok().json(body),
    })
}

#[get("/mergeData")]
pub async fn merge_data(store: Data<DocumentStore>) -> RouteResult {
    let merged = store.merge_data().await?;
    Ok(HttpResponse::Ok().json(merged))
}

#[get("/union")]
pub async fn union(store: Data<DocumentStore>, params: Query<PairParams>) -> RouteResult {
    let keys = store.union(&params.file_a, &params.file_b).await?;
    Ok(HttpResponse::Ok().json(json!({ "keys": keys })))
}

#[get("/intersect")]
pub async fn intersect(store: Data<DocumentStore>, params: Query<PairParams>) -> RouteResult {
    let keys = store.intersect(&params.file_a, &params.file_b).await?;
    Ok(HttpResponse::Ok().json(json!({ "keys": keys })))
}

#[get("/difference")]
pub async fn difference(store: Data<DocumentStore>, params: Query<PairParams>) -> RouteResult {
    let keys = store.difference(&params.file_a, &params.file_b).await?;
    Ok(HttpResponse::Ok().json(json!({ "keys": keys })))
}
