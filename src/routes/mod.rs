mod documents;
mod probe;

use actix_web::web::ServiceConfig;

pub use probe::StatusPayload;

/// Registers every route on an actix `App`. The caller provides the
/// `web::Data<DocumentStore>`.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(probe::banner)
        .service(probe::status)
        .service(documents::get_key)
        .service(documents::set_key)
        .service(documents::remove_key)
        .service(documents::delete_file)
        .service(documents::create_file)
        .service(documents::merge_data)
        .service(documents::union)
        .service(documents::intersect)
        .service(documents::difference);
}
