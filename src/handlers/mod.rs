pub mod generation_handler;
pub mod history_handler;

use actix_web::web;

pub use generation_handler::{
    ask, cancel_generation, generation_status, health_check, reset_generation, start_generation,
};
pub use history_handler::{
    archive_test, delete_test, get_test, list_tests, save_progress, save_test, submit_test,
    unarchive_test,
};

/// Registers every route the server exposes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(start_generation)
        .service(generation_status)
        .service(cancel_generation)
        .service(reset_generation)
        .service(ask)
        .service(list_tests)
        .service(save_test)
        .service(get_test)
        .service(save_progress)
        .service(submit_test)
        .service(archive_test)
        .service(unarchive_test)
        .service(delete_test);
}
