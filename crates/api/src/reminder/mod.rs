mod broadcast;
mod direct;
mod messages;
pub mod send_reminders;
mod tally;

use actix_web::{http::Method, web};
use send_reminders::{
    method_not_allowed_controller, preflight_controller, send_reminders_controller,
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reminders/send")
            .route(web::post().to(send_reminders_controller))
            .route(web::method(Method::OPTIONS).to(preflight_controller))
            .default_service(web::route().to(method_not_allowed_controller)),
    );
}
