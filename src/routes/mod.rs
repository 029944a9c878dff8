pub mod admin;
pub mod auth;
pub mod docs;
pub mod health;
pub mod users;

use actix_web::web;

/// Routes mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register),
    )
    .service(
        web::scope("/users")
            .service(users::me)
            .service(users::list_accounts)
            .service(users::get_account),
    )
    .service(
        // Fixed paths before `/accounts/{id}` so they are not parsed as an id.
        web::scope("/admin")
            .service(admin::list_accounts)
            .service(admin::create_account)
            .service(admin::inline_edit)
            .service(admin::list_actions)
            .service(admin::run_action)
            .service(admin::get_account)
            .service(admin::update_account)
            .service(admin::delete_account)
            .service(admin::debug_task),
    );
}
