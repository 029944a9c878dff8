use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use extractable::auth::AuthMiddleware;
use extractable::config::Config;
use extractable::jobs::JobQueue;
use extractable::routes::{self, docs, health};
use extractable::store::{AccountStore, MemoryAccountStore, PgAccountStore};
use extractable::AppState;

fn to_io(error: extractable::AppError) -> std::io::Error {
    std::io::Error::other(error.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(to_io)?;

    let store: Arc<dyn AccountStore> = match &config.database_url {
        Some(url) => {
            let store = PgAccountStore::connect(url).await.map_err(to_io)?;
            log::info!("using postgres account store");
            Arc::new(store)
        }
        None => {
            log::warn!("DATABASE_URL not set, accounts are kept in memory only");
            Arc::new(MemoryAccountStore::new())
        }
    };

    let state = AppState::from_config(&config, store, JobQueue::start()).map_err(to_io)?;
    if let Some(seed) = &config.superuser {
        state.seed_superuser(seed).await.map_err(to_io)?;
    }
    let state = web::Data::new(state);

    log::info!("starting server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(docs::index)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
