use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

mod config;
mod handlers;
mod models;
mod routes;
mod services;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let cfg = Arc::new(config::AppConfig::from_env());
    info!("Using PORT: {}", cfg.port);

    // Make sure the upload tree exists before the first multipart request
    for subdir in ["images", "pdfs"] {
        let dir = cfg.upload_dir.join(subdir);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            log::error!("Failed to create upload directory {:?}: {}", dir, e);
        }
    }

    let db = Arc::new(services::db::DocumentStore::new());
    let mailer = Arc::new(services::mailer::Mailer::new(&cfg));
    let otp = Arc::new(services::otp::OtpClient::new(&cfg));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    let api = routes::routes(db, cfg, mailer, otp).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}
