use tracing::info;

use wellbase::infrastructure::config::AppConfig;
use wellbase::infrastructure::db::connection::init_db;
use wellbase::infrastructure::db::repository::WellRepository;
use wellbase::interfaces::http::start_server;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let config = AppConfig::load()?;
    let pool = init_db(&config.database_path).await?;
    let repo = WellRepository::new(pool);

    info!(
        address = %config.bind_address,
        port = config.port,
        database = %config.database_path.display(),
        "starting wellbase"
    );

    start_server(&config, repo)?.await?;
    Ok(())
}
