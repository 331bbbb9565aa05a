use reward_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();

    let config = Config::from_env();
    // Development logs to stdout only; production also writes daily files
    let log_dir = config.log_dir().to_string_lossy().into_owned();
    let file_dir = config.is_production().then_some(log_dir.as_str());
    init_logger_with_file(std::env::var("LOG_LEVEL").ok().as_deref(), file_dir);

    print_banner();
    tracing::info!("Reward Server starting...");

    // 2. Initialize server state (database, schema)
    let state = ServerState::initialize(&config).await;

    // 3. Run the HTTP server until shutdown
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
