use clap::Parser;
use greater::cli::{self, args::Cli};
use greater::http_server::HttpServer;
use greater::utils::tracing::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse() {
        Cli::Serve(args) => {
            let config = cli::load_serve_config(&args)?;
            init_tracing(&config.logging.level, config.logging.json);

            info!(
                "Starting greater on {}:{}",
                config.server.host, config.server.port
            );
            if let Some(path) = &args.config {
                info!("Config file: {}", path);
            }
            info!("Serving static assets from {}", config.assets.dir);

            HttpServer::new(config).run().await?;
        }
        Cli::Validate(args) => {
            let (valid, report) = cli::validate(&args);
            println!("{}", report);
            if !valid {
                std::process::exit(1);
            }
        }
        Cli::Schema(args) => {
            if let Some(schema) = cli::schema(&args)? {
                println!("{}", schema);
            }
        }
    }

    Ok(())
}
