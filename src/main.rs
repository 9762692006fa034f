mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "housing_alerts=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli::run() {
        cli::RunOutcome::Serve(config) => {
            if let Err(err) = housing_alerts::serve(config).await {
                tracing::error!(error = %err, "server stopped");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
