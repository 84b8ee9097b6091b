use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use web_search_chatbot::{console::run_console, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the streamed answer
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Startup failed: {}", e);
            eprintln!("⚠️  {}", e);
            eprintln!("📌 Set SERPER_API_KEY and OPENAI_API_KEY in your environment or .env file");
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };

    info!(model = %settings.model, "Web search chatbot starting");

    run_console(&settings).await?;

    Ok(())
}
