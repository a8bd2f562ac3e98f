use clap::Parser;
use doorlink_server::{Settings, app, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::parse();
    logging::init_tracing(settings.log_json)?;

    app::run(settings).await
}
