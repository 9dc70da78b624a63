use anyhow::Result;
use clap::Parser;
use ragline_cli::Cli;
use ragline_telemetry::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let telemetry = if cli.global.log_json {
        ragline_telemetry::init_with_filter(&cli.global.log_level, LogFormat::Json)
    } else {
        ragline_telemetry::init_telemetry(&cli.global.log_level)
    };
    if let Err(e) = telemetry {
        eprintln!("Warning: logging disabled: {e}");
    }

    ragline_cli::run(cli).await
}
