use std::path::PathBuf;

use clap::Parser;
use recipe_box_lib::config::Config;

#[derive(Parser)]
#[command(name = "recipe-box")]
#[command(about = "Recipe server with single-writer save tokens")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "RECIPE_BOX_CONFIG", default_value = "recipe-box.toml")]
    config: PathBuf,

    /// SQLite database file (overrides config file)
    #[arg(long, env = "RECIPE_BOX_DB")]
    db_path: Option<PathBuf>,

    /// Listen address (overrides config file)
    #[arg(long, env = "RECIPE_BOX_BIND")]
    bind: Option<String>,

    /// Log directory (overrides config file)
    #[arg(long, env = "RECIPE_BOX_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(db_path) = cli.db_path {
        config.server.db_path = db_path;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(log_dir) = cli.log_dir {
        config.server.log_dir = log_dir;
    }

    recipe_box_lib::run(config).await?;
    Ok(())
}
