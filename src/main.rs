use clap::Parser;
use dotenv::dotenv;
use gramsathi::cli::Args;
use gramsathi::error::BoxError;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    gramsathi::run(args).await
}
