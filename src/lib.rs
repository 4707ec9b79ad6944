pub mod agent;
pub mod assistant;
pub mod cache;
pub mod cli;
pub mod config;
pub mod detect;
pub mod directory;
pub mod error;
pub mod geo;
pub mod history;
pub mod llm;
pub mod models;
pub mod resolver;
pub mod retry;
pub mod server;
pub mod speech;

use agent::SathiAgent;
use cli::Args;
use error::BoxError;
use log::info;
use server::Server;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), BoxError> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Store Type: {}", args.store_type);
    if args.store_type.eq_ignore_ascii_case("redis") {
        info!("Redis URL: {}", args.redis_url);
        info!("Redis Key Prefix: {}", args.redis_prefix);
    } else {
        info!("Directory Seed Path: {}", args.directory_seed_path);
    }
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Max Tokens: {}", args.chat_max_tokens);
    info!("History Turns: {}", args.history_turns);
    info!("Response Cache TTL: {}s", args.response_cache_ttl);
    info!("Default Language: {}", args.default_language);
    info!("Default Pincode: {}", args.default_pincode);
    info!("Nearby Max Results: {}", args.nearby_max_results);
    info!("Geocoder URL: {}", args.geocoder_url);
    info!("Proximity URL: {} (radius {}m)", args.proximity_url, args.proximity_radius_meters);
    info!("Rate Limit: {}/s", args.rate_limit_per_second);
    info!("-------------------------");

    detect::warm_up();
    let agent = Arc::new(SathiAgent::from_args(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args.server_api_key.clone(), args);
    server.run().await?;

    Ok(())
}
