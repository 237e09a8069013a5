use tileworld::ClientConfig;
use tileworld::app::Client;

const DEFAULT_CONFIG: &str = "tileworld.json";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = ClientConfig::load_or_default(&path);
    log::info!("[client] Starting with config '{path}'");

    Client::new(config).run();
}
