use playerdb::Config;
use playerdb::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::from_env();
    server::run(config).await
}
