#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docfield_server::start().await
}
