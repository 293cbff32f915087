use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    lego_cli::run().await
}
