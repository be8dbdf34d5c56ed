#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = edumanage::run().await {
        eprintln!("edumanage fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
