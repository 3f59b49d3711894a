use studio_worker::{WorkerSettings, setup_tracing};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let settings = WorkerSettings::load(config_path.as_deref())?;
    setup_tracing(&settings);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    studio_worker::run(&settings, tokio::io::stdin(), tokio::io::stdout(), shutdown).await?;
    Ok(())
}
