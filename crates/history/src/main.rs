use anyhow::Result;
use common::config::Config;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let (dispatch, _otel_guard) = common::observability::build_dispatch(
        config.general.service_name.clone(),
        &config.general.log_level,
    );
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    if let Some(port) = config.observability.prometheus_port {
        history::metrics::install_prometheus(port)?;
        history::metrics::describe();
        tracing::info!(port, "prometheus exporter listening");
    }

    match cli::run(&config, &args).await {
        Ok(page) => {
            println!("{page}");
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                error = %format!("{e:#}"),
                records = %args.records_path,
                "history assembly failed"
            );
            Err(e)
        }
    }
}
