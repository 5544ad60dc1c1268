use log::info;
use server::{setup::setup, start_server};
use std::net::SocketAddr;
use threadlab_database::{config::ThreadlabConfig, error::BackendResult, impls::ThreadlabContext};
use tokio::sync::oneshot;

pub mod api;
pub mod flags;
mod interactions;
mod server;

pub async fn start(
    config: ThreadlabConfig,
    override_hostname: Option<SocketAddr>,
    notify_start: Option<oneshot::Sender<()>>,
) -> BackendResult<()> {
    let context = ThreadlabContext::init(config)?;

    if context.conf.setup.seed_example_article && context.store.list_articles(None)?.is_empty() {
        info!("Creating example article for empty store");
        setup(&context)?;
    }

    start_server(context, override_hostname, notify_start).await?;

    Ok(())
}
