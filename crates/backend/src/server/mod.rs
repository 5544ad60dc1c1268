use crate::api::api_routes;
use axum::{Router, middleware::from_fn_with_state};
use log::{info, warn};
use middleware::browser_id_middleware;
use std::net::SocketAddr;
use threadlab_database::{error::BackendResult, impls::ThreadlabContext};
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

pub(crate) mod middleware;
pub(super) mod setup;

pub(super) async fn start_server(
    context: ThreadlabContext,
    override_hostname: Option<SocketAddr>,
    notify_start: Option<oneshot::Sender<()>>,
) -> BackendResult<()> {
    let addr = override_hostname.unwrap_or(context.conf.options.bind);

    let app = Router::new()
        .nest("/api/v1", api_routes())
        .layer(from_fn_with_state(context.clone(), browser_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(context);

    info!("Listening on {}", &addr);
    let listener = TcpListener::bind(&addr).await?;
    if let Some(notify_start) = notify_start {
        if notify_start.send(()).is_err() {
            warn!("Nobody waiting for server start");
        }
    }
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
