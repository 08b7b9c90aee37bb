use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use dualpush::{
    models::{ProviderKind, RemoteMessage},
    services::{
        availability_service::StaticAvailabilityProbe,
        notification_service::InMemoryNotificationSurface,
        token_service::StaticTokenSource,
    },
    state::{AppConfig, AppState, Platform},
};

fn probe_from_env(key: &str, provider: ProviderKind) -> StaticAvailabilityProbe {
    match std::env::var(key).as_deref() {
        Ok("1") | Ok("true") => StaticAvailabilityProbe::available(provider),
        _ => StaticAvailabilityProbe::missing(provider),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let surface = Arc::new(InMemoryNotificationSurface::new(34));

    let platform = Platform {
        gms_probe: Arc::new(probe_from_env("PUSH_GMS_AVAILABLE", ProviderKind::Gms)),
        hms_probe: Arc::new(probe_from_env("PUSH_HMS_AVAILABLE", ProviderKind::Hms)),
        hms_token_source: Arc::new(StaticTokenSource::new(ProviderKind::Hms, "demo-hms-token")),
        gms_token_source: None,
        surface: surface.clone(),
    };

    let app_state = AppState::new(config, platform)?;
    let mut session = app_state.start_session()?;

    let selection = app_state.push_manager.get_push_token(&mut session);
    tracing::info!("Provider selection: {:?}", selection);

    if let Ok(raw) = std::env::var("PUSH_DEMO_MESSAGE") {
        let message = RemoteMessage::from_json(&raw)?;
        let handler = app_state.message_handler(selection.provider(), &session);
        handler.on_message_received(&message);
    }

    let outcomes = session.wait().await;
    tracing::info!("Token fetches finished: {:?}", outcomes);

    for notification in surface.active() {
        println!("[{}] {} | {}", notification.id, notification.title, notification.body);
    }

    session.shutdown().await;
    Ok(())
}
