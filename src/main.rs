use std::sync::Arc;

use ephemera::{
    api::{start_api_server, ApiState, DisabledVerifier, HumanVerifier, TurnstileVerifier},
    config::{AppConfig, StoreBackend},
    crypto::{EncryptionEngine, SystemKey},
    errors::Error,
    observability::{init_observability, log_config_info},
    services::SecretLifecycleManager,
    store::{MemorySecretStore, SecretStore, VaultSecretStore},
    Result, APP_NAME, VERSION,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env()?;
    init_observability(&config.observability).await?;

    info!(app_name = APP_NAME, version = VERSION, "Starting Ephemera secret service");
    log_config_info(&config);

    let system_key = SystemKey::from_base64(config.secret_key.expose_secret())
        .map_err(|e| Error::config(format!("Invalid EPHEMERA_SECRET_KEY: {}", e)))?;
    let engine = EncryptionEngine::new(system_key);

    let store = build_store(&config).await?;
    let manager = Arc::new(SecretLifecycleManager::new(store, engine));

    let verifier: Arc<dyn HumanVerifier> = if config.verification.is_enabled() {
        info!("Human verification enabled");
        Arc::new(TurnstileVerifier::new(&config.verification)?)
    } else {
        warn!("Human verification disabled: EPHEMERA_TURNSTILE_SECRET is not set");
        Arc::new(DisabledVerifier)
    };

    let state = ApiState::new(manager, verifier);
    if let Err(e) = start_api_server(config.server.clone(), state).await {
        error!(error = %e, "API server terminated with error");
        return Err(e);
    }

    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn SecretStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory secret store; secrets are lost on restart");
            Ok(Arc::new(MemorySecretStore::new()))
        }
        StoreBackend::Vault => {
            let vault_config = config
                .store
                .vault
                .clone()
                .ok_or_else(|| Error::config("Vault backend selected but not configured"))?;
            let store = VaultSecretStore::new(vault_config)
                .await
                .map_err(|e| Error::store(e, "Failed to initialize Vault store"))?;
            Ok(Arc::new(store))
        }
    }
}
