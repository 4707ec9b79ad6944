pub mod api;

use log::{ error, info, warn };
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::SathiAgent;
use crate::cli::Args;
use crate::error::BoxError;

use self::api::{ router, AppState };

pub struct Server {
    addr: String,
    agent: Arc<SathiAgent>,
    api_key: Option<String>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<SathiAgent>, api_key: Option<String>, args: Args) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        if api_key.is_some() {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Requests are open.");
        }

        Self { addr, agent, api_key, args }
    }

    pub async fn run(&self) -> Result<(), BoxError> {
        let addr: SocketAddr = self.addr
            .parse()
            .map_err(|e| format!("Invalid server address '{}': {}", self.addr, e))?;
        let state = AppState::new(
            Arc::clone(&self.agent),
            self.api_key.clone(),
            self.args.rate_limit_per_second
        );
        let app = router(state, Duration::from_secs(self.args.request_timeout_secs));

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert_path), Some(key_path)) => (cert_path, key_path),
                (Some(_), None) | (None, Some(_)) => {
                    error!(
                        "Both --tls-cert-path and --tls-key-path must be provided to enable TLS."
                    );
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };
            info!(
                "TLS enabled. Loading certificate from '{}' and key from '{}'",
                cert_path,
                key_path
            );
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await
                .map_err(|e| format!("Failed to load TLS certificate/key: {}", e))?;

            info!("HTTPS server listening on: {}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            info!("TLS not enabled. HTTP server listening on: {}", addr);
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
