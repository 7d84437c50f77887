//! Model gateway implementations for PatchChat.
//!
//! All gateways implement the `patchchat_core::ModelGateway` trait.
//! Only Gemini is wired in today; the trait keeps the door open.

pub mod gemini;

pub use gemini::GeminiGateway;

use patchchat_config::AppConfig;
use patchchat_core::error::GatewayError;
use patchchat_core::gateway::ModelGateway;
use std::sync::Arc;

/// Build the configured model gateway.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn ModelGateway>, GatewayError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        GatewayError::NotConfigured(
            "no API key — set PATCHCHAT_API_KEY or GEMINI_API_KEY, or add api_key to config.toml"
                .into(),
        )
    })?;

    Ok(Arc::new(
        GeminiGateway::new(api_key)
            .with_model(&config.model)
            .with_system_prompt(&config.system_prompt),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(GatewayError::NotConfigured(_))
        ));
    }

    #[test]
    fn build_with_key_succeeds() {
        let config = AppConfig {
            api_key: Some("k".into()),
            ..AppConfig::default()
        };
        let gateway = build_from_config(&config).unwrap();
        assert_eq!(gateway.name(), "gemini");
    }
}
