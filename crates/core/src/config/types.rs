use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::admission::AdmissionConfig;
use crate::encoder::EncoderConfig;
use crate::gallery::GalleryConfig;
use crate::lifecycle::SessionConfig;
use crate::publish::{RegistryConfig, TelegramConfig};
use crate::resolver::ResolverConfig;
use crate::runner::RunnerConfig;
use crate::upscale::{UpscalerBackend, UpscalerConfig};
use crate::workspace::WorkspaceConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub upscaler: UpscalerConfig,
    pub gallery: GalleryConfig,
    pub registry: RegistryConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub admission: AdmissionConfig,
    pub workspace: WorkspaceConfig,
    pub runner: RunnerConfig,
    pub encoder: EncoderConfig,
    pub resolver: ResolverConfig,
    pub upscaler: SanitizedUpscalerConfig,
    pub gallery: GalleryConfig,
    pub registry: RegistryConfig,
    pub telegram: SanitizedTelegramConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpscalerConfig {
    pub backend: String,
    pub factor: u32,
}

/// Sanitized Telegram config (bot token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_base: String,
    pub bot_token_configured: bool,
    pub owner_user_id: i64,
    pub sticker_tag: String,
    pub emoji: String,
    pub announce_chat_id: Option<i64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            admission: config.admission.clone(),
            workspace: config.workspace.clone(),
            runner: config.runner.clone(),
            encoder: config.encoder.clone(),
            resolver: config.resolver.clone(),
            upscaler: SanitizedUpscalerConfig {
                backend: match config.upscaler.backend {
                    UpscalerBackend::Resample => "resample".to_string(),
                    UpscalerBackend::Command => "command".to_string(),
                },
                factor: config.upscaler.factor,
            },
            gallery: config.gallery.clone(),
            registry: config.registry.clone(),
            telegram: SanitizedTelegramConfig {
                api_base: config.telegram.api_base.clone(),
                bot_token_configured: !config.telegram.bot_token.is_empty(),
                owner_user_id: config.telegram.owner_user_id,
                sticker_tag: config.telegram.sticker_tag.clone(),
                emoji: config.telegram.emoji.clone(),
                announce_chat_id: config.telegram.announce_chat_id,
            },
            session: config.session.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[gallery]
metadata_url = "https://gallery.example/index/package_detail"
frame_url = "https://gallery.example/viewer"

[registry]
base_url = "http://localhost:9000"

[telegram]
bot_token = "123:abc"
owner_user_id = 7
sticker_tag = "forge_bot"
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.admission.max_concurrent_jobs, 3);
        assert_eq!(config.admission.max_requests_per_day, 10);
        assert_eq!(config.encoder.target_size_kb, 256);
        assert_eq!(config.encoder.tolerance_kb, 25);
        assert_eq!(config.encoder.max_attempts, 5);
        assert_eq!(config.encoder.max_duration_ms, 2999);
        assert_eq!(config.runner.fetch_attempts, 3);
        assert_eq!(config.runner.image_timeout_secs, 1800);
        assert_eq!(config.session.confirmation_timeout_secs, 15);
        assert_eq!(config.resolver.sample_limit, 5);
        assert_eq!(config.telegram.emoji, "🌸");
    }

    #[test]
    fn test_deserialize_overrides() {
        let toml = format!(
            "{}\n[server]\nhost = \"127.0.0.1\"\nport = 9000\n\n[admission]\nmax_concurrent_jobs = 1\n\n[upscaler]\nbackend = \"command\"\ncommand = \"/usr/bin/waifu2x\"\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.admission.max_concurrent_jobs, 1);
        assert_eq!(config.upscaler.backend, UpscalerBackend::Command);
    }

    #[test]
    fn test_deserialize_missing_telegram_fails() {
        let toml = r#"
[gallery]
metadata_url = "https://gallery.example/a"
frame_url = "https://gallery.example/b"

[registry]
base_url = "http://localhost:9000"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.telegram.bot_token_configured);
        assert_eq!(sanitized.upscaler.backend, "resample");

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("123:abc"));
    }
}
