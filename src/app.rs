//! Component wiring

use crate::assistant::Assistant;
use crate::config::AssistantConfig;
use crate::lookup::{InMemoryLookup, LookupStore, PgLookup};
use crate::mail::{HttpMailRelay, LogMailer, Mailer};
use crate::memory::SessionStore;
use crate::model::{ChatModel, GeminiClient};
use crate::otp::OtpSimulator;
use crate::tools::create_default_registry;
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Build the lookup backend: Postgres when a database URL is set, otherwise
/// the JSON dataset.
pub fn build_lookup(config: &AssistantConfig) -> Result<Arc<dyn LookupStore>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(PgLookup::connect_lazy(url)?)),
        None => {
            info!(path = %config.dataset_path.display(), "Lookup backend: dataset file");
            Ok(Arc::new(InMemoryLookup::from_json_file(&config.dataset_path)?))
        }
    }
}

/// HTTP relay when configured, otherwise the logging simulator.
pub fn build_mailer(config: &AssistantConfig) -> Result<Arc<dyn Mailer>> {
    match &config.mail_relay_url {
        Some(url) => {
            info!(relay = %url, "Mail backend: HTTP relay");
            Ok(Arc::new(HttpMailRelay::new(
                url.clone(),
                config.mail_sender.clone(),
                config.mail_relay_token.clone(),
                config.call_policy(),
            )?))
        }
        None => {
            info!("Mail backend: simulator (log only)");
            Ok(Arc::new(LogMailer::new()))
        }
    }
}

/// Wire an assistant around the given model and backends.
pub fn assemble(
    config: &AssistantConfig,
    model: Arc<dyn ChatModel>,
    lookup: Arc<dyn LookupStore>,
    mailer: Arc<dyn Mailer>,
) -> Result<Assistant> {
    let otp = Arc::new(OtpSimulator::new(lookup.clone(), mailer.clone()).with_ttl_secs(config.otp_ttl_secs));
    let registry = create_default_registry(lookup, otp, mailer)?;
    let sessions = SessionStore::new(config.transcript_max_turns);

    info!(tools = ?registry.list(), "Tool registry ready");

    Ok(Assistant::new(model, Arc::new(registry), Arc::new(sessions), config.load_system_prompt()?)
        .with_reply_limit(config.reply_char_limit))
}

/// Full production wiring from configuration.
pub fn build_assistant(config: &AssistantConfig) -> Result<Assistant> {
    let model = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.model.clone(),
        config.gemini_base_url.clone(),
        config.call_policy(),
    )?);

    info!(model = %config.model, "Model client ready");

    assemble(config, model, build_lookup(config)?, build_mailer(config)?)
}
