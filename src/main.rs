// src/main.rs

use color_eyre::eyre::Result;
use std::sync::Arc;
use tracing::{error, info};

use vanguard_recon_bot::bot::Bot;
use vanguard_recon_bot::bot::gate::MembershipGate;
use vanguard_recon_bot::bot::session::SessionStore;
use vanguard_recon_bot::bot::telegram::{TelegramApi, run_polling};
use vanguard_recon_bot::config::Settings;
use vanguard_recon_bot::core::scanner::{Scanner, build_client};
use vanguard_recon_bot::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Cannot start without configuration.");
            return Err(e.into());
        }
    };

    let api = Arc::new(TelegramApi::new(build_client()?, &settings.token));
    let recon = Arc::new(Scanner::from_settings(&settings)?);
    let gate = MembershipGate::new(api.clone(), settings.group_id, &settings.join_url);
    let sessions = SessionStore::new(settings.default_language.as_str());

    let bot = Arc::new(Bot::gated(api.clone(), sessions, gate, recon));

    info!(group = settings.group_id, "Bot started.");
    run_polling(api, bot).await;
    Ok(())
}
