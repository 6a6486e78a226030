mod config;
mod repos;
mod services;
mod system;

pub use config::{
    Config, DispatchConfig, EmailConfig, TelegramConfig, TriggerAuthConfig, TriggerAuthStrategy,
};
pub use repos::{IAccessGrantRepo, IDeliveryLedgerRepo, ISessionRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::warn;

/// Outbound delivery channels. A channel is `None` when the configuration
/// it needs is missing.
#[derive(Clone)]
pub struct Channels {
    pub broadcast: Option<Arc<dyn IBroadcastChannel>>,
    pub email: Option<Arc<dyn IEmailSender>>,
}

impl Channels {
    pub fn from_config(config: &Config) -> Self {
        let broadcast = match &config.telegram.bot_token {
            Some(token) => Some(Arc::new(TelegramBotApi::new(
                config.telegram.api_url.clone(),
                token.clone(),
            )) as Arc<dyn IBroadcastChannel>),
            None => {
                warn!("TELEGRAM_BOT_TOKEN is not set. Reminder dispatch will fail until it is.");
                None
            }
        };
        let email = match &config.email.endpoint_url {
            Some(url) => Some(Arc::new(HttpEmailSender::new(
                url.clone(),
                config.email.api_key.clone(),
            )) as Arc<dyn IEmailSender>),
            None => {
                warn!("EMAIL_ENDPOINT_URL is not set. Reminder dispatch will fail until it is.");
                None
            }
        };
        Self { broadcast, email }
    }

    pub fn none() -> Self {
        Self {
            broadcast: None,
            email: None,
        }
    }
}

#[derive(Clone)]
pub struct ReminderContext {
    pub repos: Repos,
    pub config: Config,
    pub channels: Channels,
    pub sys: Arc<dyn ISys>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl ReminderContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let channels = Channels::from_config(&config);
        Self {
            repos,
            config,
            channels,
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context with inmemory repositories, test configuration and no
    /// outbound channels
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::for_tests(),
            channels: Channels::none(),
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> ReminderContext {
    ReminderContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
