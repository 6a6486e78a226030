use class_reminders_api::Application;
use class_reminders_infra::{
    Channels, InMemoryBroadcastChannel, InMemoryEmailSender, ReminderContext, StaticTimeSys,
};
use class_reminders_sdk::ReminderSDK;
use std::sync::Arc;

/// 2021-02-20T23:00:00Z
pub const NOW: i64 = 1_613_862_000_000;

pub struct TestApp {
    pub ctx: ReminderContext,
    pub address: String,
    pub broadcast: Arc<InMemoryBroadcastChannel>,
    pub email: Arc<InMemoryEmailSender>,
}

impl TestApp {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.address, path)
    }
}

// Launch the application as a background task
pub async fn spawn_app<F: FnOnce(&mut ReminderContext)>(configure: F) -> (TestApp, ReminderSDK) {
    let broadcast = Arc::new(InMemoryBroadcastChannel::new());
    let email = Arc::new(InMemoryEmailSender::new());

    let mut ctx = ReminderContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.sys = Arc::new(StaticTimeSys(NOW));
    ctx.config.telegram.chat_ids = vec!["-1001".into(), "-1002".into()];
    ctx.config.telegram.default_chat_id = Some("-1001".into());
    ctx.channels = Channels {
        broadcast: Some(broadcast.clone()),
        email: Some(email.clone()),
    };
    configure(&mut ctx);

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let sdk = ReminderSDK::new(address.clone());
    let app = TestApp {
        ctx,
        address,
        broadcast,
        email,
    };
    (app, sdk)
}
