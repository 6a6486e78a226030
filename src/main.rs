mod telemetry;

use class_reminders_api::Application;
use class_reminders_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    openssl_probe::init_ssl_cert_env_vars();

    let subscriber = get_subscriber("class_reminders_server".into(), "info".into());
    init_subscriber(subscriber);

    run_migration()
        .await
        .expect("Database migrations to run successfully");

    let context = setup_context().await;

    let app = Application::new(context).await?;
    app.start().await
}
