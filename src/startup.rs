use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::OtpSettings;
use crate::configuration::Settings;
use crate::domain::NewRegistrant;
use crate::email_client::EmailClient;
use crate::otp_cache::OtpCache;
use crate::routes::confirm_registration;
use crate::routes::health_check;
use crate::routes::register;

/// Registrations waiting on their emailed passcode.
pub type RegistrationCache = OtpCache<NewRegistrant>;

pub fn build_registration_cache(settings: &OtpSettings) -> RegistrationCache {
    let cache = OtpCache::new(settings.ttl());
    match settings.max_pending {
        Some(max_pending) => cache.with_capacity_limit(max_pending),
        None => cache,
    }
}

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    // The cache is created by the caller so it can be shared with
    // the background sweeper.
    pub async fn build(
        configuration: Settings,
        cache: Arc<RegistrationCache>,
    ) -> Result<Self, anyhow::Error> {
        anyhow::ensure!(
            configuration.otp.passcode_length > 0,
            "otp.passcode_length must be at least 1"
        );
        anyhow::ensure!(
            configuration.otp.max_pending != Some(0),
            "otp.max_pending must be at least 1 when set"
        );

        let sender_email = configuration
            .email_client
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address")?;

        let timeout = configuration.email_client.timeout();

        let email_client = EmailClient::new(
            configuration.email_client.base_url,
            sender_email,
            configuration.email_client.authorization_token,
            timeout,
        )
        .context("Failed to build the email client")?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        tracing::info!("app started at: {}", &address);
        let server = run(listener, cache, email_client, configuration.otp)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // A more expressive name that makes it clear that
    // this function only returns when the application is stopped
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    cache: Arc<RegistrationCache>,
    email_client: EmailClient,
    otp_settings: OtpSettings,
) -> Result<Server, std::io::Error> {
    let cache = Data::from(cache);
    let email_client = Data::new(email_client);
    let otp_settings = Data::new(otp_settings);
    let server = HttpServer::new(move || {
        App::new()
            // Middlewares are added using the `wrap` method on `App`
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/registrations", web::post().to(register))
            .route(
                "/registrations/confirm",
                web::post().to(confirm_registration),
            )
            .app_data(cache.clone())
            .app_data(email_client.clone())
            .app_data(otp_settings.clone())
    })
    .listen(listener)?
    .run();
    // No .await here
    Ok(server)
}
