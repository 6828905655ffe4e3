use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otp_registration::configuration::{get_configuration, Settings};
use otp_registration::startup::{
    build_registration_cache, Application, RegistrationCache,
};
use otp_registration::telemetry::{
    get_line_subscriber, get_subscriber, init_subscriber,
};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // The sink is part of the type returned by `get_subscriber`,
    // so each branch initialises its own subscriber.
    match std::env::var("TEST_LOG") {
        Ok(v) => {
            if v == "json" {
                println!("Using JSON output");
                init_subscriber(get_subscriber(
                    subscriber_name,
                    default_filter_level,
                    std::io::stdout,
                ));
            } else {
                println!("Using text output");
                init_subscriber(get_line_subscriber(
                    default_filter_level,
                    std::io::stdout,
                ));
            }
        }
        _ => {
            let subscriber = get_subscriber(
                subscriber_name,
                default_filter_level,
                std::io::sink,
            );
            init_subscriber(subscriber);
        }
    };
});

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub cache: Arc<RegistrationCache>,
    pub passcode_length: usize,
}

impl TestApp {
    pub async fn post_registrations(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/registrations", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_confirmation(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/registrations/confirm", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn confirm(&self, email: &str, passcode: &str) -> reqwest::Response {
        let body =
            serde_urlencoded::to_string(&[("email", email), ("passcode", passcode)])
                .unwrap();
        self.post_confirmation(body).await
    }

    /// Accept the next outgoing email, whatever it is.
    pub async fn accept_emails(&self) {
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.email_server)
            .await;
    }

    /// Pull the passcode out of an email intercepted by the mock server.
    pub fn get_passcode(&self, email_request: &wiremock::Request) -> String {
        let body: Value = serde_json::from_slice(&email_request.body).unwrap();

        let get_code = |s: &str| {
            let codes: Vec<_> = s
                .split(|c: char| !c.is_ascii_digit())
                .filter(|token| token.len() == self.passcode_length)
                .collect();
            assert_eq!(codes.len(), 1);
            codes[0].to_owned()
        };

        let html = get_code(body["HtmlBody"].as_str().unwrap());
        let plain_text = get_code(body["TextBody"].as_str().unwrap());
        assert_eq!(html, plain_text);
        plain_text
    }

    /// The passcode carried by the most recent email sent.
    pub async fn last_passcode(&self) -> String {
        let email_request = self
            .email_server
            .received_requests()
            .await
            .unwrap()
            .pop()
            .unwrap();
        self.get_passcode(&email_request)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with<F>(customise: F) -> TestApp
where
    F: FnOnce(&mut Settings),
{
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    // Stand-in for Postmark's API
    let email_server = MockServer::start().await;

    // Randomise configuration to ensure test isolation
    let configuration = {
        let mut c = get_configuration().expect("failed to read configuration.");
        // Use random port
        c.application.port = 0;
        // Use mock server as email API
        c.email_client.base_url = email_server.uri();
        // Tests drive eviction themselves
        c.otp.sweep_interval_seconds = 0;
        customise(&mut c);
        c
    };

    let cache = Arc::new(build_registration_cache(&configuration.otp));
    let passcode_length = configuration.otp.passcode_length;

    // Launch the application as the background task
    let application = Application::build(configuration, Arc::clone(&cache))
        .await
        .expect("failed to build application");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        email_server,
        cache,
        passcode_length,
    }
}
