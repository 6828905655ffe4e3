use std::fmt::{Debug, Display};
use std::sync::Arc;

use tokio::task::JoinError;
// this binary will target "package name"
use otp_registration::configuration::get_configuration;
use otp_registration::startup::{build_registration_cache, Application};
use otp_registration::sweeper::run_sweeper_until_stopped;
use otp_registration::telemetry::{
    get_subscriber, init_subscriber, DEFAULT_ENV_FILTER,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "otp_registration".into(),
        DEFAULT_ENV_FILTER.into(),
        std::io::stdout,
    );
    init_subscriber(subscriber);

    let configuration =
        get_configuration().expect("failed to read configuration ");

    let cache = Arc::new(build_registration_cache(&configuration.otp));
    let sweep_interval = configuration.otp.sweep_interval();

    let application =
        Application::build(configuration, Arc::clone(&cache)).await?;
    let application = application.run_until_stopped();
    let sweeper = run_sweeper_until_stopped(cache, sweep_interval);

    let application_task = tokio::spawn(application);
    let sweeper_task = tokio::spawn(sweeper);
    tokio::select! {
        o = application_task => report_exit("API", o),
        o = sweeper_task => report_exit("Passcode sweeper", o),
    };

    Ok(())
}

fn report_exit(
    task_name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error! {
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed", task_name
            }
        }
        Err(e) => {
            tracing::error! {
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete", task_name
            }
        }
    }
}
