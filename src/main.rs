use fanvue_agency_hub_lib::{logging, run, settings};

#[tokio::main]
async fn main() {
    let settings = match settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("fanvue-agency-hub: {err}");
            std::process::exit(2);
        }
    };
    let _log_guard = logging::init(&settings);

    if let Err(err) = run(settings).await {
        tracing::error!(code = %err.code(), "fatal: {}", err.message());
        std::process::exit(1);
    }
}
