// Explorer Circle trip planner
// Main library entry point

pub mod api;
pub mod chat;
pub mod config;
pub mod models;
pub mod tui;
pub mod utils;
pub mod wizard;

use log::{error, info};
use std::path::Path;

use crate::config::AppConfig;
use crate::models::record::{
    Companion, Experience, HearAboutUs, PioneerTraveller, StepData, TravellerType,
};
use crate::models::requests::SubmissionPayload;
use crate::wizard::WizardController;

/// Initialize logging system with dual format (JSON + human-readable)
fn init_logging(with_stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;
    std::fs::create_dir_all(&log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");

    // JSON log file for structured parsing
    let json_log_file = log_dir.join(format!("explorer-wizard-{}.log", timestamp));

    // Human-readable log file (.txt)
    let txt_log_file = log_dir.join(format!("explorer-wizard-{}.txt", timestamp));

    // - JSON format to .log file
    // - Human-readable format to .txt file
    // - Optional: human-readable to stdout (disabled for TUI to avoid corrupting the terminal UI)
    let mut dispatch = fern::Dispatch::new()
        .level(log::LevelFilter::Debug)
        .level_for("hyper", log::LevelFilter::Info)
        .level_for("reqwest", log::LevelFilter::Info);

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(log::LevelFilter::Info)
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}", txt_line));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &timestamp_utc,
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                        None,
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let message_str = format!("{}", message);
                    let (phase, step, cleaned_message) =
                        utils::logging::parse_log_metadata(&message_str);
                    let txt_line = utils::logging::format_human_readable_log(
                        &timestamp_local.to_string(),
                        record.level(),
                        record.target(),
                        &cleaned_message,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", txt_line));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

/// Load configuration or exit with a readable message.
fn load_config_or_exit(explicit: Option<&Path>) -> AppConfig {
    let loaded = match explicit {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    match loaded {
        Ok(cfg) => {
            info!(
                "[PHASE: initialization] [STEP: config] API base {}, request timeout {}s",
                cfg.api_base_url, cfg.request_timeout_secs
            );
            cfg
        }
        Err(e) => {
            error!("[PHASE: initialization] [STEP: config] {:#}", e);
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn log_startup(mode: &str) {
    info!(
        "[PHASE: initialization] {} starting at {}",
        mode,
        chrono::Utc::now()
    );
    match utils::path_resolver::resolve_deployment_folder() {
        Ok(dir) => info!(
            "[PHASE: initialization] [STEP: deployment_folder] Deployment folder: {:?}",
            dir
        ),
        Err(e) => info!(
            "[PHASE: initialization] [STEP: deployment_folder] Unresolved: {}",
            e
        ),
    }
}

/// Interactive terminal trip planner. `open_chat` starts with the FAQ chat panel open.
pub fn run_tui(config_path: Option<&Path>, open_chat: bool) {
    // Initialize logging (no stdout to avoid corrupting the TUI)
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log_startup("Terminal trip planner");

    let cfg = load_config_or_exit(config_path);
    if let Err(e) = tui::run(cfg, open_chat) {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        eprintln!("Explorer Wizard error: {}", e);
    }
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame and exits.
pub fn run_tui_smoke(config_path: Option<&Path>, target: Option<String>) {
    // Initialize logging (no stdout to avoid corrupting the terminal)
    if let Err(e) = init_logging(false) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log_startup("Headless TUI smoke");

    let cfg = load_config_or_exit(config_path);
    let target = target.as_deref().unwrap_or("home");
    if let Err(e) = tui::smoke(cfg, target) {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        eprintln!("Explorer Wizard error: {}", e);
        std::process::exit(1);
    }
}

/// Walk the wizard with fixed sample answers and return the payload that would be sent.
pub fn sample_payload(cfg: &AppConfig, today: chrono::NaiveDate) -> anyhow::Result<SubmissionPayload> {
    let mut wizard = WizardController::new();

    let mut profile = wizard.mount_profile(cfg.max_upload_bytes);
    profile.set_name("Jo");
    profile.set_email("jo@example.com");
    profile.set_country("Uganda");
    profile.set_phone_parts("+256", "0700000000");
    profile.set_been_to_africa(true);
    profile.toggle_traveller_type(TravellerType::Adventurer);
    profile.set_hear_about_us(HearAboutUs::FriendOrFamily);
    profile.set_pioneer_traveller(PioneerTraveller::Yes);
    wizard.advance(StepData::Profile(profile.commit()?))?;

    let mut trip = wizard.mount_trip(today, cfg.min_start_lead_days);
    let start = trip.earliest_start() + chrono::Days::new(10);
    trip.set_start_date(Some(start));
    trip.set_end_date(Some(start + chrono::Days::new(7)));
    trip.toggle_experience(Experience::GorillaTrekking);
    trip.toggle_experience(Experience::NileAdventure);
    trip.toggle_experience(Experience::FoodNightlife);
    trip.set_companion(Companion::Family);
    trip.set_companion_count(Some(5));
    trip.set_dream_words("mountains, rivers and good food");
    wizard.advance(StepData::Trip(trip.commit()?))?;

    let mut consent = wizard.mount_consent();
    consent.set_keep_updated(true);
    Ok(wizard.prepare_submission(&mut consent, today)?)
}

/// Non-interactive contract smoke: prints the JSON payload the wizard builds for a sample
/// lead, without contacting the backend. Exits 0/1.
pub fn run_contract_smoke(config_path: Option<&Path>) {
    if let Err(e) = init_logging(true) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log_startup("Submission contract smoke");

    let cfg = load_config_or_exit(config_path);
    let today = chrono::Local::now().date_naive();
    let result = sample_payload(&cfg, today).and_then(|payload| {
        serde_json::to_string_pretty(&payload).map_err(anyhow::Error::from)
    });

    match result {
        Ok(json) => {
            info!("[PHASE: submission] [STEP: contract_smoke] Sample payload built");
            println!("{}", json);
        }
        Err(e) => {
            error!(
                "[PHASE: submission] [STEP: contract_smoke] Smoke failed: {:#}",
                e
            );
            eprintln!("Explorer Wizard error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_payload_matches_backend_contract() {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let payload = sample_payload(&AppConfig::default(), today).unwrap();

        assert_eq!(payload.phone, "+256700000000");
        assert_eq!(payload.group_size, 4);
        assert_eq!(payload.travel_month, "november");
        assert_eq!(payload.travel_year, 2026);
        assert_eq!(payload.feature_as_pioneer, "yes");
        assert!(payload.email_opt_in);
        assert_eq!(
            payload.must_have_experiences,
            vec![
                Experience::GorillaTrekking,
                Experience::NileAdventure,
                Experience::FoodNightlife
            ]
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["group_type"], "family");
        assert_eq!(json["send_options"], "both");
        assert_eq!(json["heard_about_us"], "friend_or_family");
    }
}
