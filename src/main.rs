use std::path::PathBuf;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Optional explicit config file: --config=<path>. Otherwise the file is resolved from
    // EXPLORER_WIZARD_CONFIG, the working directory, the executable folder or the user
    // config directory.
    let config_path = args
        .iter()
        .find_map(|a| a.strip_prefix("--config="))
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    // Non-interactive submission contract smoke.
    // Prints the JSON payload built for a sample lead and exits 0/1. No network calls.
    if args.iter().any(|a| a == "--contract-smoke") {
        explorer_wizard::run_contract_smoke(config_path.as_deref());
        return;
    }

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific page and exits 0.
    // Usage: --tui-smoke or --tui-smoke=home|profile|trip|consent|submitted|cancel|chat
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        explorer_wizard::run_tui_smoke(config_path.as_deref(), target);
        return;
    }

    // --chat opens straight into the FAQ assistant; the wizard is one keypress away.
    let open_chat = args.iter().any(|a| a == "--chat");
    explorer_wizard::run_tui(config_path.as_deref(), open_chat);
}
