use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration instead.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Listed explicitly so that secrets are never printed
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "OPS_HOST",
        "OPS_PORT",
        "OPS_DATABASE_URL",
        "OPS_PORTONE_API_URL",
        "OPS_PORTONE_STORE_ID",
        "OPS_GATEWAY_TIMEOUT_SECS",
        "OPS_WEBHOOK_TOLERANCE_SECS",
        "OPS_RECONCILER_ENABLED",
        "OPS_RECONCILER_INTERVAL_SECS",
        "OPS_STALE_ORDER_AGE_MINS",
        "OPS_RECONCILER_BATCH_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
