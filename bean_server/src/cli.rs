use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help and the current configuration.
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
    // Secrets are deliberately left off this list
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "BM_HOST",
        "BM_PORT",
        "BM_DATABASE_URL",
        "BM_MAX_DB_CONNECTIONS",
        "BM_RUN_MIGRATIONS",
        "BM_WEBHOOK_TOLERANCE_SECS",
        "BM_DB_TX_TIMEOUT_MS",
        "BM_PROCESSOR_BASE_URL",
        "BM_CURRENCY",
        "BM_CORS_ORIGIN",
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
