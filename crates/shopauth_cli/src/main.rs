//! Console entry point for the clothes shop account demo.
//!
//! # Responsibility
//! - Drive the numbered register/login menu over line input.
//! - Render `CredentialService` outcomes as console messages.
//!
//! All business rules live in `shopauth_core`; this binary only collects
//! trimmed input and presents results.

use log::warn;
use shopauth_core::{
    core_version, default_log_level, init_logging, CredentialService, JsonFileUserStore,
    LoginRequest, RegisterRequest,
};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

const USERS_FILE: &str = "users.json";

fn main() -> ExitCode {
    if let Some(log_dir) = log_dir() {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let store = match JsonFileUserStore::new(USERS_FILE) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: cannot open {USERS_FILE}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let service = CredentialService::new(store);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!();
        println!("=== Online Clothes Shop (v{}) ===", core_version());
        println!("1) Register");
        println!("2) Login");
        println!("3) Exit");

        let Some(choice) = prompt(&mut lines, "Choose an option") else {
            break;
        };

        match choice.as_str() {
            "1" => run_register(&service, &mut lines),
            "2" => run_login(&service, &mut lines),
            "3" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Try again."),
        }
    }

    ExitCode::SUCCESS
}

fn run_register<I>(service: &CredentialService<JsonFileUserStore>, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(username) = prompt(lines, "Username") else {
        return;
    };
    let Some(email) = prompt(lines, "Email") else {
        return;
    };
    let Some(password) = prompt(lines, "Password") else {
        return;
    };

    let request = RegisterRequest {
        key: username,
        name: None,
        email: Some(email),
        password,
    };
    match service.register(&request) {
        Ok(user) => println!("Registration successful. Welcome, {}!", user.name),
        Err(err) => {
            warn!("event=register module=cli status=error error={err}");
            println!("Error: {err}.");
        }
    }
}

fn run_login<I>(service: &CredentialService<JsonFileUserStore>, lines: &mut I)
where
    I: Iterator<Item = io::Result<String>>,
{
    let Some(username) = prompt(lines, "Username") else {
        return;
    };
    let Some(password) = prompt(lines, "Password") else {
        return;
    };

    let request = LoginRequest {
        key: username,
        password,
    };
    match service.login(&request) {
        Ok(user) => println!("Login successful. Welcome back, {}!", user.name),
        Err(err) => {
            warn!("event=login module=cli status=error error={err}");
            println!("Error: {err}.");
        }
    }
}

/// Prints a prompt and reads one trimmed line. Returns `None` on EOF or a
/// read error, which callers treat as "abandon the current action".
fn prompt<I>(lines: &mut I, label: &str) -> Option<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{label}: ");
    let _ = io::stdout().flush();
    match lines.next() {
        Some(Ok(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}

fn log_dir() -> Option<String> {
    let dir = std::env::current_dir().ok()?.join("logs");
    Some(dir.to_str()?.to_string())
}
