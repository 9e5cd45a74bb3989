use std::io::Write;

use crate::database::{AppState, DatabaseConnection};
use crate::error::ServiceResult;
use crate::models::{StaffAccount, StaffRole};

mod api;
mod database;
mod docs;
mod env;
mod error;
mod import;
mod models;
mod payment_gateway;
mod permissions;
mod request_state;
mod server;

#[tokio::main]
async fn main() {
    let result = init().await;

    let exit_code = match result {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{:?}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn init() -> ServiceResult<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let app_state = AppState::connect(env::DATABASE_URI.as_str()).await;

    let command = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match command.as_str() {
        "run" => server::start_server(app_state).await,
        "admin" => create_admin_user(app_state).await,
        other => {
            eprintln!("Unknown command '{other}'. Available commands: run, admin");
            Ok(())
        }
    }
}

/// Read a value from stdin
fn read_value(prompt: &str) -> ServiceResult<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut value = String::new();
    std::io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_owned())
}

async fn create_admin_user(app_state: AppState) -> ServiceResult<()> {
    let connection = app_state.pool.acquire().await?;
    let mut db = DatabaseConnection { connection };

    let fullname = read_value("Fullname: ")?;
    let email = read_value("Email: ")?;
    let username = read_value("Username: ")?;
    let password = read_value("Password: ")?;

    let staff = db
        .store_staff_account(StaffAccount {
            id: 0,
            fullname,
            email,
            username,
            password_hash: api::password_hash_create(&password),
            role: StaffRole::Admin,
            created_at: chrono::Utc::now(),
        })
        .await?;

    println!("Admin user '{}' was successfully created!", staff.username);

    Ok(())
}
