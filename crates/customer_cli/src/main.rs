//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `customer_core` linkage with deterministic output.
//! - Optionally open a database file and report how many customers it holds.

use customer_core::{open_db, CustomerRepository, SqliteCustomerRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("customer_core ping={}", customer_core::ping());
    println!("customer_core version={}", customer_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match count_customers(&db_path) {
        Ok(count) => {
            println!("customer_core customers={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("customer_core error={err}");
            ExitCode::FAILURE
        }
    }
}

fn count_customers(db_path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let repo = SqliteCustomerRepository::try_new(&conn)?;
    Ok(repo.get_all()?.len())
}
