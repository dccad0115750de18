use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use kantong::{PasswordHash, ValidatedPassword, create_user, initialize_db, seed_default_categories};

/// A utility for creating a test database for the REST API server of kantong.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    let category_count = seed_default_categories(&connection)?;
    println!("Added {category_count} default categories");

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user("Test User", "test@example.com", password_hash, &connection)?;

    println!("Success! Log in as {} with the password \"test\".", user.email);

    Ok(())
}
