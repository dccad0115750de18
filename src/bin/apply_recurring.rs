use std::{error::Error, path::Path, process::exit, time::Instant};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use kantong::{
    SQLiteRecurringLedger, apply_due_recurring, get_all_user_ids, initialize_db, local_today,
};

/// Apply the recurring transactions that are due today for every user.
///
/// Meant to be run once a day, e.g. from cron. Running it more than once on the same day does
/// not create duplicate transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical timezone name that decides which day it is, e.g. "Asia/Jakarta".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter::LevelFilter::INFO))
        .init();

    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let Some(today) = local_today(&args.timezone) else {
        eprintln!("Unknown timezone \"{}\"", args.timezone);
        exit(1);
    };

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let start_time = Instant::now();
    let ledger = SQLiteRecurringLedger::new(&connection);
    let mut failed_users = 0;

    for user_id in get_all_user_ids(&connection)? {
        match apply_due_recurring(&ledger, user_id, today) {
            Ok(result) => tracing::info!("User {user_id}: {}", result.message),
            Err(error) => {
                failed_users += 1;
                tracing::error!("Could not apply recurring transactions for user {user_id}: {error}");
            }
        }
    }

    tracing::info!(
        "Applied recurring transactions for {today} in {}ms",
        start_time.elapsed().as_millis()
    );

    if failed_users > 0 {
        return Err(format!("Recurring transactions failed for {failed_users} user(s)").into());
    }

    Ok(())
}
