use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::macros::date;

use budgetree::{
    BudgetCategory, NewBudget, PasswordHash, UserID, ValidatedPassword, create_budget,
    create_user, initialize_db,
};

/// A utility for creating a test database for budgetree.
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
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        EmailAddress::new_unchecked("test@example.com"),
        password_hash,
        &conn,
    )?;

    println!("Creating sample budgets...");

    create_sample_budgets(user.id, &conn)?;

    println!("Success!");

    Ok(())
}

fn create_sample_budgets(user_id: UserID, conn: &Connection) -> Result<(), Box<dyn Error>> {
    create_budget(
        NewBudget {
            user_id,
            name: "Groceries".to_owned(),
            amount: 800.0,
            start_date: date!(2024 - 01 - 01),
            end_date: date!(2024 - 01 - 31),
            categories: vec![
                leaf("Fruit & Veg", 250.0),
                leaf("Meat", 300.0),
                leaf("Pantry", 150.0),
            ],
        },
        conn,
    )?;

    create_budget(
        NewBudget {
            user_id,
            name: "Trip".to_owned(),
            amount: 1000.0,
            start_date: date!(2024 - 02 - 10),
            end_date: date!(2024 - 02 - 24),
            categories: vec![
                leaf("Flights", 400.0),
                BudgetCategory {
                    id: 0,
                    name: "Hotel".to_owned(),
                    amount: 0.0,
                    subcategories: vec![leaf("Deposit", 150.0), leaf("Balance", 150.0)],
                },
                leaf("Food", 200.0),
            ],
        },
        conn,
    )?;

    Ok(())
}

fn leaf(name: &str, amount: f64) -> BudgetCategory {
    BudgetCategory {
        id: 0,
        name: name.to_owned(),
        amount,
        subcategories: Vec::new(),
    }
}
