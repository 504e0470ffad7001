//! # Seed Data Generator
//!
//! Populates the database with a catalog, customers and sample invoices
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed 20 invoices (default) into the configured database
//! cargo run -p invoicer-db --bin seed
//!
//! # Generate a custom amount
//! cargo run -p invoicer-db --bin seed -- --invoices 200
//!
//! # Specify database path or config file
//! cargo run -p invoicer-db --bin seed -- --db ./data/invoicer.db
//! cargo run -p invoicer-db --bin seed -- --config ./invoicer.toml
//! ```
//!
//! ## Generated Data
//! - Catalog: services (design, development, meetings) and hardware
//! - Customers: a handful of companies with contact details
//! - Invoices: 0-3 lines each, rotating customers, dates and status

use chrono::{Duration, NaiveDate};
use invoicer_core::{InvoiceHeader, InvoiceStatus, LineItemInput, NewCustomer};
use invoicer_db::{Database, InvoicerConfig};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog entries: (name, type, base price in cents)
const CATALOG: &[(&str, &str, i64)] = &[
    ("Logo Design", "Service", 150_000),
    ("Development", "Service", 450_000),
    ("Meetings", "Service", 25_000),
    ("Printer", "Hardware", 320_000),
    ("Monitor", "Hardware", 210_000),
];

/// Customers: (name, email, phone, address)
const CUSTOMERS: &[(&str, &str, &str, &str)] = &[
    ("PT Arunika Digital", "finance@arunika.co.id", "+62 21 555 0101", "Jakarta"),
    ("CV Kreativa Studio", "hello@kreativa.id", "+62 22 555 0202", "Bandung"),
    ("Toko Sinar Jaya", "admin@sinarjaya.id", "+62 31 555 0303", "Surabaya"),
    ("Nusantara Logistik", "billing@nusantara-log.id", "+62 61 555 0404", "Medan"),
];

const SUBJECTS: &[&str] = &[
    "Brand refresh",
    "Website build",
    "Quarterly retainer",
    "Office equipment",
    "Consulting",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,invoicer_db=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut invoices: usize = 20;
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--invoices" | "-n" => {
                if i + 1 < args.len() {
                    invoices = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Invoicer Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --invoices <N>   Number of invoices to generate (default: 20)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = InvoicerConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("🌱 Invoicer Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database.path.display());
    println!("Tax rate: {} bps", config.billing.tax_rate_bps);
    println!("Invoices: {}", invoices);
    println!();

    let db = Database::new(config.to_db_config()).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} catalog items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    let mut catalog = Vec::with_capacity(CATALOG.len());
    for (name, item_type, price) in CATALOG {
        let item = db.catalog().insert(name, item_type).await?;
        catalog.push((item, *price));
    }
    println!("✓ Inserted {} catalog items", catalog.len());

    // Customers
    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, email, phone, address) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&NewCustomer {
                name: name.to_string(),
                email: Some(email.to_string()),
                phone: Some(phone.to_string()),
                address: Some(address.to_string()),
            })
            .await?;
        customers.push(customer);
    }
    println!("✓ Inserted {} customers", customers.len());

    // Invoices
    println!();
    println!("Generating invoices...");

    let start = std::time::Instant::now();
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid base date")?;
    let mut generated = 0;

    for seed in 0..invoices {
        let customer = &customers[seed % customers.len()];
        let issue_date = base_date + Duration::days((seed * 3) as i64);

        let header = InvoiceHeader {
            issue_date,
            due_date: issue_date + Duration::days(30),
            subject: SUBJECTS[seed % SUBJECTS.len()].to_string(),
            customer_id: customer.id.clone(),
            status: if seed % 3 == 0 {
                InvoiceStatus::Paid
            } else {
                InvoiceStatus::Unpaid
            },
        };

        let lines: Vec<LineItemInput> = (0..seed % 4)
            .map(|n| {
                let (item, price) = &catalog[(seed + n) % catalog.len()];
                LineItemInput::new(&item.id, 1 + ((seed + n) % 5) as i64, *price)
            })
            .collect();

        match db.invoices().create(&header, &lines).await {
            Ok(invoice) => {
                generated += 1;
                if generated % 50 == 0 {
                    println!("  Generated {} invoices...", generated);
                }
                tracing::debug!(number = %invoice.invoice_number, total = invoice.total_cents, "Seeded invoice");
            }
            Err(e) => eprintln!("Failed to create invoice #{}: {}", seed, e),
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} invoices in {:?}", generated, elapsed);

    let (_, pagination) = db.invoices().list(&Default::default()).await?;
    println!("  Stored invoices: {}", pagination.total_items);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
