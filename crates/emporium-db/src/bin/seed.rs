//! # Seed Data Generator
//!
//! Populates the database with demo accounts and products for development.
//!
//! ## Usage
//! ```bash
//! # 60 products (default)
//! cargo run -p emporium-db --bin seed
//!
//! # Custom amount and database
//! cargo run -p emporium-db --bin seed -- --count 500 --db ./data/emporium.db
//! ```
//!
//! ## Generated Data
//! - `admin` / `admin@emporium.test` (admin)
//! - `seller` / `seller@emporium.test` (owns every seeded product)
//! - Products across a handful of categories; roughly one in five is left in
//!   a non-ACTIVE status so the public and owner listings differ
//!
//! Both accounts use the password from `SEED_PASSWORD` (default
//! `emporium-dev`).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use std::env;

use emporium_core::{NewProduct, NewUser, ProductStatus};
use emporium_db::{Database, DbConfig};

/// Product categories with base names
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Kitchen",
        &["Ceramic Mug", "Chef Knife", "Cutting Board", "Tea Kettle", "Salad Bowl"],
    ),
    (
        "Office",
        &["Desk Lamp", "Notebook", "Fountain Pen", "Monitor Stand", "Paper Tray"],
    ),
    (
        "Outdoor",
        &["Camping Stool", "Water Bottle", "Trail Backpack", "Headlamp", "Rain Shell"],
    ),
    (
        "Home",
        &["Wool Throw", "Candle Set", "Picture Frame", "Door Mat", "Plant Pot"],
    ),
];

/// Variants appended to base names
const VARIANTS: &[(&str, i64)] = &[("Classic", 0), ("Plus", 700), ("Pro", 1800)];

/// Status cycle; ACTIVE dominates
const STATUSES: &[ProductStatus] = &[
    ProductStatus::Active,
    ProductStatus::Active,
    ProductStatus::Active,
    ProductStatus::Active,
    ProductStatus::Draft,
    ProductStatus::Active,
    ProductStatus::Active,
    ProductStatus::LowStock,
    ProductStatus::Active,
    ProductStatus::OutOfStock,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./emporium.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Emporium Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./emporium.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Emporium Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let password = env::var("SEED_PASSWORD").unwrap_or_else(|_| "emporium-dev".to_string());
    let password_hash = hash(&password)?;

    let admin = db
        .users()
        .insert(&NewUser {
            username: "admin".to_string(),
            email: "admin@emporium.test".to_string(),
            password_hash: password_hash.clone(),
            is_admin: true,
        })
        .await?;
    let seller = db
        .users()
        .insert(&NewUser {
            username: "seller".to_string(),
            email: "seller@emporium.test".to_string(),
            password_hash,
            is_admin: false,
        })
        .await?;
    println!("✓ Created users '{}' and '{}'", admin.username, seller.username);

    println!();
    println!("Generating products...");
    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for round in 0.. {
        let before = generated;
        for (category, names) in CATEGORIES {
            for name in names.iter() {
                for (variant, addon) in VARIANTS {
                    if generated >= count {
                        break 'outer;
                    }

                    let product =
                        generate_product(category, name, variant, *addon, round, generated);
                    if let Err(e) = db.products().insert(seller.id, &product).await {
                        eprintln!("Failed to insert {}: {}", product.name, e);
                        continue;
                    }
                    generated += 1;
                }
            }
        }
        // Every insert in a full round failed; more rounds won't help
        if generated == before {
            break;
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let public = db
        .products()
        .count(emporium_core::ListingScope::Public, &Default::default())
        .await?;
    println!("  Publicly listed: {}", public);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic, plausible values.
fn generate_product(
    category: &str,
    name: &str,
    variant: &str,
    price_addon: i64,
    round: usize,
    seed: usize,
) -> NewProduct {
    // $4.99 - $44.99 before the variant addon
    let price_cents = 499 + ((seed * 37) % 40) as i64 * 100 + price_addon;
    let status = STATUSES[seed % STATUSES.len()];
    let stock = match status {
        ProductStatus::OutOfStock => 0,
        ProductStatus::LowStock => 2,
        _ => (seed % 90) as i64 + 10,
    };
    let full_name = if round == 0 {
        format!("{} {}", name, variant)
    } else {
        format!("{} {} #{}", name, variant, round + 1)
    };

    NewProduct {
        description: Some(format!("{} from our {} range.", full_name, category.to_lowercase())),
        name: full_name,
        category: category.to_string(),
        price_cents,
        stock,
        status,
        image: None,
    }
}

fn hash(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash seed password: {}", e))?;
    Ok(hash.to_string())
}
