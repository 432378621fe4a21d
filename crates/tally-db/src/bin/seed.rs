//! # Seed Data Generator
//!
//! Populates a development database with demo sale orders and prints the
//! first page of the order list.
//!
//! ## Usage
//! ```bash
//! # Generate 200 orders for company 1 (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tally-db --bin seed -- --count 1000
//!
//! # Specify database path and company
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --company 7
//! ```
//!
//! ## Generated Orders
//! Each order gets:
//! - A business day spread over the last weeks of March 2024
//! - One to three line items from a small grocery catalog
//! - One or two payments (cash, card, wallet), some of them failed
//! - A refund sheet on every twentieth order

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::env;
use tally_core::display::TIMESTAMP_FORMAT;
use tally_core::{Money, OrderFilter, PageRequest};
use tally_db::{Database, DbConfig, QueryConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Demo catalog: name, barcode, unit price.
const CATALOG: &[(&str, &str, i64)] = &[
    ("Whole Milk 1L", "6901234500011", 1250),
    ("Sourdough Bread", "6901234500028", 899),
    ("Free Range Eggs x12", "6901234500035", 1575),
    ("Orange Juice 2L", "6901234500042", 1099),
    ("Greek Yogurt", "6901234500059", 450),
    ("Jasmine Rice 5kg", "6901234500066", 4990),
    ("Sparkling Water", "6901234500073", 325),
    ("Dark Chocolate", "6901234500080", 1200),
];

/// Payment methods: id, name.
const METHODS: &[(i64, &str)] = &[(1, "Cash"), (2, "Card"), (3, "Wallet")];

/// States cycled through the demo orders.
const STATES: &[i64] = &[5, 5, 5, 4, 6, 8, 1, 3];

const STORES: &[(i64, &str)] = &[(1, "Main St"), (2, "Harbour Mall")];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut company_id: i64 = 1;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--company" => {
                if i + 1 < args.len() {
                    company_id = args[i + 1].parse().unwrap_or(1);
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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of orders to generate (default: 200)");
                println!("      --company <ID>   Company id of the orders (default: 1)");
                println!("  -d, --db <PATH>      Database file path (default: ./tally_dev.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(db = %db_path, count, company_id, "Seeding demo orders");

    let db = Database::new(DbConfig::new(&db_path), QueryConfig::from_env()?).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_order WHERE company_id = ?")
        .bind(company_id)
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("Company {} already has {} orders; skipping seed.", company_id, existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let base = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|day| day.and_hms_opt(9, 0, 0))
        .ok_or("invalid seed start date")?;

    for n in 0..count {
        if let Err(e) = insert_order(db.pool(), company_id, n, base).await {
            eprintln!("Failed to insert order {}: {}", n, e);
            continue;
        }
        if (n + 1) % 100 == 0 {
            info!(generated = n + 1, "Seeding progress");
        }
    }
    info!(count, elapsed = ?start.elapsed(), "Seed complete");

    let page = db
        .sale_orders()
        .list_orders_with_summary(&OrderFilter::for_company(company_id), PageRequest::new(1, 10), None)
        .await?;

    println!();
    println!(
        "{} matching orders, total {} / discount {} / received {}",
        page.all_count,
        page.amount_data.total_price,
        page.amount_data.total_discount_price,
        page.amount_data.total_receive_price
    );
    for row in &page.records_list {
        println!(
            "  {:<14} {:<20} {:<18} {:>9}  {}",
            row.order_number,
            row.create_at,
            row.state_name,
            row.receive_price,
            row.pay_channel.as_deref().unwrap_or("-")
        );
    }

    db.close().await;
    Ok(())
}

fn cents(amount: i64) -> Money {
    Money::new(Decimal::new(amount, 2))
}

/// Inserts one demo order with its items, payments and maybe a refund.
async fn insert_order(
    pool: &SqlitePool,
    company_id: i64,
    n: usize,
    base: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let record_id = Uuid::new_v4().to_string();
    let order_number = format!("SO{:08}", n + 1);
    let created_at = base + Duration::minutes(37 * n as i64);
    let state = STATES[n % STATES.len()];
    let (store_id, store_name) = STORES[n % STORES.len()];

    let lines: Vec<(&str, &str, i64, i64)> = (0..1 + n % 3)
        .map(|k| {
            let (name, barcode, price) = CATALOG[(n * 3 + k) % CATALOG.len()];
            (name, barcode, price, 1 + ((n + k) % 2) as i64)
        })
        .collect();
    let total: i64 = lines.iter().map(|(_, _, price, qty)| price * qty).sum();
    let discount = if n % 4 == 0 { total / 10 } else { 0 };
    let due = total - discount;

    sqlx::query(
        r#"
        INSERT INTO sale_order (
            record_id, company_id, order_number, store_id, store_name,
            channel_id, channel_name, member_name, member_phone,
            operator_name, operator_phone, state, order_source,
            business_day, created_at, paid_at,
            total_origin_price, discount_price, origin_price, change_money
        ) VALUES (?, ?, ?, ?, ?, 1, 'POS', ?, ?, 'Demo Cashier', '13800000000', ?, 1, ?, ?, ?, ?, ?, ?, '0.00')
        "#,
    )
    .bind(&record_id)
    .bind(company_id)
    .bind(&order_number)
    .bind(store_id)
    .bind(store_name)
    .bind((n % 3 == 0).then(|| format!("Member {}", n)))
    .bind((n % 3 == 0).then(|| format!("139{:08}", n)))
    .bind(state)
    .bind(created_at.date().to_string())
    .bind(created_at.format(TIMESTAMP_FORMAT).to_string())
    .bind((state >= 4).then(|| (created_at + Duration::minutes(2)).format(TIMESTAMP_FORMAT).to_string()))
    .bind(cents(total).to_fixed())
    .bind(cents(discount).to_fixed())
    .bind(cents(due).to_fixed())
    .execute(&mut *tx)
    .await?;

    let mut item_ids = Vec::new();
    for (name, barcode, price, qty) in &lines {
        let item_id = Uuid::new_v4().to_string();
        let subtotal = cents(price * qty);
        sqlx::query(
            r#"
            INSERT INTO sale_order_item (
                record_id, order_id, order_number, company_id, goods_sale_name,
                barcode, purchase_quantity, selling_price, shop_price,
                origin_total_price_in_shopcaritem, actual_receive_price, goods_unit_name
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pc')
            "#,
        )
        .bind(&item_id)
        .bind(&record_id)
        .bind(&order_number)
        .bind(company_id)
        .bind(*name)
        .bind(*barcode)
        .bind(format!("{}.000", qty))
        .bind(cents(*price).to_fixed())
        .bind(cents(*price).to_fixed())
        .bind(subtotal.to_fixed())
        .bind(subtotal.to_fixed())
        .execute(&mut *tx)
        .await?;
        item_ids.push(item_id);
    }

    // Awaiting-payment orders keep a pending row; failed ones a failed row.
    let success: Option<bool> = match state {
        1 => None,
        3 => Some(false),
        _ => Some(true),
    };
    let split = n % 5 == 0 && due > 1000;
    let payments: Vec<(i64, &str, i64)> = if split {
        vec![
            (METHODS[0].0, METHODS[0].1, 1000),
            (METHODS[1].0, METHODS[1].1, due - 1000),
        ]
    } else {
        let (id, name) = METHODS[n % METHODS.len()];
        vec![(id, name, due)]
    };
    for (sort, (method_id, method_name, amount)) in payments.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_order_payment (
                order_id, company_id, payment_method_id, payment_method_name,
                payment_amount, is_pay_success, sort
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record_id)
        .bind(company_id)
        .bind(*method_id)
        .bind(*method_name)
        .bind(cents(*amount).to_fixed())
        .bind(success)
        .bind(sort as i64)
        .execute(&mut *tx)
        .await?;
    }

    if n % 20 == 0 && state >= 4 {
        let refund_id = Uuid::new_v4().to_string();
        let (_, _, price, _) = lines[0];
        let refunded_at = created_at + Duration::hours(3);

        sqlx::query(
            r#"
            INSERT INTO sale_order_refund (
                record_id, order_id, company_id, refund_number, refund_type_alias,
                refund_reason, operator_name, created_at
            ) VALUES (?, ?, ?, ?, 'Refund only', 'Damaged packaging', 'Demo Cashier', ?)
            "#,
        )
        .bind(&refund_id)
        .bind(&record_id)
        .bind(company_id)
        .bind(format!("RF{:08}", n + 1))
        .bind(refunded_at.format(TIMESTAMP_FORMAT).to_string())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO sale_order_refund_item (
                order_refund_id, order_item_id, refund_quantity, refund_price, is_refund_success
            ) VALUES (?, ?, '1.000', ?, 1)
            "#,
        )
        .bind(&refund_id)
        .bind(&item_ids[0])
        .bind(cents(price).to_fixed())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO sale_order_refund_payment (
                order_refund_id, company_id, refund_payment_method_id, refund_payment_name,
                refund_payment_amount, is_refund_success, refund_success_time, sort
            ) VALUES (?, ?, -1, 'Aggregated', ?, 1, ?, 0)
            "#,
        )
        .bind(&refund_id)
        .bind(company_id)
        .bind(cents(price).to_fixed())
        .bind((refunded_at + Duration::minutes(1)).format(TIMESTAMP_FORMAT).to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}
