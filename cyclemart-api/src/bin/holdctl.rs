//! Verification harness for the five core hold operations against the
//! configured Postgres store. Exit code 0 on success; distinct non-zero
//! codes per error kind so scripts can tell outcomes apart.

use std::env;
use std::process::exit;
use std::sync::Arc;

use chrono::Utc;
use cyclemart_domain::{HoldError, Requester};
use cyclemart_hold::HoldManager;
use cyclemart_store::{ChangeNotifier, DbClient, PgCycleRepository, PgHoldRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const EXIT_VALIDATION: i32 = 2;
const EXIT_ALREADY_HELD: i32 = 3;
const EXIT_NOT_FOUND: i32 = 4;
const EXIT_STORE_UNAVAILABLE: i32 = 5;

fn exit_code(err: &HoldError) -> i32 {
    match err {
        HoldError::Validation(_) => EXIT_VALIDATION,
        HoldError::AlreadyHeld => EXIT_ALREADY_HELD,
        HoldError::NotFound(_) => EXIT_NOT_FOUND,
        HoldError::StoreUnavailable(_) => EXIT_STORE_UNAVAILABLE,
    }
}

fn usage() -> ! {
    eprintln!("usage: holdctl <command>");
    eprintln!("  create <cycle-id> <name> <email> <phone> <allotment>");
    eprintln!("  release <hold-id>");
    eprintln!("  list");
    eprintln!("  expire");
    eprintln!("  remaining <hold-id>");
    exit(EXIT_VALIDATION);
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    match raw.parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("error: {what} is not a valid uuid: {raw}");
            exit(EXIT_VALIDATION);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else { usage() };

    let config = match cyclemart_store::app_config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: failed to load config: {err}");
            exit(EXIT_STORE_UNAVAILABLE);
        }
    };
    let db = match DbClient::new(&config.database).await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("error: store unavailable: {err}");
            exit(EXIT_STORE_UNAVAILABLE);
        }
    };

    let holds = Arc::new(PgHoldRepository { pool: db.pool.clone() });
    let cycles = Arc::new(PgCycleRepository { pool: db.pool.clone() });
    let manager = HoldManager::new(
        holds,
        cycles,
        ChangeNotifier::default(),
        config.business_rules.hold_minutes,
    );

    let result = run(&manager, command, &args[1..]).await;
    if let Err(err) = result {
        eprintln!("error: {err}");
        exit(exit_code(&err));
    }
}

async fn run(manager: &HoldManager, command: &str, args: &[String]) -> Result<(), HoldError> {
    match command {
        "create" => {
            let [cycle_id, name, email, phone, allotment] = args else { usage() };
            let requester = Requester {
                full_name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                allotment_number: allotment.clone(),
            };
            let hold = manager
                .create_hold(parse_uuid(cycle_id, "cycle-id"), requester)
                .await?;
            println!("{}", render(&hold));
        }
        "release" => {
            let [hold_id] = args else { usage() };
            manager.release_hold(parse_uuid(hold_id, "hold-id")).await?;
            println!("released");
        }
        "list" => {
            if !args.is_empty() {
                usage();
            }
            let holds = manager.list_active_holds().await?;
            println!("{}", render(&holds));
        }
        "expire" => {
            if !args.is_empty() {
                usage();
            }
            let expired = manager.expire_stale_holds().await?;
            println!("expired {expired} hold(s)");
        }
        "remaining" => {
            let [hold_id] = args else { usage() };
            let id = parse_uuid(hold_id, "hold-id");
            let hold = manager
                .get_hold(id)
                .await?
                .ok_or_else(|| HoldError::not_found(format!("hold {id}")))?;
            println!("{}", hold.remaining_time(Utc::now()));
        }
        _ => usage(),
    }
    Ok(())
}

fn render<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "<unserializable>".to_string())
}
