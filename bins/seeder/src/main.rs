//! Database seeder for Ledgerloop development and testing.
//!
//! Creates a demo tenant with its MASTER wallet, two funded REGULAR wallets
//! and one payment, then prints the issued credentials. Running it again
//! against a seeded database does nothing.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerloop_core::access::ContactDetails;
use ledgerloop_core::account::AccountType;
use ledgerloop_core::bank::BankDetails;
use ledgerloop_db::entities::tenants;
use ledgerloop_db::repositories::NewTenant;
use ledgerloop_db::{
    DepositRequest, PaymentRequest, TenantRepository, UserRepository, WalletEngine,
};
use ledgerloop_shared::types::TenantId;
use ledgerloop_shared::{AesGcmCipher, AppConfig};

const DEMO_KEY: &str = "demo";

struct DemoWallet {
    mobile: &'static str,
    name: &'static str,
    deposit_minor: i64,
    deposit_utr_no: &'static str,
}

const DEMO_WALLETS: [DemoWallet; 2] = [
    DemoWallet {
        mobile: "9000000001",
        name: "Asha Rao",
        deposit_minor: 150_000,
        deposit_utr_no: "DEMONEFT0001",
    },
    DemoWallet {
        mobile: "9000000002",
        name: "Vikram Shah",
        deposit_minor: 75_050,
        deposit_utr_no: "DEMONEFT0002",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerloop=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = ledgerloop_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    if demo_tenant_exists(&db).await? {
        info!(key = DEMO_KEY, "Demo tenant already exists, skipping");
        return Ok(());
    }

    let cipher = AesGcmCipher::from_base64_key(&config.cipher.key)
        .context("Invalid cipher key")?;
    let engine = WalletEngine::new(db.clone(), Arc::new(cipher))
        .with_max_attempts(config.ledger.utr_max_attempts);
    seed(&db, &engine, &config.ledger.default_currency).await?;

    info!("Seeding complete");
    Ok(())
}

async fn demo_tenant_exists(db: &DatabaseConnection) -> anyhow::Result<bool> {
    let existing = tenants::Entity::find()
        .filter(tenants::Column::Key.eq(DEMO_KEY))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

async fn seed(db: &DatabaseConnection, engine: &WalletEngine, currency: &str) -> anyhow::Result<()> {
    let issued = TenantRepository::new(db.clone())
        .create(NewTenant {
            name: "Demo Store".to_string(),
            key: DEMO_KEY.to_string(),
            account_prefix: "DEMO".to_string(),
        })
        .await?;
    let tenant = TenantId::from_uuid(issued.tenant.id);
    info!(key = %issued.tenant.key, token = %issued.token, "Created demo tenant");

    let master = engine.open_master_account(tenant, currency).await?;
    info!(
        account_no = %master.wallet.account_no,
        access_token = %master.access_token,
        "Opened master wallet"
    );

    let users = UserRepository::new(db.clone());
    let mut payer = None;
    for demo in &DEMO_WALLETS {
        let opened = engine
            .open_regular_account(
                tenant,
                &users,
                &ContactDetails {
                    mobile: demo.mobile.to_string(),
                    name: demo.name.to_string(),
                    email: None,
                    enabled: true,
                },
                currency,
                AccountType::SemiClosed,
                true,
            )
            .await?;
        let account_no = opened.wallet.account_no.clone();

        engine
            .deposit(DepositRequest {
                tenant,
                account_no: account_no.clone(),
                amount: Decimal::new(demo.deposit_minor, 2),
                description: "opening balance".to_string(),
                bank: BankDetails {
                    bank_name: "Demo Bank".to_string(),
                    ifsc: "DEMO0000001".to_string(),
                    account_holder_name: demo.name.to_string(),
                    account_no: format!("00{}", demo.mobile),
                    utr_no: Some(demo.deposit_utr_no.to_string()),
                },
            })
            .await?;
        info!(
            account_no = %account_no,
            access_token = %opened.access_token,
            "Opened and funded wallet"
        );
        payer.get_or_insert(account_no);
    }

    if let Some(account_no) = payer {
        let receipt = engine
            .pay_to_master(PaymentRequest {
                tenant,
                account_no,
                amount: Decimal::new(25_000, 2),
                description: "demo order".to_string(),
            })
            .await?;
        info!(utr = %receipt.utr, "Recorded demo payment");
    }
    Ok(())
}
