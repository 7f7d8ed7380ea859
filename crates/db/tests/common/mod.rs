//! Shared fixtures for the database integration tests.
//!
//! Every test gets its own in-memory SQLite database with migrations applied,
//! one tenant, its MASTER wallet and one REGULAR wallet.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use ledgerloop_core::access::ContactDetails;
use ledgerloop_core::account::AccountType;
use ledgerloop_core::bank::BankDetails;
use ledgerloop_core::ledger::{EntryIdentifiers, IdSource, RandomIdSource};
use ledgerloop_db::entities::{bank_references, ledger_entries};
use ledgerloop_db::migration::{Migrator, MigratorTrait};
use ledgerloop_db::repositories::{NewTenant, WalletKey};
use ledgerloop_db::{
    DepositRequest, OpenedAccount, TenantRepository, UserRepository, WalletEngine,
    WalletRepository, WorkflowReceipt,
};
use ledgerloop_shared::AesGcmCipher;
use ledgerloop_shared::types::{Money, TenantId, WalletId};

pub struct Fixture {
    pub db: DatabaseConnection,
    pub engine: WalletEngine,
    pub tenants: TenantRepository,
    pub users: UserRepository,
    pub tenant: TenantId,
    pub tenant_key: String,
    pub tenant_token: String,
    pub master: OpenedAccount,
    pub wallet: OpenedAccount,
}

impl Fixture {
    pub fn wallet_no(&self) -> String {
        self.wallet.wallet.account_no.clone()
    }

    pub fn wallet_id(&self) -> WalletId {
        WalletId::from_uuid(self.wallet.wallet.id)
    }

    pub fn master_id(&self) -> WalletId {
        WalletId::from_uuid(self.master.wallet.id)
    }

    pub async fn balance(&self, wallet: WalletId) -> Decimal {
        let row = WalletRepository::find(&self.db, WalletKey::Id(wallet))
            .await
            .expect("wallet lookup failed")
            .expect("wallet should exist");
        Money::from_minor(row.balance_minor)
    }

    pub async fn deposit(&self, amount: Decimal, utr_no: &str) -> WorkflowReceipt {
        self.engine
            .deposit(DepositRequest {
                tenant: self.tenant,
                account_no: self.wallet_no(),
                amount,
                description: "top up".to_string(),
                bank: bank(Some(utr_no)),
            })
            .await
            .expect("deposit failed")
    }

    pub async fn entry_count(&self) -> u64 {
        ledger_entries::Entity::find()
            .count(&self.db)
            .await
            .expect("count failed")
    }

    pub async fn bank_reference_count(&self) -> u64 {
        bank_references::Entity::find()
            .count(&self.db)
            .await
            .expect("count failed")
    }

    pub async fn assert_reconciled(&self) {
        for wallet in [self.wallet_id(), self.master_id()] {
            let report = self
                .engine
                .reconcile(wallet)
                .await
                .expect("reconcile failed");
            assert!(
                report.is_consistent(),
                "cached {} != derived {}",
                report.cached,
                report.derived
            );
        }
    }
}

pub fn bank(utr_no: Option<&str>) -> BankDetails {
    BankDetails {
        bank_name: "State Bank".to_string(),
        ifsc: "SBIN0001234".to_string(),
        account_holder_name: "Asha Rao".to_string(),
        account_no: "123456789012".to_string(),
        utr_no: utr_no.map(str::to_string),
    }
}

pub fn contact(mobile: &str) -> ContactDetails {
    ContactDetails {
        mobile: mobile.to_string(),
        name: "Asha Rao".to_string(),
        email: Some("asha@example.com".to_string()),
        enabled: true,
    }
}

pub async fn connect() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn setup() -> Fixture {
    setup_with(Arc::new(RandomIdSource), 8).await
}

pub async fn setup_with(ids: Arc<dyn IdSource>, max_attempts: u32) -> Fixture {
    let db = connect().await;
    let cipher = Arc::new(AesGcmCipher::from_key_bytes(&[7u8; 32]).expect("valid key"));
    let engine = WalletEngine::new(db.clone(), cipher)
        .with_id_source(ids)
        .with_max_attempts(max_attempts);

    let tenants = TenantRepository::new(db.clone());
    let users = UserRepository::new(db.clone());
    let issued = tenants
        .create(NewTenant {
            name: "Acme Shop".to_string(),
            key: "acme".to_string(),
            account_prefix: "ACME".to_string(),
        })
        .await
        .expect("tenant creation failed");
    let tenant = TenantId::from_uuid(issued.tenant.id);

    let master = engine
        .open_master_account(tenant, "INR")
        .await
        .expect("master wallet failed");
    let wallet = engine
        .open_regular_account(
            tenant,
            &users,
            &contact("9876543210"),
            "INR",
            AccountType::SemiClosed,
            true,
        )
        .await
        .expect("regular wallet failed");

    Fixture {
        db,
        engine,
        tenants,
        users,
        tenant,
        tenant_key: issued.tenant.key,
        tenant_token: issued.token,
        master,
        wallet,
    }
}

/// Identifier source that replays scripted values before falling back to random ones.
#[derive(Default)]
pub struct ScriptedIdSource {
    entries: Mutex<VecDeque<EntryIdentifiers>>,
    utrs: Mutex<VecDeque<String>>,
}

impl ScriptedIdSource {
    pub fn push_entry(&self, uuid: Uuid, txn_id: &str) {
        self.entries
            .lock()
            .expect("poisoned")
            .push_back(EntryIdentifiers {
                uuid,
                txn_id: txn_id.to_string(),
            });
    }

    pub fn push_utr(&self, utr: &str) {
        self.utrs
            .lock()
            .expect("poisoned")
            .push_back(utr.to_string());
    }
}

impl IdSource for ScriptedIdSource {
    fn entry_identifiers(&self) -> EntryIdentifiers {
        self.entries
            .lock()
            .expect("poisoned")
            .pop_front()
            .unwrap_or_else(|| RandomIdSource.entry_identifiers())
    }

    fn utr(&self) -> String {
        self.utrs
            .lock()
            .expect("poisoned")
            .pop_front()
            .unwrap_or_else(|| RandomIdSource.utr())
    }
}
