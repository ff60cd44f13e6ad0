//! Sample ledger domain served by the API.
//!
//! An [`Account`] is opened once, then takes deposits and withdrawals. Each
//! command produces exactly one event record; the events do the mutation.

use commander::{
    AggregateRef, BoxError, Command, CommandContext, CommandRegistry, EventRecord, EventRegistry,
    RegistryError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{AggregateId, StoredAggregate};
use thiserror::Error;

pub const OPENED: &str = "account/opened";
pub const DEPOSITED: &str = "account/deposited";
pub const WITHDRAWN: &str = "account/withdrawn";

/// Rule violations raised by ledger commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {0} is already open")]
    AlreadyOpen(AggregateId),

    #[error("account {0} is not open")]
    NotOpen(AggregateId),

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },
}

/// A ledger account. Balances are in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AggregateId,
    pub owner: Option<String>,
    pub balance: i64,
    pub open: bool,
    /// Stored version this state was loaded from or last saved as.
    #[serde(default)]
    pub version: u64,
}

impl Account {
    /// A not-yet-opened account with the given id.
    pub fn new(id: AggregateId) -> Self {
        Self {
            id,
            owner: None,
            balance: 0,
            open: false,
            version: 0,
        }
    }
}

impl StoredAggregate for Account {
    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn aggregate_id(&self) -> AggregateId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

fn actor(context: &CommandContext) -> Option<&str> {
    context.get_str("actor")
}

fn ensure_open(account: &AggregateRef<Account>) -> Result<i64, LedgerError> {
    let account = account.read();
    if account.open {
        Ok(account.balance)
    } else {
        Err(LedgerError::NotOpen(account.id))
    }
}

// -- Commands --

#[derive(Debug, Deserialize)]
pub struct Open {
    pub owner: String,
}

impl Command<Account> for Open {
    fn is_valid(&self) -> bool {
        !self.owner.trim().is_empty()
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<Account>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<Account>>, BoxError> {
        {
            let account = aggregate.read();
            if account.open {
                return Err(LedgerError::AlreadyOpen(account.id).into());
            }
        }
        Ok(vec![EventRecord::new(
            aggregate,
            OPENED,
            json!({"owner": self.owner.trim(), "actor": actor(context)}),
        )])
    }
}

#[derive(Debug, Deserialize)]
pub struct Deposit {
    pub amount: i64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl Command<Account> for Deposit {
    fn is_valid(&self) -> bool {
        self.amount > 0
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<Account>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<Account>>, BoxError> {
        ensure_open(aggregate)?;
        Ok(vec![EventRecord::new(
            aggregate,
            DEPOSITED,
            json!({"amount": self.amount, "memo": self.memo, "actor": actor(context)}),
        )])
    }
}

#[derive(Debug, Deserialize)]
pub struct Withdraw {
    pub amount: i64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl Command<Account> for Withdraw {
    fn is_valid(&self) -> bool {
        self.amount > 0
    }

    fn execute(
        &self,
        aggregate: &AggregateRef<Account>,
        context: &CommandContext,
    ) -> Result<Vec<EventRecord<Account>>, BoxError> {
        let balance = ensure_open(aggregate)?;
        if balance < self.amount {
            return Err(LedgerError::InsufficientFunds {
                balance,
                requested: self.amount,
            }
            .into());
        }
        Ok(vec![EventRecord::new(
            aggregate,
            WITHDRAWN,
            json!({"amount": self.amount, "memo": self.memo, "actor": actor(context)}),
        )])
    }
}

// -- Events --

#[derive(Debug, Deserialize)]
pub struct Opened {
    pub owner: String,
}

impl commander::Event<Account> for Opened {
    fn is_valid(&self) -> bool {
        !self.owner.is_empty()
    }

    fn apply(&self, record: &EventRecord<Account>) {
        record.aggregate().update(|account| {
            account.owner = Some(self.owner.clone());
            account.open = true;
        });
    }
}

#[derive(Debug, Deserialize)]
pub struct Deposited {
    pub amount: i64,
}

impl commander::Event<Account> for Deposited {
    fn is_valid(&self) -> bool {
        self.amount > 0
    }

    fn apply(&self, record: &EventRecord<Account>) {
        record
            .aggregate()
            .update(|account| account.balance += self.amount);
    }
}

#[derive(Debug, Deserialize)]
pub struct Withdrawn {
    pub amount: i64,
}

impl commander::Event<Account> for Withdrawn {
    fn is_valid(&self) -> bool {
        self.amount > 0
    }

    fn apply(&self, record: &EventRecord<Account>) {
        record
            .aggregate()
            .update(|account| account.balance -= self.amount);
    }
}

/// Command registry for the ledger. Names are `account/<command>`.
pub fn commands() -> Result<CommandRegistry<Account>, RegistryError> {
    let mut registry = CommandRegistry::new();
    registry
        .register::<Open>("account/open")?
        .register::<Deposit>("account/deposit")?
        .register::<Withdraw>("account/withdraw")?;
    Ok(registry)
}

/// Event registry for the ledger.
pub fn events() -> Result<EventRegistry<Account>, RegistryError> {
    let mut registry = EventRegistry::new();
    registry
        .register::<Opened>(OPENED)?
        .register::<Deposited>(DEPOSITED)?
        .register::<Withdrawn>(WITHDRAWN)?;
    Ok(registry)
}
