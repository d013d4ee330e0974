//! Market store: append-only operation journal replayed into the engine
//!
//! The engine is serialization-free, so the store persists the sequence of
//! operations as JSON and rebuilds state by replaying them. The store also
//! plays the engine's external collaborators: the collateral ledger (named
//! trader balances), access control (owner-gated resolution) and the clock
//! (journal-driven logical time).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use foresight::{AccountId, Market, MarketError, VecMarket, SCALE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("engine rejected operation: {0:?}")]
    Engine(MarketError),

    #[error("{trader} holds {available} collateral, needs {required}")]
    InsufficientCollateral {
        trader: String,
        available: String,
        required: String,
    },

    #[error("only the market owner ({owner}) may resolve questions")]
    NotOwner { owner: String },

    #[error("invalid amount '{0}': expected a decimal collateral amount")]
    InvalidAmount(String),
}

impl From<MarketError> for StoreError {
    fn from(err: MarketError) -> Self {
        StoreError::Engine(err)
    }
}

/// One journaled operation. Collateral amounts are decimal strings - u128
/// share quantities do not survive a round trip through JSON numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Fund {
        trader: String,
        amount: String,
    },
    AdvanceTime {
        seconds: u64,
    },
    CreateQuestion {
        creator: String,
        title: String,
        meta: String,
        category: String,
        resolve_time: u64,
        outcomes: u16,
        liquidity: String,
        fee: u64,
    },
    Buy {
        question: u64,
        trader: String,
        outcome: u16,
        deposit: String,
        min_shares: String,
    },
    Sell {
        question: u64,
        trader: String,
        outcome: u16,
        shares: String,
        min_amount: String,
    },
    Resolve {
        question: u64,
        outcome: u16,
        resolver: String,
    },
    Claim {
        question: u64,
        trader: String,
    },
}

/// Result of a successfully applied operation.
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    Funded,
    TimeAdvanced { now: u64 },
    Created { question: u64 },
    Bought { shares: u128 },
    Sold { revenue: u128 },
    Resolved,
    Claimed { reward: u128 },
}

/// Engine plus the collaborator state the CLI is responsible for.
#[derive(Debug, PartialEq)]
pub struct MarketState {
    pub engine: VecMarket,
    pub balances: BTreeMap<String, u128>,
    pub owner: String,
}

impl MarketState {
    pub fn new(owner: &str) -> Self {
        Self {
            engine: Market::new(),
            balances: BTreeMap::new(),
            owner: owner.to_string(),
        }
    }

    /// Collateral balance of a named trader.
    pub fn collateral(&self, trader: &str) -> u128 {
        self.balances.get(trader).copied().unwrap_or(0)
    }

    fn require_collateral(&self, trader: &str, required: u128) -> Result<(), StoreError> {
        let available = self.collateral(trader);
        if available < required {
            return Err(StoreError::InsufficientCollateral {
                trader: trader.to_string(),
                available: format_units(available),
                required: format_units(required),
            });
        }
        Ok(())
    }

    fn debit(&mut self, trader: &str, amount: u128) {
        let balance = self.balances.entry(trader.to_string()).or_insert(0);
        *balance = balance.saturating_sub(amount);
    }

    fn credit(&mut self, trader: &str, amount: u128) {
        let balance = self.balances.entry(trader.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Apply one operation: move collateral and drive the engine in the
    /// same unit, debiting only after the engine accepts so a rejected
    /// operation leaves the ledger untouched.
    pub fn apply(&mut self, op: &Op) -> Result<Applied, StoreError> {
        match op {
            Op::Fund { trader, amount } => {
                let amount = parse_units(amount)?;
                self.credit(trader, amount);
                Ok(Applied::Funded)
            }
            Op::AdvanceTime { seconds } => {
                self.engine.advance_time(*seconds);
                Ok(Applied::TimeAdvanced {
                    now: self.engine.current_time,
                })
            }
            Op::CreateQuestion {
                creator,
                title,
                meta,
                category,
                resolve_time,
                outcomes,
                liquidity,
                fee,
            } => {
                let liquidity = parse_units(liquidity)?;
                self.require_collateral(creator, liquidity)?;
                let question = self.engine.create_question(
                    account_id(creator),
                    title.clone(),
                    meta.clone(),
                    category.clone(),
                    *resolve_time,
                    *outcomes,
                    liquidity,
                    *fee,
                )?;
                self.debit(creator, liquidity);
                Ok(Applied::Created { question })
            }
            Op::Buy {
                question,
                trader,
                outcome,
                deposit,
                min_shares,
            } => {
                let deposit = parse_units(deposit)?;
                let min_shares = parse_units(min_shares)?;
                self.require_collateral(trader, deposit)?;
                let shares = self.engine.buy(
                    *question,
                    account_id(trader),
                    *outcome,
                    deposit,
                    min_shares,
                )?;
                self.debit(trader, deposit);
                Ok(Applied::Bought { shares })
            }
            Op::Sell {
                question,
                trader,
                outcome,
                shares,
                min_amount,
            } => {
                let shares = parse_units(shares)?;
                let min_amount = parse_units(min_amount)?;
                let revenue = self.engine.sell(
                    *question,
                    account_id(trader),
                    *outcome,
                    shares,
                    min_amount,
                )?;
                self.credit(trader, revenue);
                Ok(Applied::Sold { revenue })
            }
            Op::Resolve {
                question,
                outcome,
                resolver,
            } => {
                if resolver != &self.owner {
                    return Err(StoreError::NotOwner {
                        owner: self.owner.clone(),
                    });
                }
                self.engine.resolve_question(*question, *outcome)?;
                Ok(Applied::Resolved)
            }
            Op::Claim { question, trader } => {
                let reward = self.engine.claim(*question, account_id(trader))?;
                self.credit(trader, reward);
                Ok(Applied::Claimed { reward })
            }
        }
    }
}

/// Replay a journal from scratch.
pub fn replay(owner: &str, ops: &[Op]) -> Result<MarketState, StoreError> {
    let mut state = MarketState::new(owner);
    for op in ops {
        state.apply(op)?;
    }
    Ok(state)
}

/// Journal-backed market store.
pub struct Store {
    path: PathBuf,
    pub ops: Vec<Op>,
    pub state: MarketState,
}

impl Store {
    /// Load the journal at `path` (an absent file is an empty market) and
    /// replay it into a fresh state.
    pub fn open(path: &Path, owner: &str) -> anyhow::Result<Self> {
        let ops: Vec<Op> = if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read store: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("failed to parse store: {}", path.display()))?
        } else {
            Vec::new()
        };

        let state = replay(owner, &ops)
            .map_err(|err| anyhow::anyhow!("corrupt journal {}: {}", path.display(), err))?;
        log::debug!("replayed {} operations from {}", ops.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            ops,
            state,
        })
    }

    /// Apply one operation and append it to the journal on success.
    pub fn execute(&mut self, op: Op) -> Result<Applied, StoreError> {
        let applied = self.state.apply(&op)?;
        self.ops.push(op);
        Ok(applied)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(&self.ops)?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write store: {}", self.path.display()))?;
        Ok(())
    }
}

/// Map a trader name to the engine's opaque identity token.
pub fn account_id(name: &str) -> AccountId {
    let mut id = [0u8; 32];
    for (i, byte) in name.bytes().take(32).enumerate() {
        id[i] = byte;
    }
    id
}

/// Parse a decimal collateral amount ("50", "47.5") into scaled units.
pub fn parse_units(text: &str) -> Result<u128, StoreError> {
    let invalid = || StoreError::InvalidAmount(text.to_string());

    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > 18 {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let mut frac_units: u128 = if frac.is_empty() {
        0
    } else {
        frac.parse().map_err(|_| invalid())?
    };
    for _ in frac.len()..18 {
        frac_units *= 10;
    }

    whole
        .checked_mul(SCALE)
        .and_then(|scaled| scaled.checked_add(frac_units))
        .ok_or_else(invalid)
}

/// Render scaled units back as a decimal string, trimming trailing zeros.
pub fn format_units(value: u128) -> String {
    let whole = value / SCALE;
    let frac = value % SCALE;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_units_accepts_whole_and_fractional_amounts() {
        assert_eq!(parse_units("50").unwrap(), 50 * SCALE);
        assert_eq!(parse_units("47.5").unwrap(), 47 * SCALE + SCALE / 2);
        assert_eq!(parse_units("0.000000000000000001").unwrap(), 1);
        assert_eq!(parse_units(".5").unwrap(), SCALE / 2);
        assert_eq!(parse_units("0").unwrap(), 0);
    }

    #[test]
    fn parse_units_rejects_garbage() {
        for bad in ["", ".", "1.2.3", "-4", "1e9", "0.0000000000000000001"] {
            assert!(parse_units(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn format_units_round_trips() {
        for text in ["0", "50", "47.5", "1047.5", "0.000000000000000001"] {
            assert_eq!(format_units(parse_units(text).unwrap()), text);
        }
    }

    fn seeded_state() -> MarketState {
        let mut state = MarketState::new("owner");
        state
            .apply(&Op::Fund {
                trader: "alice".into(),
                amount: "2000".into(),
            })
            .unwrap();
        state
            .apply(&Op::CreateQuestion {
                creator: "alice".into(),
                title: "Test question - 1".into(),
                meta: String::new(),
                category: "crypto".into(),
                resolve_time: 1_000,
                outcomes: 2,
                liquidity: "1000".into(),
                fee: 5,
            })
            .unwrap();
        state
    }

    #[test]
    fn create_question_debits_the_creator() {
        let state = seeded_state();
        assert_eq!(state.collateral("alice"), 1_000 * SCALE);
        assert_eq!(state.engine.question_count(), 1);
    }

    #[test]
    fn buy_requires_funded_collateral() {
        let mut state = seeded_state();
        let result = state.apply(&Op::Buy {
            question: 0,
            trader: "bob".into(),
            outcome: 0,
            deposit: "50".into(),
            min_shares: "0".into(),
        });
        assert!(matches!(
            result,
            Err(StoreError::InsufficientCollateral { .. })
        ));
    }

    #[test]
    fn full_trade_and_settlement_flow() {
        let mut state = seeded_state();
        state
            .apply(&Op::Fund {
                trader: "bob".into(),
                amount: "100".into(),
            })
            .unwrap();

        let applied = state
            .apply(&Op::Buy {
                question: 0,
                trader: "bob".into(),
                outcome: 0,
                deposit: "50".into(),
                min_shares: "0".into(),
            })
            .unwrap();
        assert_eq!(applied, Applied::Bought { shares: 95 * SCALE });
        assert_eq!(state.collateral("bob"), 50 * SCALE);

        // Resolution is owner-gated.
        let result = state.apply(&Op::Resolve {
            question: 0,
            outcome: 0,
            resolver: "bob".into(),
        });
        assert!(matches!(result, Err(StoreError::NotOwner { .. })));

        state
            .apply(&Op::AdvanceTime { seconds: 1_000 })
            .unwrap();
        state
            .apply(&Op::Resolve {
                question: 0,
                outcome: 0,
                resolver: "owner".into(),
            })
            .unwrap();

        let applied = state
            .apply(&Op::Claim {
                question: 0,
                trader: "bob".into(),
            })
            .unwrap();
        assert_eq!(applied, Applied::Claimed { reward: 95 * SCALE });
        assert_eq!(state.collateral("bob"), 145 * SCALE);
    }

    #[test]
    fn rejected_operations_do_not_reach_the_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");
        let mut store = Store::open(&path, "owner").unwrap();

        store
            .execute(Op::Fund {
                trader: "alice".into(),
                amount: "10".into(),
            })
            .unwrap();
        let result = store.execute(Op::CreateQuestion {
            creator: "alice".into(),
            title: "too big".into(),
            meta: String::new(),
            category: String::new(),
            resolve_time: 1_000,
            outcomes: 2,
            liquidity: "1000".into(),
            fee: 5,
        });
        assert!(result.is_err());
        assert_eq!(store.ops.len(), 1);
    }

    #[test]
    fn journal_survives_a_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.json");

        let mut store = Store::open(&path, "owner").unwrap();
        store
            .execute(Op::Fund {
                trader: "alice".into(),
                amount: "2000".into(),
            })
            .unwrap();
        store
            .execute(Op::CreateQuestion {
                creator: "alice".into(),
                title: "Test question - 1".into(),
                meta: String::new(),
                category: "crypto".into(),
                resolve_time: 1_000,
                outcomes: 2,
                liquidity: "1000".into(),
                fee: 5,
            })
            .unwrap();
        store.save().unwrap();

        let reloaded = Store::open(&path, "owner").unwrap();
        assert_eq!(reloaded.ops, store.ops);
        assert_eq!(reloaded.state, store.state);
    }
}
