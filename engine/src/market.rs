//! Core market engine: fixed-point math, question registry, reserve ledger,
//! pricing curve, trade execution and settlement.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

mod u256 {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer for overflow-safe intermediate products.
        pub struct U256(4);
    }
}

pub use u256::U256;

// ============================================================================
// Fixed-Point Arithmetic
// ============================================================================

/// One whole collateral unit. Prices, shares and collateral amounts are
/// integers scaled by this factor.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Fee denominator: fees are expressed as an integer percentage in [0, 100].
pub const FEE_DENOM: u128 = 100;

/// `a * b / d` with a 256-bit intermediate, truncating toward zero.
///
/// Fails with `Overflow` when the final quotient does not fit in a u128
/// and with `DivisionByZero` on a zero divisor.
#[inline]
fn mul_div(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(MarketError::DivisionByZero);
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(d);
    if wide.bits() > 128 {
        return Err(MarketError::Overflow);
    }
    Ok(wide.low_u128())
}

/// Scaled multiply: `a * b / SCALE`.
#[inline]
fn mul_scaled(a: u128, b: u128) -> Result<u128> {
    mul_div(a, b, SCALE)
}

/// Scaled divide: `a * SCALE / b`.
#[inline]
fn div_scaled(a: u128, b: u128) -> Result<u128> {
    mul_div(a, SCALE, b)
}

#[inline]
fn add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(MarketError::Overflow)
}

#[inline]
fn sub_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(MarketError::Overflow)
}

/// Integer-percent fee on `amount`, truncating toward zero.
#[inline]
fn percent_of(amount: u128, percent: u64) -> Result<u128> {
    mul_div(amount, percent as u128, FEE_DENOM)
}

// ============================================================================
// Core Data Structures
// ============================================================================

/// Opaque holder/creator identity. The engine never interprets its
/// structure, only compares it.
pub type AccountId = [u8; 32];

/// One prediction market question.
///
/// Identity fields (`id`, `creator`, `resolve_time`, `outcome_count`,
/// `initial_liquidity`, `fee_percent`) are fixed at creation. Reserves,
/// volume, accrued fees and holder positions are mutated by every trade;
/// the resolution fields flip exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    /// Sequential identifier assigned at creation.
    pub id: u64,

    /// Account that funded the initial liquidity.
    pub creator: AccountId,

    /// Free-form descriptive text; no effect on pricing.
    pub title: String,
    pub meta: String,
    pub category: String,

    /// Timestamp after which resolution is permitted.
    pub resolve_time: u64,

    /// Number of mutually exclusive outcomes, >= 2.
    pub outcome_count: u16,

    /// Collateral deposited at creation; the starting reserve of every
    /// outcome.
    pub initial_liquidity: u128,

    /// Trading fee as an integer percentage in [0, 100].
    pub fee_percent: u64,

    /// False until `resolve_question` succeeds, then true forever.
    pub resolved: bool,

    /// Winning outcome index; meaningful only when `resolved`.
    pub winning_outcome: u16,

    /// Cumulative net collateral moved through the market. Starts at
    /// `initial_liquidity`, grows by the post-fee deposit on buys and
    /// shrinks by the gross amount on sells; bounds sell size.
    pub trade_volume: u128,

    /// Cumulative fee collateral retained by the protocol.
    pub fees_accrued: u128,

    /// Per-outcome reserve inventory read by the pricing curve. Length is
    /// always `outcome_count`.
    pub reserves: Vec<u128>,

    /// Per-holder share balances, one entry per outcome.
    pub positions: BTreeMap<AccountId, Vec<u128>>,
}

impl Question {
    /// Share balance of `holder` for `outcome` (zero if never traded).
    pub fn balance_of(&self, holder: &AccountId, outcome: u16) -> u128 {
        self.positions
            .get(holder)
            .and_then(|balances| balances.get(outcome as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Total reserve inventory across all outcomes.
    pub fn total_reserve(&self) -> Result<u128> {
        self.reserves
            .iter()
            .try_fold(0u128, |acc, &reserve| add_u128(acc, reserve))
    }

    fn balances_mut(&mut self, holder: AccountId) -> &mut Vec<u128> {
        let outcome_count = self.outcome_count as usize;
        self.positions
            .entry(holder)
            .or_insert_with(|| vec![0; outcome_count])
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketError {
    /// Resolve time is not strictly in the future.
    InvalidResolveTime,

    /// Fee percentage outside [0, 100].
    InvalidFee,

    /// Liquidity or trade amount must be positive.
    InvalidLiquidity,

    /// Unknown question id.
    QuestionNotFound,

    /// Outcome index out of range, or outcome count below 2.
    InvalidOutcome,

    /// Trade output fell below the caller's minimum.
    SlippageExceeded,

    /// Sell size exceeds what the market volume can absorb.
    InsufficientLiquidity,

    /// Holder balance too small for the requested sell.
    InsufficientBalance,

    /// Resolution attempted before the resolve time.
    NotYetExpired,

    /// Question already resolved (resolution and trading are closed).
    AlreadyResolved,

    /// Settlement attempted before resolution.
    NotResolved,

    /// Winning-share balance already redeemed.
    AlreadyClaimed,

    /// Arithmetic overflow; caller supplied out-of-range magnitudes.
    Overflow,

    /// Division by zero (defensive; unreachable while invariants hold).
    DivisionByZero,
}

pub type Result<T> = core::result::Result<T, MarketError>;

// ============================================================================
// Question Storage Trait
// ============================================================================

/// Trait for pluggable question storage.
///
/// Allows hosts to provide their own backing store: `Vec` for heap
/// allocation (default), fixed arenas, or memory-mapped regions.
pub trait QuestionStorage<T> {
    /// Get a question by index (immutable).
    fn get(&self, index: usize) -> Option<&T>;

    /// Get a question by index (mutable).
    fn get_mut(&mut self, index: usize) -> Option<&mut T>;

    /// Number of stored questions.
    fn len(&self) -> usize;

    /// Append a question, returning its index.
    fn push(&mut self, item: T) -> usize;

    /// Iterate over all questions.
    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a;
}

/// Vec-based storage (default, uses heap allocation).
impl<T> QuestionStorage<T> for Vec<T> {
    fn get(&self, index: usize) -> Option<&T> {
        <[T]>::get(self, index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        <[T]>::get_mut(self, index)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn push(&mut self, item: T) -> usize {
        let index = Vec::len(self);
        Vec::push(self, item);
        index
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        <[T]>::iter(self)
    }
}

/// Market engine state - generic over question storage.
///
/// The engine is an owned value: `&mut self` on every mutating operation
/// serializes all state transitions, which subsumes the per-question
/// exclusive-write discipline the ledger requires. No operation blocks,
/// suspends or retries internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Market<S = Vec<Question>>
where
    S: QuestionStorage<Question>,
{
    /// All questions, indexed by id.
    pub questions: S,

    /// Current time as supplied by the host clock; monotonically
    /// non-decreasing.
    pub current_time: u64,
}

/// Type alias for the default Vec-based engine.
pub type VecMarket = Market<Vec<Question>>;

// ============================================================================
// Engine Construction & Clock
// ============================================================================

impl<S> Market<S>
where
    S: QuestionStorage<Question> + Default,
{
    /// Create an empty market engine.
    pub fn new() -> Self {
        Self {
            questions: S::default(),
            current_time: 0,
        }
    }
}

impl<S> Default for Market<S>
where
    S: QuestionStorage<Question> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Market<S>
where
    S: QuestionStorage<Question>,
{
    /// Set the current time. The clock never moves backwards.
    pub fn set_time(&mut self, now: u64) {
        self.current_time = core::cmp::max(self.current_time, now);
    }

    /// Advance the current time by `elapsed`.
    pub fn advance_time(&mut self, elapsed: u64) {
        self.current_time = self.current_time.saturating_add(elapsed);
    }
}

// ============================================================================
// Question Registry
// ============================================================================

impl<S> Market<S>
where
    S: QuestionStorage<Question>,
{
    /// Create a new question seeded with `initial_liquidity` on every
    /// outcome.
    ///
    /// The matching collateral transfer from `creator` is the caller's
    /// responsibility; this only records the accounting effect.
    ///
    /// # Errors
    /// * `InvalidResolveTime` - `resolve_time` not strictly in the future
    /// * `InvalidFee` - `fee_percent` above 100
    /// * `InvalidLiquidity` - `initial_liquidity` is zero
    /// * `InvalidOutcome` - fewer than two outcomes
    #[allow(clippy::too_many_arguments)]
    pub fn create_question(
        &mut self,
        creator: AccountId,
        title: String,
        meta: String,
        category: String,
        resolve_time: u64,
        outcome_count: u16,
        initial_liquidity: u128,
        fee_percent: u64,
    ) -> Result<u64> {
        if resolve_time <= self.current_time {
            return Err(MarketError::InvalidResolveTime);
        }
        if fee_percent > 100 {
            return Err(MarketError::InvalidFee);
        }
        if initial_liquidity == 0 {
            return Err(MarketError::InvalidLiquidity);
        }
        if outcome_count < 2 {
            return Err(MarketError::InvalidOutcome);
        }

        let id = self.questions.len() as u64;
        self.questions.push(Question {
            id,
            creator,
            title,
            meta,
            category,
            resolve_time,
            outcome_count,
            initial_liquidity,
            fee_percent,
            resolved: false,
            winning_outcome: 0,
            trade_volume: initial_liquidity,
            fees_accrued: 0,
            reserves: vec![initial_liquidity; outcome_count as usize],
            positions: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Look up a question by id.
    pub fn question(&self, question_id: u64) -> Result<&Question> {
        self.questions
            .get(question_id as usize)
            .ok_or(MarketError::QuestionNotFound)
    }

    fn question_mut(&mut self, question_id: u64) -> Result<&mut Question> {
        self.questions
            .get_mut(question_id as usize)
            .ok_or(MarketError::QuestionNotFound)
    }

    /// Number of questions ever created.
    pub fn question_count(&self) -> u64 {
        self.questions.len() as u64
    }

    /// Share balance of `holder` for one outcome of a question.
    pub fn balance_of(
        &self,
        question_id: u64,
        holder: &AccountId,
        outcome: u16,
    ) -> Result<u128> {
        Ok(self.question(question_id)?.balance_of(holder, outcome))
    }

    /// Cumulative net collateral moved through the market.
    pub fn market_volume(&self, question_id: u64) -> Result<u128> {
        Ok(self.question(question_id)?.trade_volume)
    }

    /// Total reserve inventory across all outcomes.
    pub fn total_shares(&self, question_id: u64) -> Result<u128> {
        self.question(question_id)?.total_reserve()
    }

    /// Cumulative fee collateral retained by the protocol.
    pub fn accrued_fees(&self, question_id: u64) -> Result<u128> {
        Ok(self.question(question_id)?.fees_accrued)
    }
}

// ============================================================================
// Pricing Curve
// ============================================================================

impl<S> Market<S>
where
    S: QuestionStorage<Question>,
{
    /// Price of one outcome: its reserve's share of total inventory,
    /// scaled so that the full price vector sums to `SCALE`.
    ///
    /// Prices are derived values - always recomputed from live reserves,
    /// never stored.
    pub fn price(&self, question_id: u64, outcome: u16) -> Result<u128> {
        Self::price_in(self.question(question_id)?, outcome)
    }

    /// Full price vector in outcome-index order.
    pub fn prices(&self, question_id: u64) -> Result<Vec<u128>> {
        let question = self.question(question_id)?;
        (0..question.outcome_count)
            .map(|outcome| Self::price_in(question, outcome))
            .collect()
    }

    fn price_in(question: &Question, outcome: u16) -> Result<u128> {
        if outcome >= question.outcome_count {
            return Err(MarketError::InvalidOutcome);
        }
        let total = question.total_reserve()?;
        div_scaled(question.reserves[outcome as usize], total)
    }

    /// Invariant check: prices sum to `SCALE` within `outcome_count - 1`
    /// units of floor-rounding error.
    pub fn check_price_sum(&self, question_id: u64) -> bool {
        let Ok(question) = self.question(question_id) else {
            return false;
        };
        let Ok(prices) = self.prices(question_id) else {
            return false;
        };
        let mut sum = 0u128;
        for price in prices {
            let Some(next) = sum.checked_add(price) else {
                return false;
            };
            sum = next;
        }
        let spread = question.outcome_count as u128 - 1;
        sum <= SCALE && sum >= SCALE - spread
    }
}

// ============================================================================
// Trade Engine
// ============================================================================

impl<S> Market<S>
where
    S: QuestionStorage<Question>,
{
    /// Fee charged on a gross trade amount for this question.
    pub fn trade_fee(&self, question_id: u64, amount: u128) -> Result<u128> {
        percent_of(amount, self.question(question_id)?.fee_percent)
    }

    /// Buy outcome shares with `deposit` collateral.
    ///
    /// The fee comes off the deposit first; the remainder mints shares at
    /// the pre-trade price. The bought outcome's reserve grows by the
    /// minted shares - not by the net collateral - which is what moves its
    /// price up relative to the untouched outcomes.
    ///
    /// The matching `deposit` transfer from `buyer` is the caller's
    /// responsibility.
    ///
    /// # Returns
    /// Shares minted to `buyer`.
    pub fn buy(
        &mut self,
        question_id: u64,
        buyer: AccountId,
        outcome: u16,
        deposit: u128,
        min_shares: u128,
    ) -> Result<u128> {
        let question = self.question(question_id)?;
        if question.resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if outcome >= question.outcome_count {
            return Err(MarketError::InvalidOutcome);
        }
        if deposit == 0 {
            return Err(MarketError::InvalidLiquidity);
        }

        // Compute everything fallible against the pre-trade state, then
        // commit. A failure at any step leaves the question untouched.
        let fee = percent_of(deposit, question.fee_percent)?;
        let net = sub_u128(deposit, fee)?;
        let price_pre = Self::price_in(question, outcome)?;
        let shares = div_scaled(net, price_pre)?;
        if shares < min_shares {
            return Err(MarketError::SlippageExceeded);
        }

        let new_reserve = add_u128(question.reserves[outcome as usize], shares)?;
        let new_volume = add_u128(question.trade_volume, net)?;
        let new_fees = add_u128(question.fees_accrued, fee)?;
        let new_balance = add_u128(question.balance_of(&buyer, outcome), shares)?;

        let question = self.question_mut(question_id)?;
        question.reserves[outcome as usize] = new_reserve;
        question.trade_volume = new_volume;
        question.fees_accrued = new_fees;
        question.balances_mut(buyer)[outcome as usize] = new_balance;
        Ok(shares)
    }

    /// Maximum share quantity a single sell may move: the amount whose
    /// gross value equals the market volume, so a sell can never drive the
    /// volume negative.
    pub fn max_sellable_shares(&self, question_id: u64, outcome: u16) -> Result<u128> {
        let question = self.question(question_id)?;
        let price = Self::price_in(question, outcome)?;
        div_scaled(question.trade_volume, price)
    }

    /// Sell outcome shares back to the market at the pre-trade price.
    ///
    /// Returns the post-fee revenue; paying it out is the caller's
    /// responsibility.
    pub fn sell(
        &mut self,
        question_id: u64,
        seller: AccountId,
        outcome: u16,
        shares: u128,
        min_amount: u128,
    ) -> Result<u128> {
        let question = self.question(question_id)?;
        if question.resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if outcome >= question.outcome_count {
            return Err(MarketError::InvalidOutcome);
        }
        if shares == 0 {
            return Err(MarketError::InvalidLiquidity);
        }

        let price_pre = Self::price_in(question, outcome)?;
        let max_shares = div_scaled(question.trade_volume, price_pre)?;
        if shares > max_shares {
            return Err(MarketError::InsufficientLiquidity);
        }
        if question.balance_of(&seller, outcome) < shares {
            return Err(MarketError::InsufficientBalance);
        }

        let amount = mul_scaled(shares, price_pre)?;
        let fee = percent_of(amount, question.fee_percent)?;
        let revenue = sub_u128(amount, fee)?;
        if revenue < min_amount {
            return Err(MarketError::SlippageExceeded);
        }

        let new_reserve = sub_u128(question.reserves[outcome as usize], shares)?;
        let new_volume = sub_u128(question.trade_volume, amount)?;
        let new_fees = add_u128(question.fees_accrued, fee)?;
        let new_balance = sub_u128(question.balance_of(&seller, outcome), shares)?;

        let question = self.question_mut(question_id)?;
        question.reserves[outcome as usize] = new_reserve;
        question.trade_volume = new_volume;
        question.fees_accrued = new_fees;
        question.balances_mut(seller)[outcome as usize] = new_balance;
        Ok(revenue)
    }
}

// ============================================================================
// Resolution & Claim
// ============================================================================

impl<S> Market<S>
where
    S: QuestionStorage<Question>,
{
    /// Finalize the winning outcome. Permitted once the current time has
    /// reached `resolve_time`; transitions `resolved` false -> true exactly
    /// once. Authorization is the caller's concern.
    pub fn resolve_question(&mut self, question_id: u64, winning_outcome: u16) -> Result<()> {
        let question = self.question(question_id)?;
        if self.current_time < question.resolve_time {
            return Err(MarketError::NotYetExpired);
        }
        if question.resolved {
            return Err(MarketError::AlreadyResolved);
        }
        if winning_outcome >= question.outcome_count {
            return Err(MarketError::InvalidOutcome);
        }

        let question = self.question_mut(question_id)?;
        question.resolved = true;
        question.winning_outcome = winning_outcome;
        Ok(())
    }

    /// Collateral redeemable by `holder`: the winning-outcome share
    /// balance, redeemed 1:1.
    pub fn claimable_reward(&self, question_id: u64, holder: &AccountId) -> Result<u128> {
        let question = self.question(question_id)?;
        if !question.resolved {
            return Err(MarketError::NotResolved);
        }
        Ok(question.balance_of(holder, question.winning_outcome))
    }

    /// Redeem the holder's winning shares, zeroing the balance.
    ///
    /// Paying out the returned reward is the caller's responsibility.
    pub fn claim(&mut self, question_id: u64, holder: AccountId) -> Result<u128> {
        let reward = self.claimable_reward(question_id, &holder)?;
        if reward == 0 {
            return Err(MarketError::AlreadyClaimed);
        }

        let winning = self.question(question_id)?.winning_outcome;
        let question = self.question_mut(question_id)?;
        question.balances_mut(holder)[winning as usize] = 0;
        Ok(reward)
    }
}
