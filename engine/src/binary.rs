//! Binary (YES / NO) market layer over the N-outcome engine.
//!
//! Scope:
//! - Exactly two outcomes, addressed by [`Side`] instead of raw indices
//! - Same pricing curve, fees, sell cap and settlement as the core engine

use alloc::string::String;
use alloc::vec::Vec;

use crate::market::{AccountId, Market, Question, QuestionStorage, Result};

/// Number of outcomes in a binary question.
pub const BINARY_OUTCOMES: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Yes,
    No,
}

impl Side {
    /// Outcome index backing this side.
    pub fn index(self) -> u16 {
        match self {
            Side::Yes => 0,
            Side::No => 1,
        }
    }
}

/// A market engine restricted to YES / NO questions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryMarket<S = Vec<Question>>
where
    S: QuestionStorage<Question>,
{
    pub inner: Market<S>,
}

impl<S> BinaryMarket<S>
where
    S: QuestionStorage<Question> + Default,
{
    pub fn new() -> Self {
        Self {
            inner: Market::new(),
        }
    }
}

impl<S> BinaryMarket<S>
where
    S: QuestionStorage<Question>,
{
    pub fn set_time(&mut self, now: u64) {
        self.inner.set_time(now);
    }

    pub fn advance_time(&mut self, elapsed: u64) {
        self.inner.advance_time(elapsed);
    }

    /// Create a YES / NO question; outcome count is pinned to two.
    #[allow(clippy::too_many_arguments)]
    pub fn create_question(
        &mut self,
        creator: AccountId,
        title: String,
        meta: String,
        category: String,
        resolve_time: u64,
        initial_liquidity: u128,
        fee_percent: u64,
    ) -> Result<u64> {
        self.inner.create_question(
            creator,
            title,
            meta,
            category,
            resolve_time,
            BINARY_OUTCOMES,
            initial_liquidity,
            fee_percent,
        )
    }

    pub fn question(&self, question_id: u64) -> Result<&Question> {
        self.inner.question(question_id)
    }

    /// Current (YES, NO) price pair.
    pub fn prices(&self, question_id: u64) -> Result<(u128, u128)> {
        Ok((
            self.inner.price(question_id, Side::Yes.index())?,
            self.inner.price(question_id, Side::No.index())?,
        ))
    }

    pub fn buy(
        &mut self,
        question_id: u64,
        buyer: AccountId,
        side: Side,
        deposit: u128,
        min_shares: u128,
    ) -> Result<u128> {
        self.inner
            .buy(question_id, buyer, side.index(), deposit, min_shares)
    }

    pub fn sell(
        &mut self,
        question_id: u64,
        seller: AccountId,
        side: Side,
        shares: u128,
        min_amount: u128,
    ) -> Result<u128> {
        self.inner
            .sell(question_id, seller, side.index(), shares, min_amount)
    }

    pub fn max_sellable_shares(&self, question_id: u64, side: Side) -> Result<u128> {
        self.inner.max_sellable_shares(question_id, side.index())
    }

    pub fn balance_of(&self, question_id: u64, holder: &AccountId, side: Side) -> Result<u128> {
        self.inner.balance_of(question_id, holder, side.index())
    }

    pub fn resolve_question(&mut self, question_id: u64, winner: Side) -> Result<()> {
        self.inner.resolve_question(question_id, winner.index())
    }

    pub fn claimable_reward(&self, question_id: u64, holder: &AccountId) -> Result<u128> {
        self.inner.claimable_reward(question_id, holder)
    }

    pub fn claim(&mut self, question_id: u64, holder: AccountId) -> Result<u128> {
        self.inner.claim(question_id, holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{MarketError, SCALE};

    fn account(byte: u8) -> AccountId {
        [byte; 32]
    }

    fn units(n: u128) -> u128 {
        n * SCALE
    }

    fn new_question(market: &mut BinaryMarket) -> u64 {
        market
            .create_question(
                account(1),
                String::from("Will it settle YES?"),
                String::new(),
                String::from("crypto"),
                1_000,
                units(1_000),
                5,
            )
            .unwrap()
    }

    #[test]
    fn fresh_question_splits_prices_evenly() {
        let mut market = BinaryMarket::new();
        let question = new_question(&mut market);

        assert_eq!(market.question(question).unwrap().outcome_count, 2);
        assert_eq!(market.prices(question).unwrap(), (SCALE / 2, SCALE / 2));
    }

    #[test]
    fn buying_yes_moves_yes_price_up() {
        let mut market = BinaryMarket::new();
        let question = new_question(&mut market);

        let shares = market
            .buy(question, account(2), Side::Yes, units(50), 0)
            .unwrap();
        assert_eq!(shares, units(95));

        let (yes, no) = market.prices(question).unwrap();
        assert!(yes > SCALE / 2);
        assert!(no < SCALE / 2);
        assert_eq!(
            market.balance_of(question, &account(2), Side::Yes).unwrap(),
            units(95)
        );
    }

    #[test]
    fn settles_only_the_winning_side() {
        let mut market = BinaryMarket::new();
        let question = new_question(&mut market);

        let yes_shares = market
            .buy(question, account(2), Side::Yes, units(50), 0)
            .unwrap();
        market
            .buy(question, account(3), Side::No, units(30), 0)
            .unwrap();

        market.advance_time(1_000);
        market.resolve_question(question, Side::Yes).unwrap();

        assert_eq!(market.claim(question, account(2)).unwrap(), yes_shares);
        assert_eq!(
            market.claim(question, account(3)),
            Err(MarketError::AlreadyClaimed)
        );
    }
}
