//! Command handlers: drive one operation through the store and report it

use anyhow::Result;
use colored::Colorize;

use crate::store::{format_units, Applied, Op, Store, StoreError};

pub fn fund(store: &mut Store, trader: String, amount: String) -> Result<()> {
    store.execute(Op::Fund {
        trader: trader.clone(),
        amount,
    })?;
    store.save()?;
    println!(
        "{} {} now holds {}",
        "Funded:".bright_green(),
        trader,
        format_units(store.state.collateral(&trader))
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    store: &mut Store,
    creator: String,
    title: String,
    meta: String,
    category: String,
    resolve_time: u64,
    outcomes: u16,
    liquidity: String,
    fee: u64,
) -> Result<()> {
    let applied = store.execute(Op::CreateQuestion {
        creator,
        title: title.clone(),
        meta,
        category,
        resolve_time,
        outcomes,
        liquidity,
        fee,
    })?;
    store.save()?;
    if let Applied::Created { question } = applied {
        println!(
            "{} question #{} {:?} ({} outcomes, resolves at t={})",
            "Created:".bright_green(),
            question,
            title,
            outcomes,
            resolve_time
        );
    }
    Ok(())
}

pub fn buy(
    store: &mut Store,
    question: u64,
    trader: String,
    outcome: u16,
    deposit: String,
    min_shares: String,
) -> Result<()> {
    let applied = store.execute(Op::Buy {
        question,
        trader: trader.clone(),
        outcome,
        deposit,
        min_shares,
    })?;
    store.save()?;
    if let Applied::Bought { shares } = applied {
        println!(
            "{} {} shares of question #{} outcome {} for {}",
            "Bought:".bright_green(),
            format_units(shares),
            question,
            outcome,
            trader
        );
    }
    prices(store, question)
}

pub fn sell(
    store: &mut Store,
    question: u64,
    trader: String,
    outcome: u16,
    shares: String,
    min_amount: String,
) -> Result<()> {
    let applied = store.execute(Op::Sell {
        question,
        trader: trader.clone(),
        outcome,
        shares,
        min_amount,
    })?;
    store.save()?;
    if let Applied::Sold { revenue } = applied {
        println!(
            "{} question #{} outcome {}: {} receives {}",
            "Sold:".bright_green(),
            question,
            outcome,
            trader,
            format_units(revenue)
        );
    }
    prices(store, question)
}

pub fn max_sell(store: &Store, question: u64, outcome: u16) -> Result<()> {
    let max_shares = store
        .state
        .engine
        .max_sellable_shares(question, outcome)
        .map_err(StoreError::from)?;
    println!(
        "Question #{} outcome {} absorbs up to {} shares per sell",
        question,
        outcome,
        format_units(max_shares)
    );
    Ok(())
}

pub fn prices(store: &Store, question: u64) -> Result<()> {
    let prices = store
        .state
        .engine
        .prices(question)
        .map_err(StoreError::from)?;
    for (outcome, price) in prices.iter().enumerate() {
        println!(
            "  {} outcome {}: {}",
            "price".bright_cyan(),
            outcome,
            format_units(*price)
        );
    }
    Ok(())
}

pub fn info(store: &Store, question: u64) -> Result<()> {
    let record = store
        .state
        .engine
        .question(question)
        .map_err(StoreError::from)?;

    let status = if record.resolved {
        format!("resolved -> outcome {}", record.winning_outcome)
    } else {
        "open".to_string()
    };

    println!("{} #{} {:?}", "Question".bright_cyan().bold(), record.id, record.title);
    if !record.category.is_empty() {
        println!("  {} {}", "category:".bright_cyan(), record.category);
    }
    if !record.meta.is_empty() {
        println!("  {} {}", "meta:".bright_cyan(), record.meta);
    }
    println!("  {} {}", "outcomes:".bright_cyan(), record.outcome_count);
    println!("  {} {}%", "fee:".bright_cyan(), record.fee_percent);
    println!(
        "  {} {}",
        "liquidity:".bright_cyan(),
        format_units(record.initial_liquidity)
    );
    println!(
        "  {} {}",
        "volume:".bright_cyan(),
        format_units(record.trade_volume)
    );
    println!(
        "  {} {}",
        "fees accrued:".bright_cyan(),
        format_units(record.fees_accrued)
    );
    println!(
        "  {} t={} (now t={})",
        "resolves at:".bright_cyan(),
        record.resolve_time,
        store.state.engine.current_time
    );
    println!("  {} {}", "status:".bright_cyan(), status);
    prices(store, question)
}

pub fn list(store: &Store) -> Result<()> {
    if store.state.engine.question_count() == 0 {
        println!("no questions yet");
        return Ok(());
    }
    for record in store.state.engine.questions.iter() {
        let status = if record.resolved {
            format!("resolved -> outcome {}", record.winning_outcome)
        } else {
            "open".to_string()
        };
        println!(
            "#{} {:?} [{} outcomes, {}]",
            record.id, record.title, record.outcome_count, status
        );
    }
    Ok(())
}

pub fn balance(store: &Store, trader: String, question: Option<u64>) -> Result<()> {
    println!(
        "{} {} holds {} collateral",
        "Balance:".bright_cyan(),
        trader,
        format_units(store.state.collateral(&trader))
    );
    if let Some(question) = question {
        let record = store
            .state
            .engine
            .question(question)
            .map_err(StoreError::from)?;
        let holder = crate::store::account_id(&trader);
        for outcome in 0..record.outcome_count {
            println!(
                "  question #{} outcome {}: {} shares",
                question,
                outcome,
                format_units(record.balance_of(&holder, outcome))
            );
        }
    }
    Ok(())
}

pub fn resolve(store: &mut Store, question: u64, outcome: u16, resolver: String) -> Result<()> {
    store.execute(Op::Resolve {
        question,
        outcome,
        resolver,
    })?;
    store.save()?;
    println!(
        "{} question #{} -> outcome {}",
        "Resolved:".bright_green(),
        question,
        outcome
    );
    Ok(())
}

pub fn claim(store: &mut Store, question: u64, trader: String) -> Result<()> {
    let applied = store.execute(Op::Claim {
        question,
        trader: trader.clone(),
    })?;
    store.save()?;
    if let Applied::Claimed { reward } = applied {
        println!(
            "{} {} redeems {} from question #{}",
            "Claimed:".bright_green(),
            trader,
            format_units(reward),
            question
        );
    }
    Ok(())
}

pub fn advance_time(store: &mut Store, seconds: u64) -> Result<()> {
    let applied = store.execute(Op::AdvanceTime { seconds })?;
    store.save()?;
    if let Applied::TimeAdvanced { now } = applied {
        println!("{} clock is at t={}", "Advanced:".bright_green(), now);
    }
    Ok(())
}
