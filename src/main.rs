//! Synthetic Currency Engine Simulation.
//!
//! Walks the engine through its lifecycle: depositing collateral, minting,
//! a price crash, liquidation, and the staleness freeze.

use synth_core::*;

const ENGINE: AccountId = AccountId(1000);
const ALICE: AccountId = AccountId(1);
const BOB: AccountId = AccountId(2);
const WETH: AssetId = AssetId(1);
const WBTC: AssetId = AssetId(2);

// 8-decimal USD answers, as feeds report them
const USD: i128 = 100_000_000;

struct Harness {
    engine: Engine,
    weth: MockToken,
    wbtc: MockToken,
    dsc: MockCurrency,
    eth_feed: MockPriceFeed,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "synth_core=warn".into()),
        )
        .init();

    println!("Synthetic Currency Engine Simulation");
    println!("Over-collateralized minting, liquidation, staleness guard\n");

    scenario_1_deposit_and_mint()?;
    scenario_2_price_crash_and_liquidation()?;
    scenario_3_stale_feed_freeze()?;
    scenario_4_atomic_failure()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn harness() -> Result<Harness, EngineError> {
    let now = Timestamp::now();
    let weth = MockToken::new(ENGINE);
    let wbtc = MockToken::new(ENGINE);
    let dsc = MockCurrency::new(ENGINE);
    let eth_feed = MockPriceFeed::new(FeedId(1), 8, 2000 * USD, now);
    let btc_feed = MockPriceFeed::new(FeedId(2), 8, 30_000 * USD, now);

    let mut engine = Engine::new(
        EngineConfig::default(),
        ENGINE,
        vec![(WETH, Box::new(weth.clone())), (WBTC, Box::new(wbtc.clone()))],
        vec![Box::new(eth_feed.clone()), Box::new(btc_feed)],
        Box::new(dsc.clone()),
    )?;
    engine.set_time(now);

    for account in [ALICE, BOB] {
        weth.mint_to(account, Amount::from_whole(100));
        weth.approve(account, Amount::from_whole(100));
        wbtc.mint_to(account, Amount::from_whole(1));
        wbtc.approve(account, Amount::from_whole(1));
    }

    Ok(Harness {
        engine,
        weth,
        wbtc,
        dsc,
        eth_feed,
    })
}

/// Deposit, value, mint to the limit.
fn scenario_1_deposit_and_mint() -> Result<(), EngineError> {
    println!("Scenario 1: Deposit and Mint\n");

    let Harness { mut engine, weth, wbtc, dsc, .. } = harness()?;

    engine.deposit_collateral(ALICE, WETH, Amount::from_whole(10))?;
    engine.deposit_collateral(ALICE, WBTC, Amount::from_whole(1))?;
    let value = engine.get_account_collateral_value(ALICE)?;
    println!("  Alice deposits 10 WETH @ $2,000 and 1 WBTC @ $30,000");
    println!("  Collateral value: ${}", value);

    engine.mint_dsc(ALICE, Amount::from_whole(25_000))?;
    println!("  Alice mints 25,000 DSC, health factor {}", engine.get_health_factor(ALICE)?);

    match engine.mint_dsc(ALICE, Amount::from_whole(1)) {
        Err(err) => println!("  One more DSC is rejected: {err}"),
        Ok(()) => println!("  Unexpected: mint past the threshold went through"),
    }

    println!(
        "  Custody: {} WETH, {} WBTC, DSC supply {}\n",
        weth.balance_of(ENGINE),
        wbtc.balance_of(ENGINE),
        dsc.total_supply()
    );
    Ok(())
}

/// ETH drops, Alice's position goes under, Bob liquidates part of it.
fn scenario_2_price_crash_and_liquidation() -> Result<(), EngineError> {
    println!("Scenario 2: Price Crash and Liquidation\n");

    let Harness {
        mut engine,
        weth,
        dsc,
        eth_feed,
        ..
    } = harness()?;

    engine.deposit_collateral_and_mint_dsc(ALICE, WETH, Amount::from_whole(10), Amount::from_whole(8_000))?;
    engine.deposit_collateral_and_mint_dsc(BOB, WETH, Amount::from_whole(50), Amount::from_whole(2_000))?;
    println!("  Alice: 10 WETH, 8,000 DSC debt, health factor {}", engine.get_health_factor(ALICE)?);

    engine.advance_time(60);
    eth_feed.update(1_500 * USD, engine.time());
    println!("  ETH drops to $1,500, Alice's health factor {}", engine.get_health_factor(ALICE)?);

    for (account, hf) in engine.liquidatable_accounts() {
        println!("  Liquidatable: {} at {}", account, hf);
    }

    let cover = Amount::from_whole(2_000);
    dsc.approve(BOB, cover);
    let result = engine.liquidate(BOB, WETH, ALICE, cover)?;
    println!(
        "  Bob covers {} DSC, seizes {} WETH (bonus {})",
        result.debt_covered, result.collateral_seized, result.bonus
    );
    println!(
        "  Alice's health factor {} -> {}",
        result.health_factor_before, result.health_factor_after
    );
    println!("  Bob's wallet: {} WETH\n", weth.balance_of(BOB));
    Ok(())
}

/// A feed older than three hours freezes every priced action.
fn scenario_3_stale_feed_freeze() -> Result<(), EngineError> {
    println!("Scenario 3: Stale Feed Freeze\n");

    let Harness { mut engine, .. } = harness()?;
    engine.deposit_collateral_and_mint_dsc(ALICE, WETH, Amount::from_whole(10), Amount::from_whole(1_000))?;

    engine.advance_time(engine.price_timeout() + 1);
    println!("  Feeds silent for {}s", engine.price_timeout() + 1);

    match engine.get_health_factor(ALICE) {
        Err(err) => println!("  Health factor read: {err}"),
        Ok(hf) => println!("  Unexpected: health factor {hf}"),
    }
    match engine.redeem_collateral(ALICE, WETH, Amount::from_whole(1)) {
        Err(err) => println!("  Redeem: {err}"),
        Ok(()) => println!("  Unexpected: redeem went through"),
    }
    println!("  Alice still holds {} WETH in the engine\n", engine.get_collateral_balance_of_user(ALICE, WETH));
    Ok(())
}

/// A failing external transfer leaves no trace in the ledger or event log.
fn scenario_4_atomic_failure() -> Result<(), EngineError> {
    println!("Scenario 4: Atomic Failure\n");

    let Harness { mut engine, dsc, .. } = harness()?;
    engine.deposit_collateral(ALICE, WETH, Amount::from_whole(10))?;
    let events_before = engine.events().len();

    dsc.set_fail_mint(true);
    match engine.mint_dsc(ALICE, Amount::from_whole(1_000)) {
        Err(err) => println!("  Mint with a failing currency: {err}"),
        Ok(()) => println!("  Unexpected: mint went through"),
    }
    println!(
        "  Debt {}, events {} -> {}",
        engine.get_debt_of_user(ALICE),
        events_before,
        engine.events().len()
    );
    Ok(())
}
