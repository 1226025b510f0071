//! Integration test: full room lifecycle
//!
//! CREATE → JOIN → START → BID → RESOLVE → COMPLETE
//!
//! Runs on a paused clock, so countdowns and reveal pauses elapse as soon
//! as the test awaits something.

use std::time::Duration;

use gavel_engine::AuctionHouse;
use gavel_types::*;
use rust_decimal::Decimal;
use tokio::sync::broadcast::Receiver;

/// Crore amount with one decimal place, e.g. `cr(105)` is 10.5 Cr.
fn cr(tenths: i64) -> Amount {
    from_crore(Decimal::new(tenths, 1)).unwrap()
}

fn settings(squad_cap: usize) -> RoomSettings {
    RoomSettings {
        squad_cap,
        starting_purse: cr(1000),
        ..RoomSettings::default()
    }
}

fn config(reveal_delay: Duration) -> EngineConfig {
    EngineConfig {
        timer: TimerConfig {
            reveal_delay,
            ..TimerConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn lot(name: &str, category: LotCategory) -> Lot {
    Lot::dummy(name, category, cr(100))
}

/// Wait (on virtual time) for the first event matching `pred`.
async fn next_event(
    rx: &mut Receiver<RoomNotification>,
    pred: impl Fn(&RoomEvent) -> bool,
) -> RoomEvent {
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            let n = rx.recv().await.expect("room channel closed");
            if pred(&n.event) {
                return n.event;
            }
        }
    })
    .await
    .expect("event never arrived")
}

fn is_complete(e: &RoomEvent) -> bool {
    matches!(e, RoomEvent::AuctionComplete { .. })
}

async fn open_room(
    house: &AuctionHouse,
    settings: RoomSettings,
    lots: Vec<Lot>,
) -> (RoomCode, BidderId, BidderId) {
    let a = BidderId::new("alice");
    let b = BidderId::new("bob");
    let (code, _) = house
        .create_room(a.clone(), Some("Team A".into()), Some(settings), lots)
        .await
        .unwrap();
    house
        .join_room(&code, b.clone(), Some("Team B".into()))
        .await
        .unwrap();
    (code, a, b)
}

#[tokio::test(start_paused = true)]
async fn two_bidders_one_lot() {
    // =====================================================================
    // SETUP: two bidders with 100 Cr each, one lot at 10 Cr
    // =====================================================================
    let house = AuctionHouse::new(config(Duration::from_secs(3))).unwrap();
    let (code, a, b) =
        open_room(&house, settings(11), vec![lot("Kohli", LotCategory::Batsman)]).await;
    let mut rx = house.subscribe(&code).await.unwrap();
    house.start_auction(&code).await.unwrap();

    // =====================================================================
    // BID: A opens at base, A cannot outbid themselves, B raises
    // =====================================================================
    house.place_bid(&code, &a, cr(100)).await.unwrap();
    let err = house.place_bid(&code, &a, cr(105)).await.unwrap_err();
    assert!(matches!(err, GavelError::ConsecutiveBidRejected(_)), "{err}");
    let ack = house.place_bid(&code, &b, cr(105)).await.unwrap();
    assert_eq!(ack.bid_seq, 1);

    let room = house.query_room(&code).await.unwrap();
    assert_eq!(room.current_bid_amount, cr(105));
    assert_eq!(room.current_bid_owner, Some(b.clone()));

    // =====================================================================
    // EXPIRE: countdown runs out, lot goes to B, auction completes
    // =====================================================================
    let resolved = next_event(&mut rx, |e| matches!(e, RoomEvent::LotResolved { .. })).await;
    let RoomEvent::LotResolved { record } = resolved else {
        unreachable!()
    };
    assert_eq!(record.winner, Some(b.clone()));
    assert_eq!(record.final_price, cr(105));
    assert_eq!(record.cause, ResolutionCause::TimerExpired);

    let RoomEvent::AuctionComplete {
        statistics,
        ended_early,
        ..
    } = next_event(&mut rx, is_complete).await
    else {
        unreachable!()
    };
    assert!(!ended_early);
    assert_eq!(statistics.total_spent, cr(105));
    assert_eq!(statistics.total_players_sold, 1);
    assert_eq!(statistics.average_price, Decimal::from(cr(105)));

    let teams = house.query_team_state(&code).await.unwrap();
    let team_b = teams.iter().find(|t| t.bidder_id == b).unwrap();
    assert_eq!(team_b.purse_remaining, cr(895));
    assert_eq!(team_b.roster.len(), 1);
    let team_a = teams.iter().find(|t| t.bidder_id == a).unwrap();
    assert_eq!(team_a.purse_remaining, cr(1000));

    // =====================================================================
    // TERMINAL: only reads remain valid
    // =====================================================================
    assert!(matches!(
        house.place_bid(&code, &a, cr(110)).await,
        Err(GavelError::NoActiveLot)
    ));
    assert!(matches!(
        house.start_auction(&code).await,
        Err(GavelError::InvalidState { .. })
    ));
    assert!(matches!(
        house.join_room(&code, BidderId::new("late"), None).await,
        Err(GavelError::InvalidState { .. })
    ));
    assert_eq!(house.query_bid_log(&code).await.unwrap().len(), 2);

    let snapshot = serde_json::to_value(house.query_room(&code).await.unwrap()).unwrap();
    assert_eq!(snapshot["phase"], "complete");
    assert!(snapshot["current_lot"].is_null());
}

#[tokio::test(start_paused = true)]
async fn off_grid_increment_rejected_for_everyone() {
    let house = AuctionHouse::new(config(Duration::ZERO)).unwrap();
    let (code, a, b) = open_room(
        &house,
        settings(1),
        vec![lot("X", LotCategory::Bowler), lot("Y", LotCategory::Bowler)],
    )
    .await;
    house.start_auction(&code).await.unwrap();

    // +0.3 Cr from an eligible bidder, an unknown bidder, and (below) a
    // bidder whose squad is full.
    for bidder in [&a, &BidderId::new("ghost")] {
        let err = house.place_bid(&code, bidder, cr(103)).await.unwrap_err();
        assert!(matches!(err, GavelError::InvalidIncrement { .. }), "{err}");
    }

    house.place_bid(&code, &a, cr(100)).await.unwrap();
    house.resolve_lot(&code).await.unwrap();
    let err = house.place_bid(&code, &a, cr(103)).await.unwrap_err();
    assert!(matches!(err, GavelError::InvalidIncrement { .. }), "{err}");
    house.place_bid(&code, &b, cr(103) + cr(2)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn full_squad_cannot_bid() {
    let house = AuctionHouse::new(config(Duration::ZERO)).unwrap();
    let (code, a, b) = open_room(
        &house,
        settings(1),
        vec![lot("X", LotCategory::Bowler), lot("Y", LotCategory::Batsman)],
    )
    .await;
    house.start_auction(&code).await.unwrap();
    house.place_bid(&code, &a, cr(100)).await.unwrap();
    let sold = house.resolve_lot(&code).await.unwrap();
    assert_eq!(sold.winner, Some(a.clone()));

    // A has 90 Cr left but no squad room.
    let err = house.place_bid(&code, &a, cr(100)).await.unwrap_err();
    assert!(matches!(err, GavelError::SquadFull { cap: 1 }), "{err}");
    let teams = house.query_team_state(&code).await.unwrap();
    assert!(!teams.iter().find(|t| t.bidder_id == a).unwrap().eligible);

    house.place_bid(&code, &b, cr(100)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn end_early_discards_the_rest() {
    let house = AuctionHouse::new(config(Duration::from_secs(3))).unwrap();
    let (code, a, _) = open_room(
        &house,
        settings(11),
        vec![
            lot("X", LotCategory::Batsman),
            lot("Y", LotCategory::Bowler),
            lot("Z", LotCategory::AllRounder),
        ],
    )
    .await;
    house.start_auction(&code).await.unwrap();
    house.place_bid(&code, &a, cr(110)).await.unwrap();
    let mut rx = house.subscribe(&code).await.unwrap();

    let report = house.end_early(&code).await.unwrap();
    assert!(report.ended_early);
    assert_eq!(report.statistics.total_unsold, 3);
    assert_eq!(report.statistics.total_players_sold, 0);
    assert!(report.teams.iter().all(|t| t.total_spent == 0));

    next_event(&mut rx, is_complete).await;

    // No countdown survives: a minute of virtual time produces nothing.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err());
    assert!(matches!(
        house.end_early(&code).await,
        Err(GavelError::InvalidState { .. })
    ));
    assert!(matches!(
        house.skip_lot(&code).await,
        Err(GavelError::InvalidState { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn reveal_pause_then_next_lot() {
    let house = AuctionHouse::new(config(Duration::from_secs(3))).unwrap();
    let (code, a, b) = open_room(
        &house,
        settings(11),
        vec![lot("X", LotCategory::Batsman), lot("Y", LotCategory::Bowler)],
    )
    .await;
    let mut rx = house.subscribe(&code).await.unwrap();
    house.start_auction(&code).await.unwrap();
    house.skip_lot(&code).await.unwrap();

    let room = house.query_room(&code).await.unwrap();
    assert_eq!(room.phase, RoomPhase::Revealing);
    assert!(matches!(
        house.place_bid(&code, &a, cr(100)).await,
        Err(GavelError::NoActiveLot)
    ));

    let started = tokio::time::Instant::now();
    let RoomEvent::NextLot { lot, base_price } =
        next_event(&mut rx, |e| matches!(e, RoomEvent::NextLot { .. })).await
    else {
        unreachable!()
    };
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(3) && waited < Duration::from_millis(3100));
    assert_eq!(lot.name, "Y");
    assert_eq!(base_price, cr(100));
    house.place_bid(&code, &b, cr(100)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn event_order_for_a_category_auction() {
    let order = AuctionOrder::Categories {
        sequence: vec![LotCategory::Bowler, LotCategory::Batsman],
        shuffle_seed: None,
    };
    let house = AuctionHouse::new(config(Duration::ZERO)).unwrap();
    let (code, a, _) = open_room(
        &house,
        RoomSettings {
            auction_order: order,
            ..settings(11)
        },
        vec![
            lot("Bat1", LotCategory::Batsman),
            lot("Bowl1", LotCategory::Bowler),
            lot("Bowl2", LotCategory::Bowler),
        ],
    )
    .await;
    let mut rx = house.subscribe(&code).await.unwrap();
    let first = house.start_auction(&code).await.unwrap();
    assert_eq!(first.lot.name, "Bowl1");
    house.place_bid(&code, &a, cr(100)).await.unwrap();
    house.resolve_lot(&code).await.unwrap();
    house.skip_lot(&code).await.unwrap();
    house.skip_lot(&code).await.unwrap();

    let mut names = Vec::new();
    while let Ok(n) = rx.try_recv() {
        if !matches!(n.event, RoomEvent::Tick { .. }) {
            names.push(n.event.name());
        }
    }
    assert_eq!(
        names,
        [
            "batch_started",
            "auction_started",
            "bid_updated",
            "lot_resolved",
            "team_state_updated",
            "next_lot",
            "lot_resolved",
            "team_state_updated",
            "batch_started",
            "next_lot",
            "lot_resolved",
            "team_state_updated",
            "auction_complete",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn skip_batch_jumps_to_the_next_category() {
    // =====================================================================
    // SETUP: bowlers first, then batsmen, then all-rounders
    // =====================================================================
    let order = AuctionOrder::Categories {
        sequence: vec![LotCategory::Bowler, LotCategory::Batsman, LotCategory::AllRounder],
        shuffle_seed: None,
    };
    let house = AuctionHouse::new(config(Duration::ZERO)).unwrap();
    let (code, a, b) = open_room(
        &house,
        RoomSettings {
            auction_order: order,
            ..settings(11)
        },
        vec![
            lot("Bat1", LotCategory::Batsman),
            lot("Bowl1", LotCategory::Bowler),
            lot("Bowl2", LotCategory::Bowler),
            lot("Bowl3", LotCategory::Bowler),
            lot("AR1", LotCategory::AllRounder),
        ],
    )
    .await;
    assert!(matches!(
        house.skip_batch(&code).await,
        Err(GavelError::NoActiveLot)
    ));
    let mut rx = house.subscribe(&code).await.unwrap();
    house.start_auction(&code).await.unwrap();

    // =====================================================================
    // SKIP: the whole bowler batch goes unsold, floor owner included
    // =====================================================================
    house.place_bid(&code, &a, cr(100)).await.unwrap();
    let skipped = house.skip_batch(&code).await.unwrap();
    let names: Vec<_> = skipped.iter().map(|r| r.lot.name.as_str()).collect();
    assert_eq!(names, ["Bowl1", "Bowl2", "Bowl3"]);
    assert!(skipped.iter().all(|r| r.cause == ResolutionCause::BatchSkipped));

    let room = house.query_room(&code).await.unwrap();
    assert_eq!(room.current_lot.as_ref().unwrap().name, "Bat1");
    assert_eq!(room.current_bid_owner, None);
    assert_eq!(room.lots_resolved, 3);
    let teams = house.query_team_state(&code).await.unwrap();
    assert!(teams.iter().all(|t| t.total_spent == 0 && t.roster.is_empty()));

    // =====================================================================
    // NEXT BATCH: bidding resumes on the batsmen
    // =====================================================================
    house.place_bid(&code, &b, cr(100)).await.unwrap();
    house.resolve_lot(&code).await.unwrap();
    house.skip_batch(&code).await.unwrap();

    let mut names = Vec::new();
    while let Ok(n) = rx.try_recv() {
        if !matches!(n.event, RoomEvent::Tick { .. }) {
            names.push(n.event.name());
        }
    }
    assert_eq!(
        names,
        [
            "batch_started",
            "auction_started",
            "bid_updated",
            "batch_skipped",
            "batch_started",
            "next_lot",
            "bid_updated",
            "lot_resolved",
            "team_state_updated",
            "batch_started",
            "next_lot",
            "batch_skipped",
            "auction_complete",
        ]
    );

    let report = house.query_report(&code).await.unwrap();
    assert_eq!(report.statistics.total_players_sold, 1);
    assert_eq!(report.statistics.total_unsold, 4);
    assert_eq!(report.resolved_lots[3].winner, Some(b));
}

#[tokio::test(start_paused = true)]
async fn auction_closes_once_nobody_can_bid() {
    let house = AuctionHouse::new(config(Duration::from_secs(3))).unwrap();
    let a = BidderId::new("alice");
    let lots = (0..5).map(|i| lot(&format!("P{i}"), LotCategory::Bowler)).collect();
    let (code, _) = house
        .create_room(a.clone(), None, Some(settings(1)), lots)
        .await
        .unwrap();
    let mut rx = house.subscribe(&code).await.unwrap();
    house.start_auction(&code).await.unwrap();
    house.place_bid(&code, &a, cr(100)).await.unwrap();

    // The only bidder's squad is now full: no countdown runs for the rest.
    let started = tokio::time::Instant::now();
    house.resolve_lot(&code).await.unwrap();
    let RoomEvent::AuctionComplete {
        resolved_lots,
        statistics,
        ended_early,
    } = next_event(&mut rx, is_complete).await
    else {
        unreachable!()
    };
    assert!(started.elapsed() < Duration::from_secs(1), "no countdown was waited out");
    assert!(!ended_early);
    assert_eq!(resolved_lots.len(), 5);
    assert!(
        resolved_lots[1..]
            .iter()
            .all(|r| r.cause == ResolutionCause::NoEligibleBidders && !r.is_sold())
    );
    assert_eq!(statistics.total_players_sold, 1);
    assert_eq!(statistics.remaining, 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err(), "nothing fires after completion");
    assert_eq!(house.query_room(&code).await.unwrap().phase, RoomPhase::Complete);
}

#[tokio::test(start_paused = true)]
async fn settings_lifecycle() {
    let house = AuctionHouse::new(config(Duration::ZERO)).unwrap();
    let (code, a, b) = open_room(&house, settings(11), vec![lot("X", LotCategory::Batsman)]).await;

    let patch = SettingsPatch {
        starting_purse: Some(cr(500)),
        ..SettingsPatch::default()
    };
    assert!(matches!(
        house.update_settings(&code, &b, &patch).await,
        Err(GavelError::Forbidden { .. })
    ));
    let updated = house.update_settings(&code, &a, &patch).await.unwrap();
    assert_eq!(updated.starting_purse, cr(500));
    let teams = house.query_team_state(&code).await.unwrap();
    assert!(teams.iter().all(|t| t.purse_remaining == cr(500)));

    house.start_auction(&code).await.unwrap();
    assert!(matches!(
        house.update_settings(&code, &a, &patch).await,
        Err(GavelError::InvalidState { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn purse_conservation_across_an_auction() {
    // =====================================================================
    // SETUP: four bidders, eight lots, explicit sells and timer expiries
    // =====================================================================
    let house = AuctionHouse::new(config(Duration::from_secs(1))).unwrap();
    let lots = (0..8)
        .map(|i| lot(&format!("P{i}"), LotCategory::ALL[i % 4]))
        .collect();
    let (code, a, b) = open_room(&house, settings(3), lots).await;
    let c = BidderId::new("carol");
    let d = BidderId::new("dave");
    house.join_room(&code, c.clone(), None).await.unwrap();
    house.join_room(&code, d.clone(), None).await.unwrap();
    let bidders = [a, b, c, d];

    let mut rx = house.subscribe(&code).await.unwrap();
    house.start_auction(&code).await.unwrap();

    // =====================================================================
    // RUN: each lot gets a short bidding war, then is sold or expires
    // =====================================================================
    for round in 0..8usize {
        let mut amount = house.query_room(&code).await.unwrap().current_bid_amount;
        for step in 0..=(round % 3) {
            let bidder = &bidders[(round + step) % 4];
            if step > 0 {
                amount += cr(5);
            }
            // Full squads are expected to reject; conservation must hold anyway.
            let _ = house.place_bid(&code, bidder, amount).await;
        }
        if round % 2 == 0 {
            house.resolve_lot(&code).await.unwrap();
        }
        next_event(&mut rx, |e| {
            matches!(e, RoomEvent::NextLot { .. } | RoomEvent::AuctionComplete { .. })
        })
        .await;

        // =================================================================
        // INVARIANT: money paid for sold lots == money gone from purses
        // =================================================================
        let stats = house.query_statistics(&code).await.unwrap();
        let teams = house.query_team_state(&code).await.unwrap();
        let spent: Amount = teams.iter().map(|t| t.purse_original - t.purse_remaining).sum();
        assert_eq!(stats.total_spent, spent, "round {round}");
        let rostered: usize = teams.iter().map(|t| t.roster.len()).sum();
        assert_eq!(stats.total_players_sold, rostered, "round {round}");
    }

    let room = house.query_room(&code).await.unwrap();
    assert_eq!(room.phase, RoomPhase::Complete);
    assert_eq!(room.lots_resolved, 8);
    let report = house.query_report(&code).await.unwrap();
    assert_eq!(
        report.statistics.total_players_sold + report.statistics.total_unsold,
        8
    );
}
