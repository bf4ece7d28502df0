//! Fee ratio exactness: for a configured rate `f`, every recipient's cut
//! satisfies `curve_amount / cut == 100_000 / f` under integer division.

use bondfi_fees::{FeeOperation, FeeRole, FeeSchedule};
use bondfi_types::{AccountId, FeeRates, NftOwnerSplit, BPS_DENOMINATOR};
use proptest::prelude::*;

fn rate() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![200u32, 500, 1_000, 2_000, 5_000, 10_000])
}

fn operation() -> impl Strategy<Value = FeeOperation> {
    prop::sample::select(vec![
        FeeOperation::Buy,
        FeeOperation::Sell,
        FeeOperation::Mortgage,
    ])
}

fn uniform(bps: u32) -> FeeRates {
    FeeRates {
        buy_nft_bps: bps,
        sell_nft_bps: bps,
        mortgage_nft_bps: bps,
        buy_app_owner_bps: bps,
        sell_app_owner_bps: bps,
        mortgage_app_owner_bps: bps,
        mortgage_platform_bps: bps,
    }
}

proptest! {
    #[test]
    fn every_cut_matches_configured_ratio(
        amount in 1_000_000_000_000u128..1_000_000_000_000_000_000_000u128,
        bps in rate(),
        op in operation(),
    ) {
        let owner = AccountId::from_label("owner");
        let platform = AccountId::from_label("platform");
        let nft = NftOwnerSplit::single(AccountId::from_label("nft"));
        let schedule = FeeSchedule::new(op, &uniform(bps), owner, platform, &nft);

        let breakdown = schedule.breakdown(amount).unwrap();
        let expected_ratio = (BPS_DENOMINATOR / bps) as u128;
        for cut in &breakdown.cuts {
            prop_assert_eq!(amount / cut.amount, expected_ratio);
        }

        let expected_recipients = if op == FeeOperation::Mortgage { 3 } else { 2 };
        prop_assert_eq!(breakdown.cuts.len(), expected_recipients);
        prop_assert_eq!(breakdown.total_for_role(FeeRole::Platform) > 0, op == FeeOperation::Mortgage);
    }

    #[test]
    fn settled_amount_moves_in_operation_direction(
        amount in 1u128..1_000_000_000_000_000_000u128,
        op in operation(),
    ) {
        let nft = NftOwnerSplit::new(vec![
            (AccountId::from_label("n1"), 95_000),
            (AccountId::from_label("n2"), 5_000),
        ]).unwrap();
        let schedule = FeeSchedule::new(
            op,
            &FeeRates::default(),
            AccountId::from_label("owner"),
            AccountId::from_label("platform"),
            &nft,
        );
        let breakdown = schedule.breakdown(amount).unwrap();
        let settled = breakdown.settled_amount().unwrap();
        match op {
            FeeOperation::Buy => prop_assert_eq!(settled, amount + breakdown.total_fees()),
            _ => prop_assert_eq!(settled, amount - breakdown.total_fees()),
        }
        prop_assert!(breakdown.cuts.iter().all(|c| c.amount > 0));
    }
}
