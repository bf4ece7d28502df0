//! Environment overrides live in their own test binary so no other test
//! observes the variables.

use bondfi_market::config::load_app_config;
use bondfi_types::CurveConfig;
use std::path::PathBuf;

#[test]
fn test_environment_overrides_file_values() {
    std::env::set_var("BONDFI_NAME", "from-env");
    std::env::set_var("BONDFI_FEES__SELL_NFT_BPS", "750");
    std::env::set_var("BONDFI_CURVE__ASYMPTOTE", "42000000000000");

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/app.example.toml");
    let app = load_app_config(&path).unwrap();

    assert_eq!(app.name, "from-env");
    assert_eq!(app.fees.sell_nft_bps, 750);
    assert_eq!(app.fees.buy_nft_bps, 1_000);
    assert_eq!(
        app.curve,
        CurveConfig::Floor {
            numerator: 10u128.pow(36),
            asymptote: 42_000_000_000_000,
        }
    );
}
