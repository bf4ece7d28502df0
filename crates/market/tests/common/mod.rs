#![allow(dead_code)]

use bondfi_market::{AppRegistry, Market};
use bondfi_types::{
    tokens, AccountId, Amount, AppConfig, CallContext, CurveConfig, FeeRates, NftOwnerSplit,
    RailKind, TopicId,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub registry: Arc<AppRegistry>,
    pub market: Market,
    pub topic: TopicId,
    pub owner: AccountId,
    pub platform: AccountId,
    pub nft_major: AccountId,
    pub nft_minor: AccountId,
    pub alice: AccountId,
    pub bob: AccountId,
}

impl Fixture {
    /// Native-rail app on the default floor curve, one topic with a 19:1
    /// NFT owner split.
    pub fn native() -> Self {
        Self::build(FeeRates::default(), CurveConfig::default(), RailKind::Native)
    }

    pub fn fungible() -> Self {
        Self::build(
            FeeRates::default(),
            CurveConfig::default(),
            RailKind::Fungible {
                asset: "usdc".into(),
            },
        )
    }

    pub fn build(fees: FeeRates, curve: CurveConfig, payment: RailKind) -> Self {
        init_tracing();

        let owner = AccountId::from_label("app-owner");
        let platform = AccountId::from_label("platform");
        let nft_major = AccountId::from_label("nft-major");
        let nft_minor = AccountId::from_label("nft-minor");

        let registry = Arc::new(AppRegistry::new());
        registry
            .register_app(AppConfig {
                app_id: 7,
                name: "test-app".into(),
                owner,
                platform_recipient: platform,
                fees,
                curve,
                payment,
            })
            .unwrap();

        let market = Market::new(registry.clone(), 7).unwrap();
        let topic = TopicId::new("rust").unwrap();
        market
            .create_topic(
                &topic,
                NftOwnerSplit::new(vec![(nft_major, 95_000), (nft_minor, 5_000)]).unwrap(),
            )
            .unwrap();
        market.drain_events();

        Self {
            registry,
            market,
            topic,
            owner,
            platform,
            nft_major,
            nft_minor,
            alice: AccountId::from_label("alice"),
            bob: AccountId::from_label("bob"),
        }
    }

    /// Credit `who` and return a call attaching the whole amount.
    pub fn funded_call(&self, who: AccountId, value: Amount) -> CallContext {
        self.market.credit_pay_asset(&who, value).unwrap();
        CallContext::new(who).with_value(value)
    }

    /// Give `who` `whole` tokens of the fixture topic by buying them.
    pub fn buy_tokens(&self, who: AccountId, whole: u128) -> Amount {
        let quote = self.market.quote_buy(&self.topic, tokens(whole)).unwrap();
        let call = self.funded_call(who, quote.settled);
        self.market.buy(&call, &self.topic, tokens(whole)).unwrap()
    }
}
