//! App repository
//!
//! Holds every registered app's configuration and the topics opened under it,
//! with the NFT owner split each topic pays fees to. Markets keep an
//! `Arc<AppRegistry>` and read it on every call, so fee rates and recipients
//! changed here apply to the next operation.

use crate::errors::*;
use bondfi_types::{AppConfig, AppId, NftOwnerSplit, TopicId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Registration of one topic under an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub app_id: AppId,
    pub topic: TopicId,
    pub nft_owners: NftOwnerSplit,
}

#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<HashMap<AppId, AppConfig>>,
    /// App → topic → registration
    topics: RwLock<HashMap<AppId, BTreeMap<TopicId, TopicConfig>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store an app configuration.
    pub fn register_app(&self, config: AppConfig) -> Result<()> {
        config.validate()?;

        let mut apps = self.apps.write();
        if apps.contains_key(&config.app_id) {
            return Err(MarketError::AppAlreadyRegistered(config.app_id));
        }
        info!(target: "market", "Registered app {} ({})", config.app_id, config.name);
        apps.insert(config.app_id, config);
        Ok(())
    }

    /// Replace an app's name, recipients and fee rates. Curve and payment
    /// rail are fixed at registration.
    pub fn update_app(&self, config: AppConfig) -> Result<()> {
        config.validate()?;

        let mut apps = self.apps.write();
        let existing = apps
            .get_mut(&config.app_id)
            .ok_or(MarketError::AppNotFound(config.app_id))?;
        if existing.curve != config.curve {
            return Err(MarketError::ImmutableAppField {
                app_id: config.app_id,
                field: "curve",
            });
        }
        if existing.payment != config.payment {
            return Err(MarketError::ImmutableAppField {
                app_id: config.app_id,
                field: "payment",
            });
        }
        info!(target: "market", "Updated app {} ({})", config.app_id, config.name);
        *existing = config;
        Ok(())
    }

    pub fn register_topic(
        &self,
        app_id: AppId,
        topic: TopicId,
        nft_owners: NftOwnerSplit,
    ) -> Result<()> {
        if !self.apps.read().contains_key(&app_id) {
            return Err(MarketError::AppNotFound(app_id));
        }
        nft_owners.validate()?;

        let mut topics = self.topics.write();
        let app_topics = topics.entry(app_id).or_default();
        if app_topics.contains_key(&topic) {
            return Err(MarketError::TopicAlreadyExists(topic));
        }
        info!(
            target: "market",
            "Registered topic {} for app {} ({} NFT owners)",
            topic,
            app_id,
            nft_owners.owners.len()
        );
        app_topics.insert(
            topic.clone(),
            TopicConfig {
                app_id,
                topic,
                nft_owners,
            },
        );
        Ok(())
    }

    /// Point a topic's NFT fees at a new owner split.
    pub fn set_nft_owners(
        &self,
        app_id: AppId,
        topic: &TopicId,
        nft_owners: NftOwnerSplit,
    ) -> Result<()> {
        nft_owners.validate()?;

        let mut topics = self.topics.write();
        let entry = topics
            .get_mut(&app_id)
            .and_then(|app_topics| app_topics.get_mut(topic))
            .ok_or_else(|| MarketError::UnknownTopic(topic.clone()))?;
        entry.nft_owners = nft_owners;
        Ok(())
    }

    pub fn app(&self, app_id: AppId) -> Option<AppConfig> {
        self.apps.read().get(&app_id).cloned()
    }

    pub fn topic(&self, app_id: AppId, topic: &TopicId) -> Option<TopicConfig> {
        self.topics
            .read()
            .get(&app_id)
            .and_then(|app_topics| app_topics.get(topic))
            .cloned()
    }

    /// Topics registered under an app, in key order.
    pub fn topics_of(&self, app_id: AppId) -> Vec<TopicId> {
        self.topics
            .read()
            .get(&app_id)
            .map(|app_topics| app_topics.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bondfi_types::{AccountId, AppConfigError, CurveConfig, RailKind};

    fn topic(name: &str) -> TopicId {
        TopicId::new(name).unwrap()
    }

    #[test]
    fn test_register_app_and_topics() {
        let registry = AppRegistry::new();
        registry.register_app(AppConfig::default()).unwrap();

        let nft = NftOwnerSplit::single(AccountId::from_label("nft"));
        registry.register_topic(1, topic("b"), nft.clone()).unwrap();
        registry.register_topic(1, topic("a"), nft.clone()).unwrap();

        assert_eq!(registry.topics_of(1), vec![topic("a"), topic("b")]);
        assert_eq!(registry.topic(1, &topic("a")).unwrap().nft_owners, nft);
        assert!(registry.topic(2, &topic("a")).is_none());
        assert_eq!(
            registry.register_topic(1, topic("a"), nft),
            Err(MarketError::TopicAlreadyExists(topic("a")))
        );
    }

    #[test]
    fn test_duplicate_and_missing_apps() {
        let registry = AppRegistry::new();
        registry.register_app(AppConfig::default()).unwrap();
        assert_eq!(
            registry.register_app(AppConfig::default()),
            Err(MarketError::AppAlreadyRegistered(1))
        );

        let nft = NftOwnerSplit::single(AccountId::from_label("nft"));
        assert_eq!(
            registry.register_topic(9, topic("a"), nft),
            Err(MarketError::AppNotFound(9))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = AppRegistry::new();
        let config = AppConfig {
            name: " ".into(),
            ..AppConfig::default()
        };
        assert_eq!(
            registry.register_app(config),
            Err(MarketError::InvalidConfig(AppConfigError::EmptyName))
        );
    }

    #[test]
    fn test_nft_split_must_cover_whole_pool() {
        let registry = AppRegistry::new();
        registry.register_app(AppConfig::default()).unwrap();
        let split = NftOwnerSplit {
            owners: vec![bondfi_types::NftOwnerShare {
                owner: AccountId::from_label("nft"),
                percent_bps: 50_000,
            }],
        };
        assert!(matches!(
            registry.register_topic(1, topic("a"), split),
            Err(MarketError::InvalidNftSplit(_))
        ));
    }

    #[test]
    fn test_update_app_keeps_curve_and_rail() {
        let registry = AppRegistry::new();
        registry.register_app(AppConfig::default()).unwrap();

        let mut fees = AppConfig::default();
        fees.fees.buy_nft_bps = 2_000;
        fees.owner = AccountId::from_label("new-owner");
        registry.update_app(fees.clone()).unwrap();
        assert_eq!(registry.app(1).unwrap(), fees);

        let mut curve = fees.clone();
        curve.curve = CurveConfig::ConstantProduct {
            virtual_token_reserve: 1_000_000,
            virtual_pay_reserve: 3_000_000,
        };
        assert_eq!(
            registry.update_app(curve),
            Err(MarketError::ImmutableAppField {
                app_id: 1,
                field: "curve"
            })
        );

        let mut rail = fees.clone();
        rail.payment = RailKind::Fungible {
            asset: "usdc".into(),
        };
        assert_eq!(
            registry.update_app(rail),
            Err(MarketError::ImmutableAppField {
                app_id: 1,
                field: "payment"
            })
        );
        assert_eq!(registry.app(1).unwrap(), fees);

        let missing = AppConfig {
            app_id: 9,
            ..AppConfig::default()
        };
        assert_eq!(registry.update_app(missing), Err(MarketError::AppNotFound(9)));
    }

    #[test]
    fn test_update_nft_owners() {
        let registry = AppRegistry::new();
        registry.register_app(AppConfig::default()).unwrap();
        registry
            .register_topic(1, topic("a"), NftOwnerSplit::single(AccountId::from_label("x")))
            .unwrap();

        let next = NftOwnerSplit::single(AccountId::from_label("y"));
        registry.set_nft_owners(1, &topic("a"), next.clone()).unwrap();
        assert_eq!(registry.topic(1, &topic("a")).unwrap().nft_owners, next);
        assert!(registry
            .set_nft_owners(1, &topic("zzz"), next)
            .is_err());
    }
}
