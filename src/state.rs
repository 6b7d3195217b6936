use crate::cards::{CardSource, ScryfallClient};
use crate::config::AppConfig;
use crate::store::{MemoryStore, PgStore, Store};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cards: Arc<dyn CardSource>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.database_url.as_deref() {
            Some(url) => Arc::new(PgStore::connect(url).await?) as Arc<dyn Store>,
            None => {
                warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        let cards = Arc::new(ScryfallClient::new(&config.scryfall)?) as Arc<dyn CardSource>;

        Ok(Self::from_parts(store, cards, config))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        cards: Arc<dyn CardSource>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            cards,
            config,
        }
    }

    /// Fresh in-memory store plus a fixed card catalogue; no network.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::cards::{filter, Card, CardError, CardList, SearchFilter};
        use async_trait::async_trait;
        use uuid::Uuid;

        struct FakeCards(Vec<Card>);

        #[async_trait]
        impl CardSource for FakeCards {
            async fn search(&self, term: &str, f: SearchFilter) -> Result<CardList, CardError> {
                let all = CardList {
                    data: self.0.clone(),
                    has_more: false,
                    total_cards: self.0.len() as u64,
                };
                Ok(filter::retain_matches(all, term, f))
            }
            async fn random(&self, ability: Option<&str>) -> Result<CardList, CardError> {
                let pick = self.0.iter().find(|c| match ability {
                    Some(a) => filter::matches(c, a, SearchFilter::Ability),
                    None => true,
                });
                Ok(pick.cloned().map(CardList::single).unwrap_or_else(CardList::empty))
            }
            async fn get(&self, id: Uuid) -> Result<Option<Card>, CardError> {
                Ok(self.0.iter().find(|c| c.id == id).cloned())
            }
        }

        let card = |id: &str, name: &str, oracle: &str| -> Card {
            serde_json::from_value(serde_json::json!({
                "id": id,
                "name": name,
                "oracle_text": oracle,
            }))
            .expect("static card")
        };
        let catalogue = vec![
            card(
                "e3285e6b-3e79-4d7c-bf96-d920f973b122",
                "Lightning Bolt",
                "Lightning Bolt deals 3 damage to any target.",
            ),
            card(
                "0c2b5b4c-1a6a-4c2e-8b3f-5b1a2f0f7d10",
                "Serra Angel",
                "Flying, vigilance",
            ),
            card(
                "7c0e5f3a-9d1b-4c8e-a2f4-3b6d8e1f0a25",
                "Counterspell",
                "Counter target spell.",
            ),
            card(
                "4f1a2b3c-5d6e-4f70-8a9b-0c1d2e3f4a5b",
                "Llanowar Elves",
                "{T}: Add {G}.",
            ),
        ];

        Self::from_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(FakeCards(catalogue)),
            Arc::new(AppConfig {
                database_url: None,
                scryfall: Default::default(),
                host: "127.0.0.1".into(),
                port: 0,
            }),
        )
    }
}
