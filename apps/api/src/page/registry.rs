use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info};

use crate::page::agent::{PageAgent, PageEnvelope, PageServices};
use crate::page::document::PageDocument;
use crate::protocol::{DeliveryError, PageBridge, PageCommand, PageReply};
use crate::tracking::table::TabId;

/// Live injected contexts, one per tab.
#[derive(Clone)]
pub struct PageRegistry {
    agents: Arc<RwLock<HashMap<TabId, mpsc::Sender<PageEnvelope>>>>,
    services: Arc<PageServices>,
}

impl PageRegistry {
    pub fn new(services: PageServices) -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
            services: Arc::new(services),
        }
    }

    /// Loads `document` into the tab: the running agent takes it over, or a new
    /// agent is started if the tab had none.
    pub async fn open(&self, tab_id: TabId, document: PageDocument) {
        let existing = self.agents.read().await.get(&tab_id).cloned();
        let document = match existing {
            Some(tx) => {
                let (reply, _rx) = oneshot::channel();
                let command = PageCommand::Reload {
                    document: Box::new(document),
                };
                match tx.send(PageEnvelope { command, reply }).await {
                    Ok(()) => {
                        debug!("Tab {tab_id} reloaded");
                        return;
                    }
                    Err(mpsc::error::SendError(envelope)) => match envelope.command {
                        PageCommand::Reload { document } => *document,
                        _ => return,
                    },
                }
            }
            None => document,
        };

        info!("Injecting page agent into tab {tab_id} ({})", document.url);
        let tx = PageAgent::spawn(tab_id, document, self.services.clone());
        self.agents.write().await.insert(tab_id, tx);
    }

    /// Drops the tab's agent. Returns false if the tab had none.
    pub async fn close(&self, tab_id: TabId) -> bool {
        let removed = self.agents.write().await.remove(&tab_id).is_some();
        if removed {
            debug!("Page agent for tab {tab_id} removed");
        }
        removed
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }
}

#[async_trait]
impl PageBridge for PageRegistry {
    async fn deliver(&self, tab_id: TabId, command: PageCommand) -> Result<PageReply, DeliveryError> {
        let tx = self
            .agents
            .read()
            .await
            .get(&tab_id)
            .cloned()
            .ok_or(DeliveryError::TabGone(tab_id))?;

        let (reply, rx) = oneshot::channel();
        if tx.send(PageEnvelope { command, reply }).await.is_err() {
            self.agents.write().await.remove(&tab_id);
            return Err(DeliveryError::TabGone(tab_id));
        }
        rx.await.map_err(|_| DeliveryError::TabGone(tab_id))
    }
}
