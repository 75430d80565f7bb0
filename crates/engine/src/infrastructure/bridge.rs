//! Channel bridge - connects the orchestrator to an external transport.
//!
//! This module provides the `create_connection` function that sets up:
//! - A `ChannelNetwork` the orchestrator sends fetch requests through
//! - An outbound receiver the transport drains and forwards to the backend
//! - An inbound sender the transport pushes backend messages into
//! - A background task feeding inbound messages to the orchestrator

use std::sync::Arc;

use async_trait::async_trait;
use propcache_shared::{EdgeMessage, FetchRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::OrchestratorConfig;
use super::ports::{NetworkError, NetworkPort};
use crate::orchestrator::PropositionOrchestrator;

/// `NetworkPort` backed by a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNetwork {
    sender: mpsc::Sender<FetchRequest>,
}

impl ChannelNetwork {
    pub fn new(sender: mpsc::Sender<FetchRequest>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl NetworkPort for ChannelNetwork {
    async fn send_fetch_request(&self, request: FetchRequest) -> Result<(), NetworkError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| NetworkError::ChannelClosed)
    }
}

/// Feed inbound messages into the orchestrator until the channel closes.
pub fn spawn_inbound_pump(
    orchestrator: PropositionOrchestrator,
    mut inbound: mpsc::Receiver<EdgeMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = inbound.recv().await {
            orchestrator.handle_message(message).await;
        }
        tracing::debug!("Inbound channel closed, stopping pump");
    })
}

/// Result of creating a connection.
///
/// - `orchestrator`: Issue updates and gets
/// - `outbound`: Fetch requests for the transport to send
/// - `inbound`: Where the transport delivers partial results and terminal signals
/// - `pump`: Handle of the inbound task (ends once every `inbound` sender is dropped)
pub struct Connection {
    pub orchestrator: PropositionOrchestrator,
    pub outbound: mpsc::Receiver<FetchRequest>,
    pub inbound: mpsc::Sender<EdgeMessage>,
    pub pump: JoinHandle<()>,
}

/// Build an orchestrator wired to a pair of channels.
///
/// Must be called from within a tokio runtime.
pub fn create_connection(config: OrchestratorConfig) -> Connection {
    let (outbound_tx, outbound_rx) = mpsc::channel::<FetchRequest>(config.channel_capacity);
    let (inbound_tx, inbound_rx) = mpsc::channel::<EdgeMessage>(config.channel_capacity);

    let network: Arc<dyn NetworkPort> = Arc::new(ChannelNetwork::new(outbound_tx));
    let orchestrator = PropositionOrchestrator::new(network, config);
    let pump = spawn_inbound_pump(orchestrator.clone(), inbound_rx);

    Connection {
        orchestrator,
        outbound: outbound_rx,
        inbound: inbound_tx,
        pump,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propcache_shared::{OfferPayload, PropositionPayload};
    use serde_json::json;

    #[tokio::test]
    async fn closed_channel_is_reported() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let network = ChannelNetwork::new(tx);
        let request = FetchRequest {
            request_id: uuid::Uuid::new_v4(),
            decision_scopes: vec!["A".to_string()],
            context: Default::default(),
            send_completion: true,
        };
        assert_eq!(
            network.send_fetch_request(request).await,
            Err(NetworkError::ChannelClosed)
        );
    }

    #[tokio::test]
    async fn connection_round_trip() {
        let Connection {
            orchestrator,
            mut outbound,
            inbound,
            pump,
        } = create_connection(OrchestratorConfig::default());

        let transport = tokio::spawn(async move {
            let request = outbound.recv().await.unwrap();
            let id = request.request_id.to_string();
            let payload = PropositionPayload {
                id: "p1".to_string(),
                scope: "A".to_string(),
                scope_details: None,
                offers: vec![OfferPayload {
                    id: "o1".to_string(),
                    schema: "https://ns.adobe.com/personalization/text-content-item".to_string(),
                    format: Some("text/plain".to_string()),
                    content: json!("hello"),
                    language: None,
                    characteristics: None,
                }],
            };
            inbound
                .send(EdgeMessage::propositions(id.clone(), vec![payload]))
                .await
                .unwrap();
            inbound.send(EdgeMessage::completion(id)).await.unwrap();
        });

        let returned = orchestrator.update(["A"], None, None).await.unwrap();
        assert!(returned.contains(&propcache_domain::DecisionScope::new("A")));

        let found = orchestrator.get(["A"], None).await.unwrap();
        assert_eq!(found.len(), 1);

        transport.await.unwrap();
        // Transport dropped its inbound sender, so the pump finishes
        pump.await.unwrap();
    }
}
