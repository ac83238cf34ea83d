//! Ledger node
//!
//! The single owned engine instance. Chain and pool live behind one
//! `RwLock`: lookups and snapshots share the read side, and every mutation
//! (local mining, accepted peer block, consensus replacement) takes the
//! write side, so mutations never interleave.

use crate::core::{
    get_address_data, get_block, get_transaction, AddressData, Block, Blockchain,
    BlockchainError, ChainSnapshot, NewTransaction, Transaction, MINING_REWARD, REWARD_SENDER,
};
use crate::core::transaction::new_transaction_id;
use crate::mining::{MiningError, MiningSignal, MiningStats, DEFAULT_DIFFICULTY};
use crate::network::consensus::{ConsensusReport, ConsensusResolver};
use crate::network::message::Message;
use crate::network::peer::{fan_out, BroadcastReport, PeerClient, PeerRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Port for the HTTP API
    pub api_port: u16,
    /// Port for the peer protocol
    pub p2p_port: u16,
    /// Host peers use to reach this node
    pub host: String,
    /// Peer endpoints (`host:p2p_port`)
    pub peers: Vec<String>,
    /// Leading zero hex characters required of a block hash
    pub difficulty: u32,
    /// Address credited with mining rewards
    pub node_address: String,
    /// Deadline for each outbound peer call
    pub peer_timeout: Duration,
}

impl NodeConfig {
    /// Endpoint peers use to reach this node
    pub fn p2p_endpoint(&self) -> String {
        format!("{}:{}", self.host, self.p2p_port)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: 3000,
            p2p_port: 8333,
            host: "127.0.0.1".to_string(),
            peers: Vec::new(),
            difficulty: DEFAULT_DIFFICULTY,
            node_address: new_transaction_id(),
            peer_timeout: Duration::from_secs(5),
        }
    }
}

/// Node-level errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
    #[error(transparent)]
    Mining(#[from] MiningError),
}

/// Outcome of relaying a transaction
#[derive(Debug, Clone, Serialize)]
pub struct TransactionBroadcast {
    pub transaction: Transaction,
    /// Block the transaction is expected to land in locally
    pub block_index: u64,
    pub broadcast: BroadcastReport,
}

/// A block mined by this node
#[derive(Debug, Clone, Serialize)]
pub struct MinedBlock {
    pub block: Block,
    pub stats: MiningStats,
    pub broadcast: BroadcastReport,
}

/// A transaction with the block that contains it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub block: Block,
}

/// Everything a client sees about this node's state
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    #[serde(flatten)]
    pub snapshot: ChainSnapshot,
    pub difficulty: u32,
    pub node_address: String,
    pub endpoint: String,
    pub peers: Vec<String>,
}

/// The ledger node
pub struct Node {
    pub config: NodeConfig,
    blockchain: Arc<RwLock<Blockchain>>,
    registry: Arc<PeerRegistry>,
    client: Arc<dyn PeerClient>,
    consensus: ConsensusResolver,
    /// Fires when the chain moves under an in-flight search
    mining: MiningSignal,
}

impl Node {
    /// Create a node with a fresh genesis-only chain
    pub fn new(config: NodeConfig, client: Arc<dyn PeerClient>) -> Self {
        let blockchain = Arc::new(RwLock::new(Blockchain::with_difficulty(config.difficulty)));
        let registry = Arc::new(PeerRegistry::with_peers(
            &config.p2p_endpoint(),
            &config.peers,
        ));
        let consensus = ConsensusResolver::new(
            registry.clone(),
            client.clone(),
            config.peer_timeout,
        );

        Self {
            config,
            blockchain,
            registry,
            client,
            consensus,
            mining: MiningSignal::new(),
        }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Queue a transaction locally, without relaying it
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<u64, NodeError> {
        let mut chain = self.blockchain.write().await;
        Ok(chain.submit_transaction(tx)?)
    }

    /// Create a transaction from a client request, queue it, and relay it
    /// to every peer
    pub async fn broadcast_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<TransactionBroadcast, NodeError> {
        let tx = request.into_transaction().map_err(BlockchainError::from)?;
        self.relay_transaction(tx).await
    }

    async fn relay_transaction(&self, tx: Transaction) -> Result<TransactionBroadcast, NodeError> {
        let block_index = self.submit_transaction(tx.clone()).await?;

        let client = &self.client;
        let results = fan_out(self.registry.enumerate(), self.config.peer_timeout, |peer| {
            let tx = tx.clone();
            async move { client.send_transaction(&peer, tx).await }
        })
        .await;

        Ok(TransactionBroadcast {
            transaction: tx,
            block_index,
            broadcast: BroadcastReport::from_results("transaction", results),
        })
    }

    /// Mine the pending pool into a new block, append it, and announce it.
    ///
    /// The search runs off the async executor and is abandoned if a peer
    /// block or consensus replacement moves the tip first.
    pub async fn mine_block(&self) -> Result<MinedBlock, NodeError> {
        let (pow, previous_hash, index, transactions, cancel) = {
            let chain = self.blockchain.read().await;
            let latest = chain.latest_block();
            let cancel = self.mining.current();
            (
                chain.pow(),
                latest.hash.clone(),
                latest.index + 1,
                chain.pending().drain(),
                cancel,
            )
        };

        let solution = pow
            .mine_detached(previous_hash.clone(), transactions.clone(), index, cancel)
            .await?;

        let block = {
            let mut chain = self.blockchain.write().await;
            if chain.latest_block().hash != previous_hash {
                return Err(MiningError::Stale(previous_hash).into());
            }
            chain.create_block(solution.nonce, previous_hash, solution.hash, transactions)
        };

        let client = &self.client;
        let results = fan_out(self.registry.enumerate(), self.config.peer_timeout, |peer| {
            let block = block.clone();
            async move { client.send_block(&peer, block).await }
        })
        .await;

        Ok(MinedBlock {
            block,
            stats: solution.stats,
            broadcast: BroadcastReport::from_results("block", results),
        })
    }

    /// Mine a block, then queue and relay this node's reward for it.
    /// The reward lands in the following block.
    pub async fn mine_and_reward(&self) -> Result<(MinedBlock, TransactionBroadcast), NodeError> {
        let mined = self.mine_block().await?;
        let reward = self
            .broadcast_transaction(NewTransaction {
                amount: MINING_REWARD,
                sender: REWARD_SENDER.to_string(),
                recipient: self.config.node_address.clone(),
            })
            .await?;
        Ok((mined, reward))
    }

    /// Accept a block announced by a peer
    pub async fn accept_block(&self, block: Block) -> Result<(), NodeError> {
        let index = block.index;
        let mut chain = self.blockchain.write().await;

        match chain.accept_block(block) {
            Ok(()) => {
                log::info!("New block {} received and accepted", index);
                self.mining.cancel_all();
                Ok(())
            }
            Err(e) => {
                log::warn!("New block {} rejected: {}", index, e);
                Err(e.into())
            }
        }
    }

    /// Run one consensus round against every peer
    pub async fn run_consensus(&self) -> ConsensusReport {
        self.consensus
            .run(&self.blockchain, || self.mining.cancel_all())
            .await
    }

    /// Consistent copy of chain and pending pool
    pub async fn chain_snapshot(&self) -> ChainSnapshot {
        self.blockchain.read().await.snapshot()
    }

    pub async fn node_snapshot(&self) -> NodeSnapshot {
        let chain = self.blockchain.read().await;
        NodeSnapshot {
            snapshot: chain.snapshot(),
            difficulty: chain.difficulty,
            node_address: self.config.node_address.clone(),
            endpoint: self.registry.own_endpoint().to_string(),
            peers: self.registry.enumerate(),
        }
    }

    /// Validate the local chain
    pub async fn is_chain_valid(&self) -> bool {
        self.blockchain.read().await.is_valid()
    }

    pub async fn get_block(&self, hash: &str) -> Option<Block> {
        let chain = self.blockchain.read().await;
        get_block(chain.blocks(), hash).cloned()
    }

    pub async fn get_transaction(&self, id: &str) -> Option<TransactionRecord> {
        let chain = self.blockchain.read().await;
        get_transaction(chain.blocks(), id).map(|found| TransactionRecord {
            transaction: found.transaction.clone(),
            block: found.block.clone(),
        })
    }

    pub async fn get_address_data(&self, address: &str) -> AddressData {
        let chain = self.blockchain.read().await;
        get_address_data(chain.blocks(), address)
    }

    /// Answer a request from a peer
    pub async fn handle_peer_message(&self, msg: Message) -> Message {
        match msg {
            Message::NewTransaction(tx) => match self.submit_transaction(tx).await {
                Ok(block_index) => Message::TransactionQueued { block_index },
                Err(e) => Message::Rejected {
                    reason: e.to_string(),
                },
            },

            Message::NewBlock(block) => {
                let index = block.index;
                match self.accept_block(block).await {
                    Ok(()) => Message::BlockAccepted { index },
                    Err(e) => Message::Rejected {
                        reason: e.to_string(),
                    },
                }
            }

            Message::GetSnapshot => Message::Snapshot(self.chain_snapshot().await),

            other => Message::Rejected {
                reason: format!("unexpected request: {}", other.type_name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::consensus::ConsensusOutcome;
    use crate::network::peer::PeerError;
    use futures::future::BoxFuture;
    use std::collections::HashMap;

    /// What sits behind a peer endpoint in tests
    #[derive(Clone)]
    enum Stub {
        Node(Arc<Node>),
        Snapshot(ChainSnapshot),
        Down,
    }

    /// In-memory network routing peer calls straight to other nodes
    #[derive(Default)]
    struct LocalNetwork {
        peers: std::sync::RwLock<HashMap<String, Stub>>,
    }

    impl LocalNetwork {
        fn set(&self, endpoint: &str, stub: Stub) {
            self.peers
                .write()
                .unwrap()
                .insert(endpoint.to_string(), stub);
        }

        fn get(&self, endpoint: &str) -> Stub {
            self.peers
                .read()
                .unwrap()
                .get(endpoint)
                .cloned()
                .unwrap_or(Stub::Down)
        }

        async fn request(&self, peer: &str, msg: Message) -> Result<Message, PeerError> {
            match self.get(peer) {
                Stub::Node(node) => match node.handle_peer_message(msg).await {
                    Message::Rejected { reason } => Err(PeerError::Rejected(reason)),
                    response => Ok(response),
                },
                Stub::Snapshot(snapshot) => Ok(Message::Snapshot(snapshot)),
                Stub::Down => Err(PeerError::ConnectionFailed(format!("{} is down", peer))),
            }
        }
    }

    impl PeerClient for LocalNetwork {
        fn send_transaction<'a>(
            &'a self,
            peer: &'a str,
            tx: Transaction,
        ) -> BoxFuture<'a, Result<u64, PeerError>> {
            Box::pin(async move {
                match self.request(peer, Message::NewTransaction(tx)).await? {
                    Message::TransactionQueued { block_index } => Ok(block_index),
                    other => Err(PeerError::UnexpectedResponse(other.type_name())),
                }
            })
        }

        fn send_block<'a>(
            &'a self,
            peer: &'a str,
            block: Block,
        ) -> BoxFuture<'a, Result<(), PeerError>> {
            Box::pin(async move {
                match self.request(peer, Message::NewBlock(block)).await? {
                    Message::BlockAccepted { .. } => Ok(()),
                    other => Err(PeerError::UnexpectedResponse(other.type_name())),
                }
            })
        }

        fn fetch_snapshot<'a>(
            &'a self,
            peer: &'a str,
        ) -> BoxFuture<'a, Result<ChainSnapshot, PeerError>> {
            Box::pin(async move {
                match self.request(peer, Message::GetSnapshot).await? {
                    Message::Snapshot(snapshot) => Ok(snapshot),
                    other => Err(PeerError::UnexpectedResponse(other.type_name())),
                }
            })
        }
    }

    fn config(port: u16, peers: &[u16]) -> NodeConfig {
        NodeConfig {
            p2p_port: port,
            peers: peers.iter().map(|p| format!("127.0.0.1:{}", p)).collect(),
            difficulty: 2,
            node_address: format!("node-{}", port),
            peer_timeout: Duration::from_secs(1),
            ..NodeConfig::default()
        }
    }

    fn spawn_node(network: &Arc<LocalNetwork>, port: u16, peers: &[u16]) -> Arc<Node> {
        let node = Arc::new(Node::new(config(port, peers), network.clone()));
        network.set(&node.config.p2p_endpoint(), Stub::Node(node.clone()));
        node
    }

    async fn mine_n(node: &Node, n: usize) {
        for _ in 0..n {
            node.mine_block().await.unwrap();
        }
    }

    fn request(amount: f64, sender: &str, recipient: &str) -> NewTransaction {
        NewTransaction {
            amount,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_and_mine_includes_transaction_once() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9001, &[]);

        let sent = node
            .broadcast_transaction(request(10.0, "A", "B"))
            .await
            .unwrap();
        assert_eq!(sent.block_index, 2);

        let mined = node.mine_block().await.unwrap();
        let count = mined
            .block
            .transactions
            .iter()
            .filter(|tx| tx.id == sent.transaction.id)
            .count();

        assert_eq!(count, 1);
        assert!(node.chain_snapshot().await.pending_transactions.is_empty());
        assert!(node.is_chain_valid().await);
    }

    #[tokio::test]
    async fn test_consecutive_mined_blocks_link() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9002, &[]);

        let first = node.mine_block().await.unwrap().block;
        let second = node.mine_block().await.unwrap().block;

        assert_eq!(second.previous_hash, first.hash);
        assert_eq!(second.index, first.index + 1);
    }

    #[tokio::test]
    async fn test_malformed_transaction_rejected() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9003, &[]);

        let result = node.broadcast_transaction(request(0.0, "A", "B")).await;
        assert!(matches!(
            result,
            Err(NodeError::Blockchain(BlockchainError::MalformedTransaction(_)))
        ));
        assert!(node.chain_snapshot().await.pending_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_relayed_to_peers() {
        let network = Arc::new(LocalNetwork::default());
        let a = spawn_node(&network, 9011, &[9012, 9013]);
        let b = spawn_node(&network, 9012, &[]);

        let sent = a
            .broadcast_transaction(request(3.0, "A", "B"))
            .await
            .unwrap();

        // 9013 is not running: recorded, not fatal
        assert_eq!(sent.broadcast.delivered, vec!["127.0.0.1:9012".to_string()]);
        assert_eq!(sent.broadcast.failed.len(), 1);
        assert_eq!(sent.broadcast.failed[0].peer, "127.0.0.1:9013");

        let pending = b.chain_snapshot().await.pending_transactions;
        assert_eq!(pending, vec![sent.transaction]);
    }

    #[tokio::test]
    async fn test_mined_block_accepted_by_peer() {
        let network = Arc::new(LocalNetwork::default());
        let a = spawn_node(&network, 9021, &[9022]);
        let b = spawn_node(&network, 9022, &[]);

        b.submit_transaction(Transaction::new(1.0, "X", "Y"))
            .await
            .unwrap();
        let mined = a.mine_block().await.unwrap();

        assert!(mined.broadcast.all_delivered());
        let b_state = b.chain_snapshot().await;
        assert_eq!(b_state.chain.last(), Some(&mined.block));
        // Accepting a block resets the pool
        assert!(b_state.pending_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_accept_block_rejects_bad_linkage() {
        let network = Arc::new(LocalNetwork::default());
        let a = spawn_node(&network, 9031, &[]);
        let b = spawn_node(&network, 9032, &[]);

        mine_n(&a, 1).await;
        let second = a.mine_block().await.unwrap().block;

        let result = b.accept_block(second).await;
        assert!(matches!(
            result,
            Err(NodeError::Blockchain(BlockchainError::InvalidBlockLinkage { .. }))
        ));
        assert_eq!(b.chain_snapshot().await.chain.len(), 1);
    }

    #[tokio::test]
    async fn test_mine_and_reward() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9041, &[]);

        let (mined, reward) = node.mine_and_reward().await.unwrap();
        assert_eq!(mined.block.index, 2);
        assert_eq!(reward.block_index, 3);
        assert!(reward.transaction.is_reward());
        assert_eq!(reward.transaction.recipient, "node-9041");

        node.mine_block().await.unwrap();
        let data = node.get_address_data("node-9041").await;
        assert_eq!(data.balance, MINING_REWARD);
    }

    #[tokio::test]
    async fn test_consensus_adopts_longer_chain() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9051, &[9052]);
        let peer = spawn_node(&network, 9052, &[]);

        // Mine locally with the peer offline so the forks stay apart
        network.set("127.0.0.1:9052", Stub::Down);
        mine_n(&local, 2).await;
        network.set("127.0.0.1:9052", Stub::Node(peer.clone()));

        mine_n(&peer, 4).await;
        peer.submit_transaction(Transaction::new(7.0, "P", "Q"))
            .await
            .unwrap();
        local
            .submit_transaction(Transaction::new(1.0, "local", "only"))
            .await
            .unwrap();

        assert_eq!(local.chain_snapshot().await.chain.len(), 3);
        let report = local.run_consensus().await;

        assert_eq!(
            report.outcome,
            ConsensusOutcome::Replaced {
                source: "127.0.0.1:9052".to_string(),
                length: 5
            }
        );
        assert_eq!(local.chain_snapshot().await, peer.chain_snapshot().await);
    }

    #[tokio::test]
    async fn test_consensus_rejects_tampered_chain() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9061, &[9062]);
        network.set("127.0.0.1:9062", Stub::Down);
        mine_n(&local, 2).await;
        let before = local.chain_snapshot().await;

        let source = spawn_node(&network, 9063, &[]);
        mine_n(&source, 4).await;
        let mut tampered = source.chain_snapshot().await;
        tampered.chain[4].hash = "00".repeat(32);
        network.set("127.0.0.1:9062", Stub::Snapshot(tampered));

        let report = local.run_consensus().await;

        assert_eq!(report.outcome, ConsensusOutcome::Kept { length: 3 });
        assert_eq!(report.invalid.len(), 1);
        assert_eq!(local.chain_snapshot().await, before);
    }

    #[tokio::test]
    async fn test_consensus_survives_unreachable_peer() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9071, &[9072, 9073]);
        let peer = spawn_node(&network, 9073, &[]);
        mine_n(&peer, 2).await;

        let report = local.run_consensus().await;

        assert!(report.outcome.is_replaced());
        assert_eq!(report.unreachable.len(), 1);
        assert_eq!(report.unreachable[0].peer, "127.0.0.1:9072");
    }

    #[tokio::test]
    async fn test_cancel_all_stops_in_flight_mining() {
        let network = Arc::new(LocalNetwork::default());
        let mut slow_config = config(9081, &[]);
        // Only cancellation can realistically end this search
        slow_config.difficulty = crate::mining::MAX_DIFFICULTY;
        let local = Arc::new(Node::new(slow_config, network.clone()));

        let miner = {
            let local = local.clone();
            tokio::spawn(async move { local.mine_block().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        local.mining.cancel_all();

        let result = miner.await.unwrap();
        assert!(matches!(
            result,
            Err(NodeError::Mining(MiningError::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_accepted_peer_block_cancels_local_mining() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9082, &[]);
        let other = spawn_node(&network, 9083, &[]);

        let in_flight = local.mining.current();
        let competing = other.mine_block().await.unwrap().block;
        local.accept_block(competing).await.unwrap();

        assert!(in_flight.is_cancelled());
        assert!(!local.mining.current().is_cancelled());
    }

    #[tokio::test]
    async fn test_rejected_peer_block_leaves_mining_alone() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9084, &[]);

        let in_flight = local.mining.current();
        let mut bogus = Block::genesis();
        bogus.index = 7;
        assert!(local.accept_block(bogus).await.is_err());

        assert!(!in_flight.is_cancelled());
    }

    #[tokio::test]
    async fn test_consensus_replacement_cancels_local_mining() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9085, &[9086]);
        let peer = spawn_node(&network, 9086, &[]);
        mine_n(&peer, 2).await;

        let in_flight = local.mining.current();
        let report = local.run_consensus().await;

        assert!(report.outcome.is_replaced());
        assert!(in_flight.is_cancelled());
    }

    #[tokio::test]
    async fn test_solution_on_moved_tip_is_stale() {
        let network = Arc::new(LocalNetwork::default());
        let mut local_config = config(9087, &[]);
        local_config.difficulty = 4;
        let local = Arc::new(Node::new(local_config, network.clone()));

        let mut other_config = config(9088, &[]);
        other_config.difficulty = 4;
        let other = Node::new(other_config, network.clone());
        let competing = other.mine_block().await.unwrap().block;

        let miner = {
            let local = local.clone();
            tokio::spawn(async move { local.mine_block().await })
        };
        // Let the miner take its snapshot and hand the search to the blocking pool
        tokio::task::yield_now().await;

        // Move the tip without signalling the search
        local
            .blockchain
            .write()
            .await
            .accept_block(competing.clone())
            .unwrap();

        let result = miner.await.unwrap();
        assert!(matches!(
            result,
            Err(NodeError::Mining(MiningError::Stale(ref previous))) if previous == "0"
        ));

        let snapshot = local.chain_snapshot().await;
        assert_eq!(snapshot.chain.len(), 2);
        assert_eq!(snapshot.chain[1], competing);
    }

    #[tokio::test]
    async fn test_transaction_relayed_back_to_origin_is_queued_once() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9089, &[]);

        let sent = node
            .broadcast_transaction(request(3.0, "A", "B"))
            .await
            .unwrap();
        let response = node
            .handle_peer_message(Message::NewTransaction(sent.transaction.clone()))
            .await;

        assert!(matches!(response, Message::Rejected { .. }));
        let snapshot = node.chain_snapshot().await;
        assert_eq!(snapshot.pending_transactions, vec![sent.transaction.clone()]);

        let block = node.mine_block().await.unwrap().block;
        assert_eq!(block.transactions, vec![sent.transaction]);
    }

    #[tokio::test]
    async fn test_mining_builds_on_accepted_peer_block() {
        let network = Arc::new(LocalNetwork::default());
        let local = spawn_node(&network, 9091, &[]);
        let other = spawn_node(&network, 9092, &[]);

        let competing = other.mine_block().await.unwrap().block;
        local.accept_block(competing.clone()).await.unwrap();

        let next = local.mine_block().await.unwrap().block;
        assert_eq!(next.previous_hash, competing.hash);
        assert_eq!(next.index, 3);
        assert!(local.is_chain_valid().await);
    }

    #[tokio::test]
    async fn test_lookups() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9101, &[]);

        let sent = node
            .broadcast_transaction(request(4.0, "alice", "bob"))
            .await
            .unwrap();
        let block = node.mine_block().await.unwrap().block;

        assert_eq!(node.get_block(&block.hash).await, Some(block.clone()));
        assert_eq!(node.get_block("nope").await, None);

        let record = node.get_transaction(&sent.transaction.id).await.unwrap();
        assert_eq!(record.block, block);
        assert_eq!(record.transaction, sent.transaction);

        let first = node.get_address_data("bob").await;
        let second = node.get_address_data("bob").await;
        assert_eq!(first, second);
        assert_eq!(first.balance, 4.0);
    }

    #[tokio::test]
    async fn test_handle_peer_message() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9111, &[]);

        let response = node
            .handle_peer_message(Message::NewTransaction(Transaction::new(-1.0, "A", "B")))
            .await;
        assert!(matches!(response, Message::Rejected { .. }));

        let response = node
            .handle_peer_message(Message::TransactionQueued { block_index: 1 })
            .await;
        assert!(matches!(response, Message::Rejected { .. }));

        match node.handle_peer_message(Message::GetSnapshot).await {
            Message::Snapshot(snapshot) => assert_eq!(snapshot.chain.len(), 1),
            other => panic!("Wrong message type: {}", other.type_name()),
        }
    }

    #[tokio::test]
    async fn test_node_snapshot() {
        let network = Arc::new(LocalNetwork::default());
        let node = spawn_node(&network, 9121, &[9122, 9121]);

        let snapshot = node.node_snapshot().await;
        assert_eq!(snapshot.endpoint, "127.0.0.1:9121");
        assert_eq!(snapshot.peers, vec!["127.0.0.1:9122".to_string()]);
        assert_eq!(snapshot.difficulty, 2);
        assert_eq!(snapshot.snapshot.chain.len(), 1);
    }
}
