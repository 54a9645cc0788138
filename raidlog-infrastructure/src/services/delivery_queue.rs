// Outbound delivery queue
// One item in flight at a time; rate limits hold the head of the queue until it resolves

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use raidlog_domain::utils::current_millis;
use raidlog_domain::{
    DeliveryItem, DeliveryRecord, DeliveryService, DeliveryTransport, RuntimeConfig,
    TransportResponse, WebhookSettings,
};

use super::payload::render_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTiming {
    /// Longest an attempt may stay in flight before it counts as failed.
    pub cooldown: Duration,
    pub success_delay: Duration,
    pub max_rate_limit_retries: u32,
    pub history: usize,
}

impl DeliveryTiming {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(config.delivery_cooldown_seconds.max(1)),
            success_delay: Duration::from_secs(config.delivery_success_delay_seconds),
            max_rate_limit_retries: config.max_rate_limit_retries,
            history: config.delivery_history.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Sending,
    Succeeded,
    RateLimited,
    Failed,
}

impl AttemptState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptState::Sending => "sending",
            AttemptState::Succeeded => "succeeded",
            AttemptState::RateLimited => "rate_limited",
            AttemptState::Failed => "failed",
        }
    }
}

type History = Arc<Mutex<VecDeque<DeliveryRecord>>>;

pub struct DeliveryQueue {
    sender: Option<mpsc::UnboundedSender<DeliveryItem>>,
    pending: Arc<AtomicUsize>,
    history: History,
    worker: StdMutex<Option<JoinHandle<()>>>,
}

impl DeliveryQueue {
    /// Queue that accepts nothing; used when no webhook is configured.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            pending: Arc::new(AtomicUsize::new(0)),
            history: Arc::new(Mutex::new(VecDeque::new())),
            worker: StdMutex::new(None),
        }
    }

    pub fn start(
        settings: WebhookSettings,
        timing: DeliveryTiming,
        transport: Arc<dyn DeliveryTransport>,
    ) -> Self {
        if !settings.enabled() {
            info!("webhook delivery disabled");
            return Self::disabled();
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let history: History = Arc::new(Mutex::new(VecDeque::new()));
        let worker = DeliveryWorker {
            settings,
            timing,
            transport,
            pending: pending.clone(),
            history: history.clone(),
        };
        let handle = tokio::spawn(worker.run(receiver));
        Self {
            sender: Some(sender),
            pending,
            history,
            worker: StdMutex::new(Some(handle)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Cancels the worker and any timer it is waiting on. Queued items are dropped.
    pub fn shutdown(&self) {
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            let dropped = self.pending.swap(0, Ordering::SeqCst);
            if dropped > 0 {
                warn!(dropped, "delivery queue stopped with items pending");
            }
        }
    }
}

#[async_trait]
impl DeliveryService for DeliveryQueue {
    fn enqueue(&self, item: DeliveryItem) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("delivery worker is gone, item dropped");
            return false;
        }
        true
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    async fn list_deliveries(&self, limit: usize) -> Vec<DeliveryRecord> {
        let history = self.history.lock().await;
        history.iter().rev().take(limit).cloned().collect()
    }

    async fn last_delivery(&self) -> Option<DeliveryRecord> {
        self.history.lock().await.back().cloned()
    }
}

struct DeliveryWorker {
    settings: WebhookSettings,
    timing: DeliveryTiming,
    transport: Arc<dyn DeliveryTransport>,
    pending: Arc<AtomicUsize>,
    history: History,
}

impl DeliveryWorker {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<DeliveryItem>) {
        while let Some(item) = receiver.recv().await {
            let (state, attempts, error) = self.deliver(&item).await;
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.remember(&item, state, attempts, error).await;
            if state == AttemptState::Succeeded && !self.timing.success_delay.is_zero() {
                sleep(self.timing.success_delay).await;
            }
        }
        debug!("delivery worker finished");
    }

    /// Sends one item until it succeeds, fails, or exhausts its rate-limit retries.
    async fn deliver(&self, item: &DeliveryItem) -> (AttemptState, u32, Option<String>) {
        let body = render_payload(&self.settings, item);
        let label = item.label();
        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!(item = %label, attempts, state = AttemptState::Sending.as_str(), "delivery attempt");
            let outcome = timeout(self.timing.cooldown, self.transport.post(&body)).await;
            match outcome {
                Ok(Ok(TransportResponse::Accepted)) => {
                    debug!(item = %label, attempts, "delivered");
                    return (AttemptState::Succeeded, attempts, None);
                }
                Ok(Ok(TransportResponse::RateLimited { retry_after }))
                    if attempts <= self.timing.max_rate_limit_retries =>
                {
                    warn!(
                        item = %label,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "webhook rate limited, retrying"
                    );
                    sleep(retry_after).await;
                }
                Ok(Ok(TransportResponse::RateLimited { .. })) => {
                    let error = format!("still rate limited after {} attempts", attempts);
                    warn!(item = %label, "webhook delivery dropped: {}", error);
                    return (AttemptState::RateLimited, attempts, Some(error));
                }
                Ok(Ok(TransportResponse::Rejected { status, body })) => {
                    let error = format!("[{}] {}", status, body);
                    warn!(item = %label, "webhook delivery failed: {}", error);
                    return (AttemptState::Failed, attempts, Some(error));
                }
                Ok(Err(err)) => {
                    warn!(item = %label, "webhook delivery failed: {}", err);
                    return (AttemptState::Failed, attempts, Some(err.to_string()));
                }
                Err(_) => {
                    let error = format!(
                        "no response within {}s",
                        self.timing.cooldown.as_secs()
                    );
                    warn!(item = %label, "webhook delivery failed: {}", error);
                    return (AttemptState::Failed, attempts, Some(error));
                }
            }
        }
    }

    async fn remember(
        &self,
        item: &DeliveryItem,
        state: AttemptState,
        attempts: u32,
        error: Option<String>,
    ) {
        let mut history = self.history.lock().await;
        history.push_back(DeliveryRecord {
            timestamp_ms: current_millis(),
            status: state.as_str().to_string(),
            item: item.label(),
            attempts,
            error,
        });
        while history.len() > self.timing.history {
            history.pop_front();
        }
    }
}
