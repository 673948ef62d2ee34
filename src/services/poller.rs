use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::form_urlencoded;

use crate::domain::order::OrderStatus;
use crate::services::orders::OrderService;

/// Status carried back from the payment provider in the redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackStatus {
    Success,
    Cancelled,
    Other(String),
}

impl CallbackStatus {
    fn parse(raw: &str) -> Self {
        match raw {
            "success" | "PAID" => CallbackStatus::Success,
            "cancelled" | "CANCELLED" => CallbackStatus::Cancelled,
            other => CallbackStatus::Other(other.to_string()),
        }
    }
}

/// The payment-provider redirect parameters. A navigation is only treated as a
/// callback when it carries a `code`, a `status` and an `orderId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    pub code: String,
    pub status: CallbackStatus,
    pub order_id: String,
    pub order_code: Option<String>,
}

impl PaymentCallback {
    pub fn from_query(query: &str) -> Option<Self> {
        let mut code = None;
        let mut status = None;
        let mut order_id = None;
        let mut order_code = None;

        let query = query.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "status" => status = Some(value.into_owned()),
                "orderId" => order_id = Some(value.into_owned()),
                "orderCode" => order_code = Some(value.into_owned()),
                _ => {}
            }
        }

        let code = code.filter(|v| !v.is_empty())?;
        let status = status.filter(|v| !v.is_empty())?;
        let order_id = order_id.filter(|v| !v.is_empty())?;

        Some(Self {
            code,
            status: CallbackStatus::parse(&status),
            order_id,
            order_code,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Confirmed,
    GaveUp,
    Cancelled,
}

/// Side effects for the owning view. Navigation stays a message here; actual
/// routing belongs to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerEvent {
    PaymentConfirmed,
    PaymentCancelled,
    /// The attempt budget ran out without the order reaching `paid`. A normal
    /// still-processing outcome, not an error.
    StillProcessing,
    Navigate(String),
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub redirect_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 10,
            redirect_delay: Duration::from_secs(2),
        }
    }
}

/// Handle to a running poll. Cancelling (or dropping) stops the loop at its
/// next suspension point; no event is emitted afterwards, so the timer can
/// never outlive the owning view.
#[derive(Debug)]
pub struct PollHandle {
    order_id: String,
    task: JoinHandle<()>,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<PollerState>,
}

impl PollHandle {
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Watch side of the state machine, for callers that want to await a
    /// particular transition.
    pub fn state_stream(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// Reconciles the local view of an order's payment status with the server
/// after an external payment redirect: `Idle -> Polling -> {Confirmed, GaveUp,
/// Cancelled}`.
pub struct StatusPoller {
    orders: OrderService,
    config: PollerConfig,
    active: Option<PollHandle>,
}

impl StatusPoller {
    pub fn new(orders: OrderService, config: PollerConfig) -> Self {
        Self {
            orders,
            config,
            active: None,
        }
    }

    pub fn handle(&self) -> Option<&PollHandle> {
        self.active.as_ref()
    }

    /// Starts handling a redirect callback and returns the event stream for
    /// the owning view. Seeing the same callback again while a poll is live
    /// (browser back button, reload with the params still in the URL) is a
    /// no-op: no second mark-paid, no second scheduled navigation.
    pub fn activate(
        &mut self,
        callback: PaymentCallback,
    ) -> Option<mpsc::UnboundedReceiver<PollerEvent>> {
        if let Some(handle) = &self.active {
            if !handle.is_finished() {
                tracing::debug!(
                    order_id = %callback.order_id,
                    "payment poll already active, ignoring repeated callback"
                );
                return None;
            }
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(PollerState::Idle);

        let order_id = callback.order_id.clone();
        let task = tokio::spawn(run_poll(
            self.orders.clone(),
            self.config.clone(),
            callback,
            cancel_rx,
            state_tx,
            event_tx,
        ));

        self.active = Some(PollHandle {
            order_id,
            task,
            cancel: cancel_tx,
            state: state_rx,
        });
        Some(event_rx)
    }

    /// Explicit teardown of the owning view.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.cancel();
        }
    }
}

async fn run_poll(
    orders: OrderService,
    config: PollerConfig,
    callback: PaymentCallback,
    mut cancel: watch::Receiver<bool>,
    state: watch::Sender<PollerState>,
    events: mpsc::UnboundedSender<PollerEvent>,
) {
    let order_id = callback.order_id;

    match callback.status {
        CallbackStatus::Cancelled => {
            // No polling needed; give the user time to read the notice, then
            // navigate away.
            let _ = state.send(PollerState::Cancelled);
            tracing::info!(%order_id, "payment cancelled by provider");
            let _ = events.send(PollerEvent::PaymentCancelled);
            if sleep_unless_cancelled(config.redirect_delay, &mut cancel).await {
                let _ = events.send(PollerEvent::Navigate("/orders".to_string()));
            }
            return;
        }
        CallbackStatus::Success => {
            // Exactly one optimistic mark-paid; the server treats repeats
            // idempotently. Failure here is not fatal, the poll below still
            // reconciles against the authoritative status.
            if let Err(err) = orders.mark_paid(&order_id, "success").await {
                tracing::warn!(%order_id, error = %err, "mark-paid request failed");
            }
        }
        CallbackStatus::Other(raw) => {
            tracing::debug!(%order_id, status = %raw, "unrecognized provider status, polling for the authoritative state");
        }
    }

    let _ = state.send(PollerState::Polling);

    let mut attempts = 0;
    while attempts < config.max_attempts {
        attempts += 1;

        let fetched = tokio::select! {
            _ = cancel.changed() => return,
            result = orders.get(&order_id) => result,
        };

        match fetched {
            Ok(order) if order.status == OrderStatus::Paid => {
                let _ = state.send(PollerState::Confirmed);
                tracing::info!(%order_id, attempts, "payment confirmed");
                let _ = events.send(PollerEvent::PaymentConfirmed);
                if sleep_unless_cancelled(config.redirect_delay, &mut cancel).await {
                    let _ = events.send(PollerEvent::Navigate("/orders".to_string()));
                }
                return;
            }
            Ok(order) => {
                tracing::debug!(%order_id, status = order.status.as_str(), attempts, "order not paid yet");
            }
            Err(err) => {
                // A missed attempt: logged, counted, never halts the loop.
                tracing::warn!(%order_id, error = %err, attempts, "order fetch failed");
            }
        }

        if attempts < config.max_attempts
            && !sleep_unless_cancelled(config.poll_interval, &mut cancel).await
        {
            return;
        }
    }

    let _ = state.send(PollerState::GaveUp);
    tracing::info!(%order_id, attempts, "payment still processing, leaving last observed status");
    let _ = events.send(PollerEvent::StillProcessing);
}

/// Returns false when cancelled before the duration elapsed. Also treats the
/// handle being dropped as cancellation.
async fn sleep_unless_cancelled(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = cancel.changed() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
