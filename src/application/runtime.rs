// Event loop wiring the sync timer, push channel and render clock
use crate::application::attitude_animator::frame_clock;
use crate::application::dashboard::{Dashboard, DashboardEvent};
use crate::application::history_sync::HistorySync;
use crate::application::live_event_bridge::{
    CommandRequest, FaultInjection, OutboundEvent, PushChannel,
};
use crate::domain::channel::FocusOption;
use std::sync::Arc;
use tokio::sync::mpsc;

const EVENT_QUEUE_DEPTH: usize = 256;

/// Cloneable entry point for operator requests
#[derive(Clone)]
pub struct DashboardHandle {
    tx: mpsc::Sender<DashboardEvent>,
}

impl DashboardHandle {
    pub async fn select_focus(&self, option: FocusOption) -> anyhow::Result<()> {
        self.send(DashboardEvent::SelectFocus(option)).await
    }

    pub async fn send_command(&self, command: CommandRequest) -> anyhow::Result<()> {
        self.send(DashboardEvent::Outbound(OutboundEvent::SendCommand(command)))
            .await
    }

    pub async fn inject_fault(&self, fault: FaultInjection) -> anyhow::Result<()> {
        self.send(DashboardEvent::Outbound(OutboundEvent::InjectFault(fault)))
            .await
    }

    pub async fn clear_log(&self) -> anyhow::Result<()> {
        self.send(DashboardEvent::ClearLog).await
    }

    async fn send(&self, event: DashboardEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("dashboard event loop has stopped"))
    }
}

pub struct DashboardRuntime {
    dashboard: Dashboard,
    history: HistorySync,
    push: Arc<dyn PushChannel>,
    frame_rate_hz: u32,
    tx: mpsc::Sender<DashboardEvent>,
    rx: mpsc::Receiver<DashboardEvent>,
}

impl DashboardRuntime {
    pub fn new(
        dashboard: Dashboard,
        history: HistorySync,
        push: Arc<dyn PushChannel>,
        frame_rate_hz: u32,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        Self {
            dashboard,
            history,
            push,
            frame_rate_hz,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run forever. All dashboard state is touched from this task only; every
    /// handler runs to completion before the next source is polled.
    pub async fn run(self) {
        let Self {
            mut dashboard,
            history,
            push,
            frame_rate_hz,
            tx,
            mut rx,
        } = self;

        let push_tx = tx.clone();
        let inbound = push.clone();
        tokio::spawn(async move { inbound.run(push_tx).await });

        dashboard.start();

        let mut sync_ticker = history.ticker();
        let mut frames = frame_clock(frame_rate_hz);
        tracing::info!(
            channels = history.channels().len(),
            frame_rate_hz,
            "dashboard event loop started"
        );

        loop {
            tokio::select! {
                _ = sync_ticker.tick() => history.spawn_cycle(&tx),
                _ = frames.tick() => dashboard.on_frame(),
                Some(event) = rx.recv() => {
                    if let Some(outbound) = dashboard.handle_event(event) {
                        let push = push.clone();
                        tokio::spawn(async move {
                            if let Err(e) = push.emit(outbound).await {
                                tracing::warn!("outbound event not delivered: {:#}", e);
                            }
                        });
                    }
                }
            }
        }
    }
}
