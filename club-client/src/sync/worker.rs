//! SyncWorker - background loop driving debounce, polling and signals

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{AppSignal, PushOutcome, SyncCommand, SyncEngine};

pub struct SyncWorker {
    engine: SyncEngine,
    commands: mpsc::UnboundedReceiver<SyncCommand>,
    shutdown: CancellationToken,
}

impl SyncWorker {
    pub(crate) fn new(
        engine: SyncEngine,
        commands: mpsc::UnboundedReceiver<SyncCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            commands,
            shutdown,
        }
    }

    /// Run the sync worker
    ///
    /// 1. Refresh on startup
    /// 2. Debounce scheduled pushes into a single write
    /// 3. Poll while in the foreground and online
    /// 4. React to connectivity and visibility signals
    pub async fn run(mut self) {
        tracing::info!("SyncWorker started");

        let (debounce, poll_every, retry) = {
            let config = self.engine.context().config();
            (config.push_debounce, config.poll_interval, config.push_retry)
        };

        self.engine.refresh().await;

        let mut poll = tokio::time::interval(poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        poll.tick().await; // skip immediate tick

        let mut debounce_deadline: Option<Instant> = None;

        loop {
            let sleep_until =
                debounce_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    if debounce_deadline.is_some() {
                        self.flush().await;
                    }
                    break;
                }

                _ = tokio::time::sleep_until(sleep_until), if debounce_deadline.is_some() => {
                    debounce_deadline = None;
                    if let Some(PushOutcome::Failed(_)) = self.flush().await {
                        tracing::debug!(?retry, "Push failed, retrying later");
                        debounce_deadline = Some(Instant::now() + retry);
                    }
                }

                _ = poll.tick() => {
                    let ctx = self.engine.context();
                    if ctx.is_foreground() && ctx.is_online() {
                        self.engine.refresh().await;
                    } else {
                        tracing::trace!("Poll skipped (background or offline)");
                    }
                }

                command = self.commands.recv() => {
                    match command {
                        Some(SyncCommand::SchedulePush) => {
                            debounce_deadline = Some(Instant::now() + debounce);
                        }
                        Some(SyncCommand::Signal(signal)) => {
                            if let Some(PushOutcome::Failed(_)) = self.on_signal(signal).await {
                                debounce_deadline = Some(Instant::now() + retry);
                            }
                        }
                        None => {
                            tracing::info!("Command channel closed, SyncWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("SyncWorker stopped");
    }

    /// Debounce elapsed: push once if anything is still pending
    async fn flush(&self) -> Option<PushOutcome> {
        let ctx = self.engine.context();
        if !ctx.is_online() {
            tracing::debug!("Offline, pending push kept");
            return None;
        }
        if !ctx.with_cache(|cache| cache.is_dirty()) {
            tracing::debug!("Nothing to push");
            return None;
        }
        Some(self.engine.push_app_data_now().await)
    }

    /// Returns the outcome of the push an `Online` signal triggers, if any
    async fn on_signal(&self, signal: AppSignal) -> Option<PushOutcome> {
        tracing::debug!(?signal, "Sync signal");
        match signal {
            AppSignal::Online => {
                // 离线期间的管理员修改先推送，再拉取
                let dirty = self.engine.context().with_cache(|cache| cache.is_dirty());
                let pushed = if dirty && self.engine.has_push_credential() {
                    Some(self.engine.push_app_data_now().await)
                } else {
                    None
                };
                self.engine.refresh().await;
                pushed
            }
            AppSignal::Foreground | AppSignal::RefreshRequested => {
                self.engine.refresh().await;
                None
            }
            AppSignal::Offline | AppSignal::Background => None,
        }
    }
}
