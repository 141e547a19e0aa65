use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use serenity::all::{ChannelId, GuildId};
use serenity::async_trait;
use songbird::error::JoinError;
use songbird::events::context_data::DisconnectReason;
use songbird::model::CloseCode;
use songbird::{Call, CoreEvent, Event, EventContext, Songbird};
use tokio::sync::{mpsc::{self, UnboundedReceiver, UnboundedSender}, watch, Mutex};

/// How long a 4014 close is given to turn out to be a channel move.
const KICK_GRACE: Duration = Duration::from_secs(5);
const MAX_REJOIN_ATTEMPTS: u32 = 5;
const REJOIN_BACKOFF_UNIT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Ready,
    Disconnected,
    Destroyed,
}

enum LinkEvent {
    Connected,
    Disconnected { reason: Option<DisconnectReason> },
    Shutdown,
}

/// Wraps the songbird call for one voice channel together with its reconnect
/// policy. Once the link reports Destroyed it must not be reused; the session
/// opens a fresh link on the next play request.
pub struct VoiceLink {
    pub channel_id: ChannelId,
    call: Arc<Mutex<Call>>,
    events_tx: UnboundedSender<LinkEvent>,
    state_rx: watch::Receiver<LinkState>,
}

impl VoiceLink {
    pub async fn connect(manager: Arc<Songbird>, guild_id: GuildId, channel_id: ChannelId) -> Result<Self> {
        let call = manager.join(guild_id, channel_id).await
            .context("joining the voice channel")?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        // join() only returns once the driver is up
        let (state_tx, state_rx) = watch::channel(LinkState::Ready);

        {
            let mut call_lock = call.lock().await;
            call_lock.add_global_event(Event::Core(CoreEvent::DriverConnect), DriverEventRelay { events_tx: events_tx.clone() });
            call_lock.add_global_event(Event::Core(CoreEvent::DriverReconnect), DriverEventRelay { events_tx: events_tx.clone() });
            call_lock.add_global_event(Event::Core(CoreEvent::DriverDisconnect), DriverEventRelay { events_tx: events_tx.clone() });
        }

        tokio::spawn(supervise(manager, guild_id, channel_id, call.clone(), events_rx, state_tx));
        log::info!("New voice connection established for channel {channel_id}");

        Ok(Self { channel_id, call, events_tx, state_rx })
    }

    pub fn call(&self) -> Arc<Mutex<Call>> {
        self.call.clone()
    }

    pub fn state(&self) -> LinkState {
        *self.state_rx.borrow()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LinkState::Destroyed
    }

    /// Tears the link down through its supervisor; safe to call on a link
    /// that is already gone.
    pub fn destroy(&self) {
        let _ = self.events_tx.send(LinkEvent::Shutdown);
    }
}

struct DriverEventRelay {
    events_tx: UnboundedSender<LinkEvent>,
}

#[async_trait]
impl songbird::EventHandler for DriverEventRelay {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        match ctx {
            EventContext::DriverConnect(_) | EventContext::DriverReconnect(_) => {
                let _ = self.events_tx.send(LinkEvent::Connected);
            }
            EventContext::DriverDisconnect(data) => {
                let _ = self.events_tx.send(LinkEvent::Disconnected { reason: data.reason.clone() });
            }
            _ => {}
        }
        None
    }
}

enum WaitOutcome {
    Connected,
    Shutdown,
    Closed,
}

async fn next_connect(events_rx: &mut UnboundedReceiver<LinkEvent>) -> WaitOutcome {
    while let Some(event) = events_rx.recv().await {
        match event {
            LinkEvent::Connected => return WaitOutcome::Connected,
            LinkEvent::Shutdown => return WaitOutcome::Shutdown,
            LinkEvent::Disconnected { .. } => {}
        }
    }
    WaitOutcome::Closed
}

/// Per-link state machine. A 4014 close gets a short grace window to re-enter
/// the connecting state (channel move); any other disconnect is retried with
/// an attempt-proportional backoff until the attempts run out. The attempt
/// counter resets every time the driver reports ready.
async fn supervise(
    manager: Arc<Songbird>,
    guild_id: GuildId,
    channel_id: ChannelId,
    call: Arc<Mutex<Call>>,
    mut events_rx: UnboundedReceiver<LinkEvent>,
    state_tx: watch::Sender<LinkState>,
) {
    let mut rejoin_attempts: u32 = 0;

    while let Some(event) = events_rx.recv().await {
        match event {
            LinkEvent::Connected => {
                rejoin_attempts = 0;
                let _ = state_tx.send(LinkState::Ready);
                log::debug!("Voice connection for channel {channel_id} is ready");
            }
            LinkEvent::Disconnected { reason } => {
                let _ = state_tx.send(LinkState::Disconnected);
                log::debug!("Voice connection for channel {channel_id} lost: {reason:?}");

                // close code 4014: the bot was moved to another channel or
                // kicked, and the driver recovers on its own if it was a move
                if matches!(reason, Some(DisconnectReason::WsClosed(Some(CloseCode::Disconnected)))) {
                    match tokio::time::timeout(KICK_GRACE, next_connect(&mut events_rx)).await {
                        Ok(WaitOutcome::Connected) => {
                            // moved between channels, the driver recovered
                            rejoin_attempts = 0;
                            let _ = state_tx.send(LinkState::Ready);
                        }
                        Ok(WaitOutcome::Closed) => break,
                        Ok(WaitOutcome::Shutdown) | Err(_) => {
                            // kicked from the channel
                            remove_call(&manager, guild_id).await;
                            let _ = state_tx.send(LinkState::Destroyed);
                            break;
                        }
                    }
                } else if rejoin_attempts < MAX_REJOIN_ATTEMPTS {
                    tokio::time::sleep(REJOIN_BACKOFF_UNIT * (rejoin_attempts + 1)).await;
                    rejoin_attempts += 1;
                    let _ = state_tx.send(LinkState::Connecting);
                    log::info!("Rejoining voice channel {channel_id}, attempt {rejoin_attempts}");
                    if let Err(err) = call.lock().await.join(channel_id).await {
                        log::error!("Rejoin attempt {rejoin_attempts} failed: {err}");
                    }
                } else {
                    log::warn!("Voice connection for channel {channel_id} is out of rejoin attempts");
                    remove_call(&manager, guild_id).await;
                    let _ = state_tx.send(LinkState::Destroyed);
                    break;
                }
            }
            LinkEvent::Shutdown => {
                remove_call(&manager, guild_id).await;
                let _ = state_tx.send(LinkState::Destroyed);
                break;
            }
        }
    }
}

async fn remove_call(manager: &Songbird, guild_id: GuildId) {
    if let Err(err) = manager.remove(guild_id).await {
        match err {
            JoinError::NoCall => {}
            _ => log::error!("Error leaving the voice channel: {err}"),
        }
    }
}
