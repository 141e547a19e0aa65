/*
 * This file is part of Radiobot.
 *
 * Copyright (C) 2024-present Radiobot developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

use std::sync::Arc;

use anyhow::{Context as _, Result};
use serenity::all::{ChannelId, Context, GetMessages, GuildId, UserId};
use songbird::input::{AudioStream, HttpRequest, Input, LiveInput};
use songbird::tracks::TrackHandle;
use symphonia::core::io::MediaSource;
use symphonia::core::probe::Hint;
use tokio::sync::Mutex;

use crate::card::{self, StatusCard};
use crate::fetcher::{self, FetcherHandle};
use crate::link::VoiceLink;
use crate::misc;
use crate::stations::{StationCatalog, StationDescriptor, StationSource};

/// Whoever triggered a session operation: a slash command, a button press or
/// a menu selection. Resolved by the front-end glue before the session lock
/// is taken.
pub struct CallerContext {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub text_channel_id: ChannelId,
    pub voice_channel_id: Option<ChannelId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Idle,
    Joining,
    Playing,
    Paused,
}

/// One radio session per guild. Every operation goes through the handle's
/// mutex and holds it for its whole duration, which keeps racing commands
/// from interleaving half-finished station switches.
pub type RadioPlayerHandle = Arc<Mutex<RadioPlayer>>;

pub struct RadioPlayer {
    uuid: u64,
    volume: f32,
    state: SessionState,
    current_station: Option<StationDescriptor>,
    voice_channel_id: Option<ChannelId>,
    text_channel_id: Option<ChannelId>,
    link: Option<VoiceLink>,
    track: Option<TrackHandle>,
    fetcher: Option<FetcherHandle>,
    card: StatusCard,
    http_client: reqwest::Client,
    stations: Arc<StationCatalog>,
}

impl RadioPlayer {
    pub fn new(http_client: reqwest::Client, stations: Arc<StationCatalog>) -> Self {
        let uuid = misc::mint_uuid();
        log::info!("New radio session {uuid} created");
        Self {
            uuid,
            volume: 1.0,
            state: SessionState::Idle,
            current_station: None,
            voice_channel_id: None,
            text_channel_id: None,
            link: None,
            track: None,
            fetcher: None,
            card: StatusCard::new(),
            http_client,
            stations,
        }
    }

    /// Identity guard for delayed UI interactions. Controls rendered by an
    /// earlier incarnation of the session carry a uuid that no longer
    /// matches and must not reach the current one.
    pub fn check_uuid(&self, uuid: Option<u64>) -> bool {
        uuid.is_none() || uuid == Some(self.uuid)
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn current_station_name(&self) -> Option<&str> {
        self.current_station.as_ref().map(|station| station.name.as_str())
    }

    /// Joins the caller's voice channel if needed and switches playback to
    /// the named station. The returned bool answers "is a station playing
    /// now": requests that are no-ops by design (caller not in voice, wrong
    /// channel, unknown or unchanged station) report the prior status
    /// without touching any state.
    pub async fn play_station(&mut self, ctx: &Context, caller: &CallerContext, station_name: &str) -> bool {
        log::info!("Session {}: play station request [{station_name}]", self.uuid);

        // the caller must sit in a voice channel, and not in another one
        // than the session already owns
        let Some(caller_voice) = caller.voice_channel_id else {
            return self.is_playing();
        };
        if self.voice_channel_id.is_some_and(|owned| owned != caller_voice) {
            return self.is_playing();
        }

        if self.text_channel_id.is_none() {
            self.update_text_channel(ctx, caller.text_channel_id).await;
        }
        if self.voice_channel_id.is_none() {
            self.voice_channel_id = Some(caller_voice);
        }

        let Some(station) = self.stations.resolve(station_name).cloned() else {
            return self.is_playing();
        };
        if self.current_station.as_ref().is_some_and(|current| current.name.eq_ignore_ascii_case(&station.name)) {
            return self.is_playing();
        }

        // a previous segmented station leaves a polling task behind
        if let Some(fetcher) = self.fetcher.take() {
            fetcher.stop().await;
        }

        self.current_station = Some(station.clone());
        self.state = SessionState::Joining;

        let link_usable = self.link.as_ref()
            .is_some_and(|link| !link.is_destroyed() && link.channel_id == caller_voice);
        if !link_usable {
            let manager = songbird::get(ctx)
                .await
                .expect("Songbird Voice client placed in at initialisation.")
                .clone();
            match VoiceLink::connect(manager, caller.guild_id, caller_voice).await {
                Ok(link) => self.link = Some(link),
                Err(err) => {
                    log::error!("Session {}: {err:#}", self.uuid);
                    self.stop_and_reset(ctx).await;
                    return false;
                }
            }
        }

        match self.build_input(&station).await {
            Ok(input) => {
                let call = self.link.as_ref().expect("link acquired above").call();
                let mut call_lock = call.lock().await;
                let track = call_lock.play_only_input(input);
                if let Err(err) = track.set_volume(self.volume) {
                    log::warn!("Session {}: error applying volume: {err}", self.uuid);
                }
                self.track = Some(track);
                self.state = SessionState::Playing;
            }
            Err(err) => {
                log::error!("Session {}: failed to build the station stream: {err:#}", self.uuid);
                self.stop_and_reset(ctx).await;
                return false;
            }
        }

        self.refresh_card(ctx).await;
        log::info!("Session {}: station changed to {}", self.uuid, station.name);
        true
    }

    pub async fn pause(&mut self, ctx: &Context) {
        if self.state != SessionState::Playing {
            return;
        }
        let Some(track) = &self.track else { return };
        if let Err(err) = track.pause() {
            log::error!("Session {}: error pausing track: {err}", self.uuid);
            return;
        }
        self.state = SessionState::Paused;
        self.refresh_content();
        self.card.edit(ctx).await;
    }

    pub async fn resume(&mut self, ctx: &Context) {
        if self.state != SessionState::Paused {
            return;
        }
        let Some(track) = &self.track else { return };
        if let Err(err) = track.play() {
            log::error!("Session {}: error resuming track: {err}", self.uuid);
            return;
        }
        self.state = SessionState::Playing;
        self.refresh_content();
        self.card.edit(ctx).await;
    }

    /// Stores the new default volume and applies it to the live resource if
    /// one is active. Does not change the playback state.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(track) = &self.track {
            if let Err(err) = track.set_volume(volume) {
                log::debug!("Session {}: error applying volume: {err}", self.uuid);
            }
        }
    }

    /// Full teardown: chunk polling, track, voice link and status message all
    /// go away, then the session is as freshly constructed (new uuid, new
    /// card). Idempotent. The caller evicts the session from the registry.
    pub async fn stop_and_reset(&mut self, ctx: &Context) {
        if let Some(fetcher) = self.fetcher.take() {
            fetcher.stop().await;
        }
        if let Some(track) = self.track.take() {
            let _ = track.stop();
        }
        if let Some(link) = self.link.take() {
            link.destroy();
        }
        self.card.delete(ctx).await;
        self.reinitialize();
    }

    fn reinitialize(&mut self) {
        let old_uuid = self.uuid;
        self.uuid = misc::mint_uuid();
        self.volume = 1.0;
        self.state = SessionState::Idle;
        self.current_station = None;
        self.voice_channel_id = None;
        self.text_channel_id = None;
        self.card = StatusCard::new();
        log::info!("Session {old_uuid} reset, next incarnation is {}", self.uuid);
    }

    /// Sticky binding of the session to a text channel; the status message
    /// moves there right away.
    pub async fn update_text_channel(&mut self, ctx: &Context, channel_id: ChannelId) {
        self.text_channel_id = Some(channel_id);
        self.card.bind(channel_id);
        self.card.resend(ctx).await;
    }

    pub async fn resend_card(&mut self, ctx: &Context) {
        self.refresh_content();
        self.card.resend(ctx).await;
    }

    fn refresh_content(&mut self) {
        if let Some(station) = &self.current_station {
            let paused = self.state == SessionState::Paused;
            self.card.set_content(card::render(station, paused, self.uuid, &self.stations));
        }
    }

    /// Keeps the control UI at the bottom of the bound channel: if some other
    /// message was posted after the card, delete and repost instead of
    /// editing in place.
    async fn refresh_card(&mut self, ctx: &Context) {
        self.refresh_content();
        let Some(channel_id) = self.text_channel_id else { return };

        let resend = match channel_id.messages(&ctx.http, GetMessages::new().limit(1)).await {
            Ok(messages) => messages.first().map(|message| message.id) != self.card.live_message_id(),
            Err(err) => {
                log::warn!("Session {}: error fetching the latest message: {err}", self.uuid);
                false
            }
        };
        if resend {
            self.card.resend(ctx).await;
        } else {
            self.card.edit(ctx).await;
        }
    }

    async fn build_input(&mut self, station: &StationDescriptor) -> Result<Input> {
        match &station.source {
            StationSource::Direct { url } => {
                Ok(HttpRequest::new(self.http_client.clone(), url.clone()).into())
            }
            StationSource::Segmented(source) => {
                let (handle, stream) = fetcher::start(&self.http_client, source).await
                    .context("starting the chunk fetcher")?;
                self.fetcher = Some(handle);

                let mut hint = Hint::new();
                hint.with_extension("aac");
                let stream = AudioStream {
                    input: Box::new(stream) as Box<dyn MediaSource>,
                    hint: Some(hint),
                };
                Ok(Input::Live(LiveInput::Raw(stream), None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> RadioPlayer {
        RadioPlayer::new(reqwest::Client::new(), Arc::new(StationCatalog::default()))
    }

    #[test]
    fn fresh_session_defaults() {
        let player = player();
        assert_eq!(player.volume, 1.0);
        assert_eq!(player.state, SessionState::Idle);
        assert!(!player.is_playing());
        assert!(player.current_station_name().is_none());
    }

    #[test]
    fn uuid_gate_accepts_missing_and_matching_tokens() {
        let player = player();
        assert!(player.check_uuid(None));
        assert!(player.check_uuid(Some(player.uuid)));
        assert!(!player.check_uuid(Some(player.uuid + 1)));
    }

    #[test]
    fn uuid_gate_rejects_tokens_from_before_a_reset() {
        let mut player = player();
        let stale = player.uuid;
        player.reinitialize();
        assert!(!player.check_uuid(Some(stale)));
        assert!(player.check_uuid(None));
        assert!(player.check_uuid(Some(player.uuid)));
    }

    #[test]
    fn reinitialize_clears_session_fields() {
        let mut player = player();
        player.volume = 0.3;
        player.state = SessionState::Paused;
        player.current_station = player.stations.resolve("trx").cloned();
        player.voice_channel_id = Some(ChannelId::new(1));
        player.text_channel_id = Some(ChannelId::new(2));

        player.reinitialize();
        assert_eq!(player.volume, 1.0);
        assert_eq!(player.state, SessionState::Idle);
        assert!(player.current_station.is_none());
        assert!(player.voice_channel_id.is_none());
        assert!(player.text_channel_id.is_none());
    }

    #[test]
    fn set_volume_stores_the_new_default() {
        let mut player = player();
        player.set_volume(0.25);
        assert_eq!(player.volume, 0.25);
    }
}
