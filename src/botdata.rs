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

use std::{collections::HashMap, sync::Arc};

use serenity::{all::GuildId, prelude::TypeMapKey};
use tokio::sync::Mutex;

use crate::player::{RadioPlayer, RadioPlayerHandle};
use crate::stations::StationCatalog;

pub struct BotDataKey;

/// Process-wide store: the guild→session registry, the shared HTTP client and
/// the station catalog. Lives in the serenity type map, nothing reaches for
/// it through globals.
pub struct BotData {
    players: HashMap<GuildId, RadioPlayerHandle>,
    pub(crate) http_client: reqwest::Client,
    pub(crate) stations: Arc<StationCatalog>,
}

impl TypeMapKey for BotDataKey {
    type Value = BotData;
}

impl Default for BotData {
    fn default() -> Self {
        Self {
            players: HashMap::new(),
            http_client: reqwest::Client::new(),
            stations: Arc::new(StationCatalog::default()),
        }
    }
}

impl BotData {
    pub fn get_player(&self, guild_id: GuildId) -> Option<RadioPlayerHandle> {
        self.players.get(&guild_id).cloned()
    }

    /// Returns the guild's session, creating one on demand. The bool reports
    /// whether this call created it; a caller whose first play fails uses it
    /// to discard the newborn session instead of leaving an idle orphan.
    pub fn get_or_create_player(&mut self, guild_id: GuildId) -> (RadioPlayerHandle, bool) {
        if let Some(player) = self.players.get(&guild_id) {
            return (player.clone(), false);
        }

        let player: RadioPlayerHandle = Arc::new(Mutex::new(
            RadioPlayer::new(self.http_client.clone(), self.stations.clone()),
        ));
        self.players.insert(guild_id, player.clone());
        (player, true)
    }

    pub fn remove_player(&mut self, guild_id: GuildId) {
        if self.players.remove(&guild_id).is_some() {
            log::info!("Radio session for guild {guild_id} dropped from the registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_are_created_on_demand_and_reused() {
        let mut botdata = BotData::default();
        let guild_id = GuildId::new(42);

        assert!(botdata.get_player(guild_id).is_none());
        let (first, created) = botdata.get_or_create_player(guild_id);
        assert!(created);
        let (second, created_again) = botdata.get_or_create_player(guild_id);
        assert!(!created_again);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn removal_makes_the_next_get_start_clean() {
        let mut botdata = BotData::default();
        let guild_id = GuildId::new(42);

        let (first, _) = botdata.get_or_create_player(guild_id);
        botdata.remove_player(guild_id);
        botdata.remove_player(guild_id); // already gone, fine
        assert!(botdata.get_player(guild_id).is_none());

        let (second, created) = botdata.get_or_create_player(guild_id);
        assert!(created);
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
