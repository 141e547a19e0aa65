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

use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::{botdata::BotDataKey, misc::respond_command};

pub async fn handle(ctx: Context, interaction: &CommandInteraction) {
    let data_lock = ctx.data.read().await;
    let player_u = data_lock.get::<BotDataKey>().unwrap()
        .get_player(interaction.guild_id.unwrap());
    drop(data_lock);
    if player_u.is_none() {
        respond_command(&ctx, interaction, "The bot is not playing anything").await;
        return;
    }

    let player = player_u.unwrap();
    let mut player_lock = player.lock().await;
    player_lock.pause(&ctx).await;
    drop(player_lock);

    respond_command(&ctx, interaction, "Playback paused").await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("pause").description("Pause the radio without leaving the channel")
}
