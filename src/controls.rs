use serenity::all::{ComponentInteraction, ComponentInteractionDataKind, Context, CreateInteractionResponse};

use crate::botdata::BotDataKey;
use crate::misc;
use crate::player::CallerContext;

/// Routes presses on the status-card controls. Every interaction is
/// acknowledged; ones carrying a uuid from a replaced session are
/// acknowledged and dropped so a stale card cannot drive the current
/// session.
pub async fn handle_component(ctx: Context, interaction: &ComponentInteraction) {
    match &interaction.data.kind {
        ComponentInteractionDataKind::Button => handle_button(ctx, interaction).await,
        ComponentInteractionDataKind::StringSelect { values } => {
            let Some(selected) = values.first().cloned() else { return };
            handle_station_select(ctx, interaction, &selected).await;
        }
        _ => (),
    }
}

async fn handle_button(ctx: Context, interaction: &ComponentInteraction) {
    let Some(guild_id) = interaction.guild_id else { return };
    let Some((action, uuid)) = split_control_id(&interaction.data.custom_id) else { return };
    acknowledge(&ctx, interaction).await;

    let data_lock = ctx.data.read().await;
    let player_u = data_lock.get::<BotDataKey>().unwrap().get_player(guild_id);
    drop(data_lock);
    let Some(player) = player_u else { return };

    let mut player_lock = player.lock().await;
    if !player_lock.check_uuid(uuid) {
        return;
    }

    match action {
        "pause" => player_lock.pause(&ctx).await,
        "resume" => player_lock.resume(&ctx).await,
        "stop" => {
            player_lock.stop_and_reset(&ctx).await;
            drop(player_lock);
            let mut lock = ctx.data.write().await;
            lock.get_mut::<BotDataKey>().unwrap().remove_player(guild_id);
        }
        _ => log::warn!("Unknown control button {action}"),
    }
}

async fn handle_station_select(ctx: Context, interaction: &ComponentInteraction, selected: &str) {
    let Some(guild_id) = interaction.guild_id else { return };
    let Some((station_name, uuid)) = split_control_id(selected) else { return };
    acknowledge(&ctx, interaction).await;

    let caller = CallerContext {
        guild_id,
        user_id: interaction.user.id,
        text_channel_id: interaction.channel_id,
        voice_channel_id: misc::voice_channel_of(&ctx, guild_id, interaction.user.id),
    };

    let (player, created) = {
        let mut lock = ctx.data.write().await;
        lock.get_mut::<BotDataKey>().unwrap().get_or_create_player(guild_id)
    };

    let mut player_lock = player.lock().await;
    if !player_lock.check_uuid(uuid) {
        return;
    }
    let playing = player_lock.play_station(&ctx, &caller, station_name).await;
    drop(player_lock);

    if !playing && created {
        let mut lock = ctx.data.write().await;
        lock.get_mut::<BotDataKey>().unwrap().remove_player(guild_id);
    }
}

async fn acknowledge(ctx: &Context, interaction: &ComponentInteraction) {
    if let Err(why) = interaction.create_response(&ctx.http, CreateInteractionResponse::Acknowledge).await {
        log::error!("Error acknowledging component interaction: {why:?}");
    }
}

/// Control ids and menu values look like "pause-1662000000123"; the trailing
/// part is the session uuid of the card that rendered them. A control minted
/// without a parseable uuid passes the gate, like a plain command would.
fn split_control_id(custom_id: &str) -> Option<(&str, Option<u64>)> {
    let (action, uuid) = custom_id.rsplit_once('-')?;
    Some((action, uuid.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_ids_split_into_action_and_uuid() {
        assert_eq!(split_control_id("pause-123"), Some(("pause", Some(123))));
        assert_eq!(split_control_id("stop-1662000000123"), Some(("stop", Some(1662000000123))));
        assert_eq!(split_control_id("Virgin70s-9"), Some(("Virgin70s", Some(9))));
        assert_eq!(split_control_id("nodash"), None);
        assert_eq!(split_control_id("pause-xyz"), Some(("pause", None)));
    }
}
