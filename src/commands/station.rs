use serenity::all::{CommandInteraction, CommandOptionType, Context, CreateCommandOption, ResolvedValue};
use serenity::builder::CreateCommand;

use crate::botdata::BotDataKey;
use crate::misc::{self, followup_command, respond_command};
use crate::player::CallerContext;

pub async fn handle(ctx: Context, interaction: &CommandInteraction) {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(&ctx, interaction, "This command only works in a server").await;
        return;
    };

    let name_u = interaction.data.options().iter()
        .find(|option| option.name == "name")
        .unwrap().clone()
        .value;
    let ResolvedValue::String(station_name) = name_u else { unreachable!() };

    // Defer an interaction because joining and priming the stream can take
    // longer than the initial response window.
    if let Err(why) = interaction.defer(&ctx).await {
        log::error!("Error deferring interaction: {why:?}");
        return;
    }

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
    let playing = player_lock.play_station(&ctx, &caller, station_name).await;
    let tuned_into = player_lock.current_station_name().map(|name| name.to_owned());
    drop(player_lock);

    if playing {
        let name = tuned_into.unwrap_or_else(|| station_name.to_owned());
        followup_command(&ctx, interaction, &("Tuned into **".to_owned()+&name+"**")).await;
    } else {
        // a session created by this very request failed its first play,
        // don't leave an idle orphan in the registry
        if created {
            let mut lock = ctx.data.write().await;
            lock.get_mut::<BotDataKey>().unwrap().remove_player(guild_id);
        }
        followup_command(&ctx, interaction, "Nothing is playing. Join a voice channel and pick a station from /stations").await;
    }
}

pub fn register() -> CreateCommand {
    CreateCommand::new("station").description("Tune into a radio station in your voice channel")
        .add_option(CreateCommandOption::new(CommandOptionType::String, "name", "Station name, see /stations").required(true))
}
