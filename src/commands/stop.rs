use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::{botdata::BotDataKey, misc::respond_command};

pub async fn handle(ctx: Context, interaction: &CommandInteraction) {
    let guild_id = interaction.guild_id.unwrap();

    let data_lock = ctx.data.read().await;
    let player_u = data_lock.get::<BotDataKey>().unwrap().get_player(guild_id);
    drop(data_lock);
    if player_u.is_none() {
        respond_command(&ctx, interaction, "The bot is not in a voice channel").await;
        return;
    }

    let player = player_u.unwrap();
    let mut player_lock = player.lock().await;
    player_lock.stop_and_reset(&ctx).await;
    drop(player_lock);

    let mut lock = ctx.data.write().await;
    lock.get_mut::<BotDataKey>().unwrap().remove_player(guild_id);
    drop(lock);

    respond_command(&ctx, interaction, "Stopped, see you next time").await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("stop").description("Kick the bot out of the voice channel")
}
