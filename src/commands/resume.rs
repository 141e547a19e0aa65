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
    player_lock.resume(&ctx).await;
    drop(player_lock);

    respond_command(&ctx, interaction, "Playback resumed").await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("resume").description("Start the radio again")
}
