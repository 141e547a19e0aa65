use serenity::all::{CommandInteraction, CommandOptionType, Context, CreateCommandOption, ResolvedValue};
use serenity::builder::CreateCommand;

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

    let value_u = interaction.data.options().iter()
        .find(|option| option.name == "value")
        .unwrap().clone()
        .value;
    let ResolvedValue::Number(volume) = value_u else { unreachable!() };
    if !volume.is_finite() || volume < 0.0 {
        respond_command(&ctx, interaction, "Volume must be zero or more").await;
        return;
    }

    let player = player_u.unwrap();
    let mut player_lock = player.lock().await;
    player_lock.set_volume(volume as f32);
    drop(player_lock);

    respond_command(&ctx, interaction, &("Volume set to ".to_owned()+&volume.to_string())).await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("volume").description("Change the volume of the radio [Default: 1]")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Number, "value", "New volume")
                .min_number_value(0.0)
                .required(true),
        )
}
