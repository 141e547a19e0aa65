use serenity::all::{CommandInteraction, Context};
use serenity::builder::CreateCommand;

use crate::misc::respond_command;

pub async fn handle(ctx: Context, interaction: &CommandInteraction) {
    respond_command(&ctx, interaction, "pong").await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("ping").description("A ping command")
}
