use serenity::all::{CommandInteraction, Context};
use serenity::builder::CreateCommand;

use crate::botdata::BotDataKey;
use crate::misc::respond_command;

pub async fn handle(ctx: Context, interaction: &CommandInteraction) {
    let data_lock = ctx.data.read().await;
    let stations = data_lock.get::<BotDataKey>().unwrap().stations.clone();
    drop(data_lock);

    let names: Vec<&str> = stations.all().iter().map(|station| station.name.as_str()).collect();
    let mut text = "```swift\n".to_string();
    for row in names.chunks(3) {
        for name in row {
            text += &format!("{name:<15} ");
        }
        text += "\n";
    }
    text += "```";

    respond_command(&ctx, interaction, &text).await;
}

pub fn register() -> CreateCommand {
    CreateCommand::new("stations").description("List all the stations that can be played with /station")
}
