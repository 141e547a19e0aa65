mod bind;
mod nowplaying;
mod pause;
mod ping;
mod resume;
mod station;
mod stations;
mod stop;
mod volume;

use std::sync::Arc;
use serenity::{all::{Command, CommandInteraction, Context, Http}, Error};

pub async fn register_commands(http: &Arc<Http>) -> Result<Vec<Command>, Error> {
    let mut registered = Vec::new();
    for command in [
        station::register(),
        stations::register(),
        pause::register(),
        resume::register(),
        stop::register(),
        volume::register(),
        bind::register(),
        nowplaying::register(),
        ping::register(),
    ] {
        registered.push(Command::create_global_command(http, command).await?);
    }

    Ok(registered)
}

pub async fn handle_commands(ctx: Context, interaction: &CommandInteraction) {
    match interaction.data.name.as_str() {
        "station" => station::handle(ctx, interaction).await,
        "stations" => stations::handle(ctx, interaction).await,
        "pause" => pause::handle(ctx, interaction).await,
        "resume" => resume::handle(ctx, interaction).await,
        "stop" => stop::handle(ctx, interaction).await,
        "volume" => volume::handle(ctx, interaction).await,
        "bind" => bind::handle(ctx, interaction).await,
        "nowplaying" => nowplaying::handle(ctx, interaction).await,
        "ping" => ping::handle(ctx, interaction).await,
        &_ => {},
    };
}
