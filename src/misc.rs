use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serenity::all::{
    ChannelId, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, GuildId, UserId,
};

pub async fn respond_command(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
        .content(text.to_string())
    );
    if let Err(why) = interaction.create_response(&ctx.http, response).await {
        log::error!("Error responding to interaction: {why:?}");
    }
}

pub async fn followup_command(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let response =
        CreateInteractionResponseFollowup::new()
        .content(text.to_string());
    if let Err(why) = interaction.create_followup(&ctx.http, response).await {
        log::error!("Error following up an interaction: {why:?}");
    }
}

/// Session identity tokens: millisecond timestamps, bumped when two mints
/// land in the same millisecond so they stay strictly increasing.
pub fn mint_uuid() -> u64 {
    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();

    let mut prev = LAST.load(Ordering::SeqCst);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// The voice channel the user currently sits in, if any.
pub fn voice_channel_of(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    ctx.cache.guild(guild_id)
        .and_then(|guild| guild.voice_states.get(&user_id).and_then(|state| state.channel_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_uuids_are_strictly_increasing() {
        let first = mint_uuid();
        let second = mint_uuid();
        let third = mint_uuid();
        assert!(first < second);
        assert!(second < third);
    }
}
