use serenity::all::{ButtonStyle, ChannelId, Context, Message, MessageId};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateEmbed, CreateMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, EditMessage,
};

use crate::stations::{StationCatalog, StationDescriptor};

/// Discord caps a string select menu at 25 options; the catalog is spread
/// over as many menus as it needs.
const MENU_OPTION_LIMIT: usize = 25;

#[derive(Clone)]
pub struct CardContent {
    pub embed: CreateEmbed,
    pub components: Vec<CreateActionRow>,
}

/// Builds the player interface for the current session state: embed with the
/// station art, pause/resume + stop buttons, and the station selector menus.
/// Control custom ids carry the session uuid so stale controls can be told
/// apart after a reset.
pub fn render(station: &StationDescriptor, paused: bool, uuid: u64, stations: &StationCatalog) -> CardContent {
    let embed = CreateEmbed::new()
        .title("FM Radio Player")
        .description("You're listening to: **".to_owned() + &station.name + "**")
        .image(&station.thumbnail);

    let playback_button = CreateButton::new(
        (if paused { "resume" } else { "pause" }).to_owned() + "-" + &uuid.to_string())
        .style(ButtonStyle::Secondary)
        .emoji(if paused { '▶' } else { '⏸' });
    let stop_button = CreateButton::new("stop-".to_owned() + &uuid.to_string())
        .style(ButtonStyle::Secondary)
        .emoji('⏹');

    let mut components = vec![CreateActionRow::Buttons(vec![playback_button, stop_button])];
    for (page, chunk) in stations.all().chunks(MENU_OPTION_LIMIT).enumerate() {
        let options = chunk.iter()
            .map(|station| CreateSelectMenuOption::new(
                station.name.clone(),
                station.name.clone() + "-" + &uuid.to_string(),
            ))
            .collect();

        let custom_id = if page == 0 { "station".to_owned() } else { format!("station{}", page + 1) };
        let placeholder = if page == 0 { "Change station" } else { "Other stations..." };
        components.push(CreateActionRow::SelectMenu(
            CreateSelectMenu::new(custom_id, CreateSelectMenuKind::String { options })
                .placeholder(placeholder),
        ));
    }

    CardContent { embed, components }
}

/// The single "now playing" message of a session. Tracks at most one live
/// message; `resend` always deletes the previous one before creating a new
/// one. All methods are called under the owning session's lock, so two
/// operations on the same card never interleave.
pub struct StatusCard {
    channel_id: Option<ChannelId>,
    content: Option<CardContent>,
    message: Option<Message>,
}

impl StatusCard {
    pub fn new() -> Self {
        Self { channel_id: None, content: None, message: None }
    }

    pub fn bind(&mut self, channel_id: ChannelId) {
        self.channel_id = Some(channel_id);
    }

    pub fn set_content(&mut self, content: CardContent) {
        self.content = Some(content);
    }

    pub fn live_message_id(&self) -> Option<MessageId> {
        self.message.as_ref().map(|message| message.id)
    }

    pub async fn create(&mut self, ctx: &Context) {
        let Some(content) = self.content.clone() else {
            log::warn!("Status card content is not set, nothing to send");
            return;
        };
        let Some(channel_id) = self.channel_id else {
            log::warn!("Status card is not bound to a channel, nothing to send");
            return;
        };

        let builder = CreateMessage::new()
            .embed(content.embed)
            .components(content.components);
        match channel_id.send_message(&ctx.http, builder).await {
            Ok(message) => self.message = Some(message),
            Err(err) => {
                log::error!("Error sending status message: {err}");
                self.message = None;
            }
        }
    }

    /// In-place update of the live message; falls back to `create` if there
    /// is none or the edit fails (e.g. someone deleted the message).
    pub async fn edit(&mut self, ctx: &Context) {
        if let (Some(message), Some(content)) = (self.message.as_mut(), self.content.as_ref()) {
            let builder = EditMessage::new()
                .embed(content.embed.clone())
                .components(content.components.clone());
            match message.edit(ctx, builder).await {
                Ok(()) => return,
                Err(err) => log::error!("Error editing status message: {err}"),
            }
        }

        self.create(ctx).await;
    }

    pub async fn resend(&mut self, ctx: &Context) {
        self.delete(ctx).await;
        self.create(ctx).await;
    }

    pub async fn delete(&mut self, ctx: &Context) {
        if let Some(message) = self.message.take() {
            if let Err(err) = message.delete(&ctx.http).await {
                log::error!("Error deleting status message: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::StationCatalog;

    fn rendered_rows(paused: bool, uuid: u64) -> (StationCatalog, serde_json::Value) {
        let pool = StationCatalog::default();
        let station = pool.resolve("trx").unwrap();
        let content = render(station, paused, uuid, &pool);
        let rows = serde_json::to_value(&content.components).unwrap();
        (pool, rows)
    }

    #[test]
    fn buttons_carry_the_session_uuid() {
        let (_, rows) = rendered_rows(false, 1662000000123);
        let buttons = &rows[0]["components"];
        assert_eq!(buttons[0]["custom_id"], "pause-1662000000123");
        assert_eq!(buttons[1]["custom_id"], "stop-1662000000123");
    }

    #[test]
    fn paused_card_offers_resume() {
        let (_, rows) = rendered_rows(true, 7);
        assert_eq!(rows[0]["components"][0]["custom_id"], "resume-7");
    }

    #[test]
    fn menus_list_the_whole_catalog_in_order_and_respect_the_option_limit() {
        let (pool, rows) = rendered_rows(false, 7);

        let mut listed = Vec::new();
        for row in rows.as_array().unwrap().iter().skip(1) {
            let menu = &row["components"][0];
            let options = menu["options"].as_array().unwrap();
            assert!(options.len() <= MENU_OPTION_LIMIT);
            for option in options {
                assert!(option["value"].as_str().unwrap().ends_with("-7"));
                listed.push(option["label"].as_str().unwrap().to_owned());
            }
        }

        let expected: Vec<String> = pool.all().iter().map(|s| s.name.clone()).collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn menu_custom_ids_are_paginated() {
        let (pool, rows) = rendered_rows(false, 7);
        let menus = rows.as_array().unwrap().len() - 1;
        assert_eq!(menus, (pool.all().len() + MENU_OPTION_LIMIT - 1) / MENU_OPTION_LIMIT);
        assert_eq!(rows[1]["components"][0]["custom_id"], "station");
        if menus > 1 {
            assert_eq!(rows[2]["components"][0]["custom_id"], "station2");
        }
    }
}
