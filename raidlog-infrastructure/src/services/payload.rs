// Outbound webhook payloads

use serde_json::{json, Value};

use raidlog_domain::utils::render_template;
use raidlog_domain::{DeliveryItem, WebhookMode, WebhookSettings};

pub fn render_payload(settings: &WebhookSettings, item: &DeliveryItem) -> Value {
    match settings.mode {
        WebhookMode::Simple => json!({
            "content": render_template(&settings.simple_template, &item.placeholders),
        }),
        WebhookMode::Embed => render_embed(settings, item),
    }
}

fn render_embed(settings: &WebhookSettings, item: &DeliveryItem) -> Value {
    let embed = &settings.embed;
    let values = &item.placeholders;
    let fields = embed
        .fields
        .iter()
        .map(|field| {
            json!({
                "name": render_template(&field.name, values),
                "value": render_template(&field.value, values),
                "inline": field.inline,
            })
        })
        .collect::<Vec<_>>();
    let thumbnail = item
        .icon
        .as_deref()
        .filter(|icon| !icon.trim().is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| render_template(&embed.thumbnail_url, values));

    json!({
        "embeds": [{
            "title": render_template(&embed.title, values),
            "thumbnail": { "url": thumbnail },
            "fields": fields,
            "color": item.color,
            "timestamp": item.event.timestamp.to_rfc3339(),
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use raidlog_domain::{
        EmbedTemplate, EventOutcome, RaidEvent, TargetDescriptor, TrackerCategory, Vec3,
        WeaponDescriptor, WeaponRef,
    };

    fn item(attacker: &str) -> DeliveryItem {
        let placeholders = BTreeMap::from([
            ("attackerName".to_string(), attacker.to_string()),
            ("victimName".to_string(), "B".to_string()),
            ("gridPos".to_string(), "G12".to_string()),
        ]);
        DeliveryItem {
            event: RaidEvent {
                attacker_id: 1,
                attacker_name: attacker.to_string(),
                attacker_team_id: 0,
                victim_owner_id: 2,
                weapon: WeaponDescriptor::single(WeaponRef::new(
                    "rocket_basic",
                    TrackerCategory::EntityCollision,
                )),
                outcome: EventOutcome::Hit,
                target: TargetDescriptor::new("wall", None),
                origin: Vec3::ZERO,
                target_position: Vec3::new(10.0, 0.0, 10.0),
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            },
            placeholders,
            color: 0xB867FF,
            icon: None,
        }
    }

    fn settings(mode: WebhookMode) -> WebhookSettings {
        WebhookSettings {
            url: Some("https://hooks.example/abc".to_string()),
            mode,
            simple_template: "{attackerName} is raiding {victimName} @ {gridPos}".to_string(),
            embed: EmbedTemplate::default(),
        }
    }

    #[test]
    fn simple_mode_renders_content() {
        let payload = render_payload(&settings(WebhookMode::Simple), &item("A"));
        assert_eq!(payload, json!({ "content": "A is raiding B @ G12" }));
    }

    #[test]
    fn embed_mode_carries_color_timestamp_and_icon() {
        let mut item = item("A");
        item.icon = Some("https://icons.example/fire.png".to_string());
        let payload = render_payload(&settings(WebhookMode::Embed), &item);
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "A is raiding B @ G12");
        assert_eq!(embed["color"], 0xB867FF);
        assert_eq!(embed["timestamp"], "2024-05-01T12:00:00+00:00");
        assert_eq!(embed["thumbnail"]["url"], "https://icons.example/fire.png");
        assert_eq!(embed["fields"].as_array().map(Vec::len), Some(5));
    }
}
