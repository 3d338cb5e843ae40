//! SVG verdict card.

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{AppError, Result};

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

const TEMPLATE_NAME: &str = "verdict.svg.tera";
const MESSAGE_LINE_CHARS: usize = 60;
const MESSAGE_MAX_LINES: usize = 3;

#[derive(Embed)]
#[folder = "templates/"]
struct Templates;

/// Everything drawn on a verdict card.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictCard {
    pub judgment_id: String,
    pub repo_name: String,
    pub title: String,
    pub incident_at: DateTime<Utc>,
    pub target_username: String,
    pub target_avatar: Option<String>,
    pub responsibility: u8,
    pub message: String,
    pub last_commit_msg: String,
}

/// One coffee per 20 points of responsibility, never fewer than one.
pub fn coffee_count(responsibility: u8) -> u8 {
    (responsibility / 20).max(1)
}

/// Greedy word wrap by character count. Words longer than a line are split.
pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let word_len = word.chars().count();
        if !current.is_empty() && current.chars().count() + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}

pub struct CardTemplate {
    tera: Tera,
}

impl CardTemplate {
    pub fn load() -> Result<Self> {
        let file = Templates::get(TEMPLATE_NAME)
            .ok_or_else(|| AppError::Internal(format!("missing embedded template {}", TEMPLATE_NAME)))?;
        let source = std::str::from_utf8(&file.data)
            .map_err(|e| AppError::Internal(format!("template {} is not UTF-8: {}", TEMPLATE_NAME, e)))?;

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".svg.tera"]);
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| AppError::Internal(format!("invalid template {}: {}", TEMPLATE_NAME, e)))?;
        Ok(Self { tera })
    }

    pub fn render(&self, card: &VerdictCard) -> Result<String> {
        let coffee = coffee_count(card.responsibility);

        let mut context = Context::new();
        context.insert("width", &CARD_WIDTH);
        context.insert("height", &CARD_HEIGHT);
        context.insert("repo_name", &card.repo_name);
        context.insert("title", &card.title);
        context.insert("incident_date", &card.incident_at.format("%Y-%m-%d").to_string());
        context.insert("target_username", &card.target_username);
        context.insert("target_avatar", &card.target_avatar);
        context.insert("responsibility", &card.responsibility);
        context.insert("last_commit_msg", &first_line(&card.last_commit_msg));
        context.insert("message_lines", &wrap_text(&card.message, MESSAGE_LINE_CHARS, MESSAGE_MAX_LINES));
        context.insert("coffee_count", &coffee);
        context.insert("coffee_icons", &"☕".repeat(coffee as usize));

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| AppError::Internal(format!("Failed to render verdict card: {}", e)))
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn card() -> VerdictCard {
        VerdictCard {
            judgment_id: "j-1".to_string(),
            repo_name: "acme/shop".to_string(),
            title: "Payment <500>".to_string(),
            incident_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            target_username: "alice".to_string(),
            target_avatar: Some("https://a/alice".to_string()),
            responsibility: 70,
            message: "alice, the refactor was bold".to_string(),
            last_commit_msg: "refactor payment\n\nlong body".to_string(),
        }
    }

    #[test]
    fn coffee_is_at_least_one() {
        assert_eq!(coffee_count(0), 1);
        assert_eq!(coffee_count(19), 1);
        assert_eq!(coffee_count(40), 2);
        assert_eq!(coffee_count(70), 3);
        assert_eq!(coffee_count(100), 5);
    }

    #[test]
    fn renders_card_fields_escaped() {
        let svg = CardTemplate::load().unwrap().render(&card()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("@alice"));
        assert!(svg.contains("Responsibility 70%"));
        assert!(svg.contains("2024-01-15"));
        assert!(svg.contains("\"refactor payment\""));
        assert!(!svg.contains("long body"));
        assert!(svg.contains("Payment &lt;500&gt;"));
        assert!(svg.contains("☕☕☕ 3 coffee owed"));
        assert!(svg.contains("#FF6B6B"));
    }

    #[test]
    fn avatar_is_optional() {
        let mut c = card();
        c.target_avatar = None;
        let svg = CardTemplate::load().unwrap().render(&c).unwrap();
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn wraps_and_truncates() {
        let lines = wrap_text("aaa bbb ccc ddd", 7, 10);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);

        let lines = wrap_text("abcdefghij", 4, 10);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);

        let lines = wrap_text("a b c d e f", 1, 2);
        assert_eq!(lines, vec!["a", "b…"]);
    }
}
