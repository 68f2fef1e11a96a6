use verbcard_lib::mastery::{ChoiceSet, SessionStats};
use verbcard_lib::practice::{Card, Tense};
use verbcard_lib::store::ContextKey;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// "Passé Composé · nous", or just the pronoun
pub fn context_label(context: &ContextKey) -> String {
    match &context.tense {
        Some(key) => {
            let tense = Tense::from_key(key)
                .map(|t| t.display_name().to_string())
                .unwrap_or_else(|| key.clone());
            format!("{} · {}", tense, context.pronoun)
        }
        None => context.pronoun.clone(),
    }
}

/// Front of the card
pub fn render_front(card: &Card, use_color: bool) -> String {
    let mut lines = Vec::new();
    match &card.prompt {
        // Phrase cards show the English text, with the pronoun to tell tu from vous
        Some(prompt) => {
            lines.push(paint(
                &format!("{} ({})", prompt, card.context.pronoun),
                Color::BOLD,
                use_color,
            ));
            lines.push(paint(&context_label(&card.context), Color::GRAY, use_color));
        }
        None => {
            lines.push(paint(&card.item_key, Color::BOLD, use_color));
            lines.push(paint(&context_label(&card.context), Color::CYAN, use_color));
        }
    }
    lines.join("\n")
}

/// Back of the card
pub fn render_back(card: &Card, use_color: bool) -> String {
    let answer = card.expected.as_deref().unwrap_or("—");
    let mut lines = vec![paint(answer, Color::GREEN, use_color)];
    if let Some(translation) = &card.translation {
        lines.push(paint(translation, Color::DIM, use_color));
    }
    lines.join("\n")
}

pub fn render_choices(choices: &ChoiceSet) -> String {
    choices
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("  {}) {}", i + 1, option))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_session_stats(stats: &SessionStats) -> String {
    let accuracy = stats
        .accuracy()
        .map(|a| format!("{}%", a))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Correct: {}  Incorrect: {}  Accuracy: {}",
        stats.correct, stats.incorrect, accuracy
    )
}
