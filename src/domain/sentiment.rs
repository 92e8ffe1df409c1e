//! Market sentiment labels attached to news items.

use serde_json::Value;

const BULLISH_LABELS: &[&str] = &["bullish", "positive", "up", "buy", "long", "強気"];
const BEARISH_LABELS: &[&str] = &["bearish", "negative", "down", "sell", "short", "弱気"];
const NEUTRAL_LABELS: &[&str] = &["neutral", "flat", "中立"];

/// Scores within this distance of zero read as neutral.
const NEUTRAL_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Bullish,
    Bearish,
    Neutral,
}

impl Tone {
    pub fn label(self) -> &'static str {
        match self {
            Tone::Bullish => "Bullish",
            Tone::Bearish => "Bearish",
            Tone::Neutral => "Neutral",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Bullish => "sentiment--bullish",
            Tone::Bearish => "sentiment--bearish",
            Tone::Neutral => "sentiment--neutral",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tone::Bullish => "⬆️",
            Tone::Bearish => "⬇️",
            Tone::Neutral => "➡️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentBadge {
    pub tone: Tone,
    pub label: String,
}

impl SentimentBadge {
    fn plain(tone: Tone) -> Self {
        Self {
            tone,
            label: tone.label().to_string(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        self.tone.css_class()
    }

    /// Icon and label as displayed inside the badge.
    pub fn text(&self) -> String {
        format!("{} {}", self.tone.icon(), self.label)
    }
}

/// Pick the sentiment value for a news item: `sentiment`, else `sentiment_score`.
pub fn select<'a>(sentiment: Option<&'a Value>, score: Option<&'a Value>) -> Option<&'a Value> {
    sentiment
        .filter(|value| !value.is_null())
        .or_else(|| score.filter(|value| !value.is_null()))
}

/// Map a label or numeric score to a badge; anything unrecognized yields `None`.
pub fn normalize(value: &Value) -> Option<SentimentBadge> {
    match value {
        Value::String(text) => {
            let folded = text.trim().to_lowercase();
            if folded.is_empty() {
                return None;
            }
            if let Some(tone) = tone_for_label(&folded) {
                return Some(SentimentBadge::plain(tone));
            }
            folded
                .parse::<f64>()
                .ok()
                .filter(|score| score.is_finite())
                .map(from_score)
        }
        Value::Number(number) => number
            .as_f64()
            .filter(|score| score.is_finite())
            .map(from_score),
        _ => None,
    }
}

fn tone_for_label(label: &str) -> Option<Tone> {
    if BULLISH_LABELS.contains(&label) {
        Some(Tone::Bullish)
    } else if BEARISH_LABELS.contains(&label) {
        Some(Tone::Bearish)
    } else if NEUTRAL_LABELS.contains(&label) {
        Some(Tone::Neutral)
    } else {
        None
    }
}

fn from_score(score: f64) -> SentimentBadge {
    if score > NEUTRAL_BAND {
        SentimentBadge {
            tone: Tone::Bullish,
            label: format!("Bullish {}", round_hundredths(score)),
        }
    } else if score < -NEUTRAL_BAND {
        SentimentBadge {
            tone: Tone::Bearish,
            label: format!("Bearish {}", round_hundredths(score)),
        }
    } else {
        SentimentBadge::plain(Tone::Neutral)
    }
}

/// Round half up to two decimals; `Display` drops trailing zeros.
fn round_hundredths(score: f64) -> f64 {
    (score * 100.0 + 0.5).floor() / 100.0
}
