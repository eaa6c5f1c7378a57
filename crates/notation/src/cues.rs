//! Structured cue extraction.
//!
//! Writers often sketch a scene as a loose outline:
//!
//! ```text
//! # The Night Market
//! ## Opening
//! - Character: Kara, Old_Finn
//! - สถานที่: Harbour district
//! - Tone: tense
//! ```
//!
//! Each recognised line is pulled into [`StructuredCues`] so the assembler
//! can hand the model a labeled summary alongside the raw instruction.

use crate::lore::extract_mentions;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `- Label: value`, accepting both the ASCII and the full-width colon.
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*([^:：]+?)\s*[:：]\s*(.*)$").expect("field pattern is valid")
});

const CHARACTER_LABELS: &[&str] = &["character", "ตัวละคร", "char"];
const SETTING_LABELS: &[&str] = &["setting", "สถานที่", "location"];
const PLOT_LABELS: &[&str] = &["plot point", "plot", "โครงเรื่องย่อย", "โครงฉาก"];
const TONE_LABELS: &[&str] = &["tone", "โทน", "อารมณ์"];
const OBJECTIVE_LABELS: &[&str] = &["objective", "เป้าหมาย", "จุดประสงค์"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Character,
    Setting,
    PlotPoint,
    Tone,
    Objective,
}

impl Field {
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        let table: [(&[&str], Field); 5] = [
            (CHARACTER_LABELS, Field::Character),
            (SETTING_LABELS, Field::Setting),
            (PLOT_LABELS, Field::PlotPoint),
            (TONE_LABELS, Field::Tone),
            (OBJECTIVE_LABELS, Field::Objective),
        ];
        table
            .into_iter()
            .find(|(labels, _)| labels.contains(&label.as_str()))
            .map(|(_, field)| field)
    }
}

/// Cues pulled out of an instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCues {
    pub title: Option<String>,
    pub sections: Vec<String>,
    pub characters: Vec<String>,
    pub settings: Vec<String>,
    pub plot_points: Vec<String>,
    pub tones: Vec<String>,
    pub objectives: Vec<String>,
}

impl StructuredCues {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.sections.is_empty()
            && self.characters.is_empty()
            && self.settings.is_empty()
            && self.plot_points.is_empty()
            && self.tones.is_empty()
            && self.objectives.is_empty()
    }

    /// Render as a labeled context block. Empty cues render as `""`.
    pub fn to_block(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut lines = vec!["[Structured Cues]".to_string()];
        if let Some(title) = &self.title {
            lines.push(format!("Title: {title}"));
        }
        let lists: [(&str, &Vec<String>, &str); 6] = [
            ("Sections", &self.sections, "; "),
            ("Characters", &self.characters, ", "),
            ("Setting", &self.settings, "; "),
            ("Plot Points", &self.plot_points, "; "),
            ("Tone", &self.tones, ", "),
            ("Objectives", &self.objectives, "; "),
        ];
        for (label, values, sep) in lists {
            if !values.is_empty() {
                lines.push(format!("{label}: {}", values.join(sep)));
            }
        }
        lines.join("\n")
    }

    fn push_character(&mut self, raw: &str) {
        let name = raw.replace('_', " ");
        let name = name.trim();
        if !name.is_empty() && !self.characters.iter().any(|c| c == name) {
            self.characters.push(name.to_string());
        }
    }
}

/// Extract structured cues line by line.
///
/// `# ` sets the title (first one wins), `## ` accumulates sections, and
/// `- Label: value` lines are matched against the bilingual label sets.
/// Every `@name` in the text is also added to the character list.
pub fn extract_cues(text: &str) -> StructuredCues {
    let mut cues = StructuredCues::default();

    for line in text.lines() {
        let line = line.trim();

        if let Some(section) = line.strip_prefix("## ") {
            let section = section.trim();
            if !section.is_empty() {
                cues.sections.push(section.to_string());
            }
            continue;
        }
        if let Some(title) = line.strip_prefix("# ") {
            let title = title.trim();
            if cues.title.is_none() && !title.is_empty() {
                cues.title = Some(title.to_string());
            }
            continue;
        }

        let Some(cap) = FIELD_RE.captures(line) else {
            continue;
        };
        let (Some(label), Some(value)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let value = value.as_str().trim();
        if value.is_empty() {
            continue;
        }

        match Field::from_label(label.as_str()) {
            Some(Field::Character) => {
                for name in value.split([',', '，']) {
                    cues.push_character(name);
                }
            }
            Some(Field::Setting) => cues.settings.push(value.to_string()),
            Some(Field::PlotPoint) => cues.plot_points.push(value.to_string()),
            Some(Field::Tone) => cues.tones.push(value.to_string()),
            Some(Field::Objective) => cues.objectives.push(value.to_string()),
            None => {}
        }
    }

    for name in extract_mentions(text) {
        cues.push_character(&name);
    }

    cues
}
