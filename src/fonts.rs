//! Text measurement and word wrapping.
//!
//! No font files are loaded. The document uses the PDF builtin Helvetica,
//! measured with an average-advance heuristic; the raster card draws fixed
//! 8×8 glyphs, so its width is exact.

/// How wide a run of text is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextMetrics {
    /// Builtin Helvetica: about 0.5 em per char, bold about 10 % wider.
    Helvetica { font_size: f32, bold: bool },
    /// Fixed advance per char (raster glyphs).
    Monospace { advance: f32 },
}

impl TextMetrics {
    pub fn measure(&self, text: &str) -> f32 {
        let chars = text.chars().count() as f32;
        match *self {
            TextMetrics::Helvetica { font_size, bold } => {
                let avg = if bold { 0.55 } else { 0.5 };
                chars * font_size * avg
            }
            TextMetrics::Monospace { advance } => chars * advance,
        }
    }
}

/// Word-wrap `text` to fit within `max_width`. Words wider than a whole line
/// are broken at the character that overflows.
pub fn wrap_text(text: &str, max_width: f32, metrics: TextMetrics) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if metrics.measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = break_word(word, max_width, metrics, &mut lines);
        }
        lines.push(current);
    }
    lines
}

/// Push full-width slices of an oversized word into `lines`; return the tail.
fn break_word(word: &str, max_width: f32, metrics: TextMetrics, lines: &mut Vec<String>) -> String {
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if metrics.measure(&piece) > max_width && piece.chars().count() > 1 {
            piece.pop();
            lines.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    piece
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELV: TextMetrics = TextMetrics::Helvetica {
        font_size: 16.0,
        bold: false,
    };

    #[test]
    fn heuristic_text_width() {
        // 5 chars × 16 × 0.5 = 40
        assert!((HELV.measure("Hello") - 40.0).abs() < 0.1);
    }

    #[test]
    fn monospace_width() {
        let mono = TextMetrics::Monospace { advance: 8.0 };
        assert_eq!(mono.measure("GWGM001"), 56.0);
    }

    #[test]
    fn word_wrap_basic() {
        let lines = wrap_text("Hello world foo bar", 60.0, HELV);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        assert_eq!(lines.join(" "), "Hello world foo bar");
    }

    #[test]
    fn long_word_is_broken() {
        let mono = TextMetrics::Monospace { advance: 8.0 };
        let lines = wrap_text("Name: Abcdefghijklmnop", 64.0, mono);
        assert_eq!(lines, vec!["Name:", "Abcdefgh", "ijklmnop"]);
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("Uyo", 200.0, HELV), vec!["Uyo"]);
    }
}
