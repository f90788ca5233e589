//! Positioned text extraction from PDF content streams
//!
//! Walks a page's content stream tracking the text cursor through the
//! positioning operators (Tm, Td, TD, TL, T*) and records every show
//! operator (Tj, ', ", TJ) as a [`Word`] with its x/y origin. Statement
//! PDFs place each table cell with its own positioning operator, so one
//! show op corresponds to one word. Glyph-width advances are not modeled.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::Result;

/// A piece of text with its position on the page.
///
/// Coordinates are PDF user space: y grows upward, so larger y means
/// closer to the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn string_text(obj: &Object) -> Option<String> {
    match obj {
        // Statement text is ASCII; treat bytes as Latin-1
        Object::String(bytes, _) => Some(bytes.iter().map(|&b| b as char).collect()),
        _ => None,
    }
}

/// Extract all positioned words from one page's content stream.
pub fn extract_page_words(doc: &Document, page_id: ObjectId) -> Result<Vec<Word>> {
    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;

    let mut words = Vec::new();
    let mut x = 0.0_f64;
    let mut y = 0.0_f64;
    let mut leading = 0.0_f64;

    let push_word = |text: String, x: f64, y: f64, words: &mut Vec<Word>| {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            words.push(Word {
                text: trimmed.to_string(),
                x,
                y,
            });
        }
    };

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
            }
            "Tm" => {
                if operands.len() == 6 {
                    if let (Some(e), Some(f)) = (number(&operands[4]), number(&operands[5])) {
                        x = e;
                        y = f;
                    }
                }
            }
            "Td" => {
                if operands.len() == 2 {
                    if let (Some(tx), Some(ty)) = (number(&operands[0]), number(&operands[1])) {
                        x += tx;
                        y += ty;
                    }
                }
            }
            "TD" => {
                if operands.len() == 2 {
                    if let (Some(tx), Some(ty)) = (number(&operands[0]), number(&operands[1])) {
                        leading = -ty;
                        x += tx;
                        y += ty;
                    }
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(number) {
                    leading = l;
                }
            }
            "T*" => {
                y -= leading;
            }
            "Tj" => {
                if let Some(text) = operands.first().and_then(string_text) {
                    push_word(text, x, y, &mut words);
                }
            }
            "'" => {
                y -= leading;
                if let Some(text) = operands.first().and_then(string_text) {
                    push_word(text, x, y, &mut words);
                }
            }
            "\"" => {
                y -= leading;
                if let Some(text) = operands.get(2).and_then(string_text) {
                    push_word(text, x, y, &mut words);
                }
            }
            "TJ" => {
                // Array of strings and kerning adjustments; the strings
                // concatenate into a single shown run.
                if let Some(Object::Array(items)) = operands.first() {
                    let text: String = items.iter().filter_map(string_text).collect();
                    push_word(text, x, y, &mut words);
                }
            }
            _ => {}
        }
    }

    Ok(words)
}

/// Group positioned words into reading-order lines.
///
/// Words whose y positions differ by at most `tolerance` belong to the
/// same line. Lines come out top-to-bottom, words within a line
/// left-to-right.
pub fn group_into_lines(words: &[Word], tolerance: f64) -> Vec<Vec<String>> {
    if words.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Word> = words.iter().collect();
    // y descending puts the top of the page first
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut current: Vec<&Word> = vec![sorted[0]];
    let mut current_y = sorted[0].y;

    for word in &sorted[1..] {
        if (word.y - current_y).abs() <= tolerance {
            current.push(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push(word);
            current_y = word.y;
        }
    }
    lines.push(current);

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
            line.into_iter().map(|w| w.text.clone()).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64) -> Word {
        Word {
            text: text.to_string(),
            x,
            y,
        }
    }

    #[test]
    fn test_group_empty() {
        assert!(group_into_lines(&[], 3.0).is_empty());
    }

    #[test]
    fn test_group_orders_top_to_bottom() {
        let words = vec![
            word("second", 10.0, 700.0),
            word("first", 10.0, 720.0),
        ];
        let lines = group_into_lines(&words, 3.0);
        assert_eq!(lines, vec![vec!["first".to_string()], vec!["second".to_string()]]);
    }

    #[test]
    fn test_group_joins_within_tolerance() {
        let words = vec![
            word("b", 50.0, 699.0),
            word("a", 10.0, 700.0),
            word("c", 90.0, 701.5),
        ];
        let lines = group_into_lines(&words, 3.0);
        assert_eq!(
            lines,
            vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
        );
    }

    #[test]
    fn test_group_sorts_words_by_x() {
        let words = vec![
            word("right", 200.0, 700.0),
            word("left", 10.0, 700.0),
            word("mid", 100.0, 700.0),
        ];
        let lines = group_into_lines(&words, 3.0);
        assert_eq!(
            lines[0],
            vec!["left".to_string(), "mid".to_string(), "right".to_string()]
        );
    }
}
