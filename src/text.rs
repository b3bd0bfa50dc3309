//! Arabic text editing helpers.
//!
//! Offsets in [`Selection`] count Unicode scalar values (`char`s), not bytes,
//! so a cursor position from an editor widget can be passed through directly.

use serde::{Deserialize, Serialize};

/// A short vowel or related mark on the insertion palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diacritic {
    pub label: &'static str,
    pub mark: char,
}

/// Marks offered on the diacritic keyboard, in palette order.
pub const DIACRITICS: [Diacritic; 8] = [
    Diacritic { label: "Fat-ha", mark: '\u{064E}' },
    Diacritic { label: "Dam-ma", mark: '\u{064F}' },
    Diacritic { label: "Kas-ra", mark: '\u{0650}' },
    Diacritic { label: "Sukūn", mark: '\u{0652}' },
    Diacritic { label: "Shad-da", mark: '\u{0651}' },
    Diacritic { label: "Tanwīn Fat-h", mark: '\u{064B}' },
    Diacritic { label: "Tanwīn Dam-m", mark: '\u{064C}' },
    Diacritic { label: "Tanwīn Kasr", mark: '\u{064D}' },
];

/// True for harakat, tanwin, shadda, sukun, maddah above, superscript alef
/// and tatweel.
pub fn is_tashkeel(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{0652}' | '\u{0653}' | '\u{0670}' | '\u{0640}')
}

/// A half-open `[start, end)` range of char offsets. `start == end` is a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn cursor(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn clamp(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// Byte offset of char offset `idx`, or `text.len()` past the end.
fn byte_offset(text: &str, idx: usize) -> usize {
    text.char_indices()
        .nth(idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Replace the selected range with `mark`, returning the new text and the
/// cursor position just after the inserted mark.
pub fn insert_at(text: &str, selection: Selection, mark: char) -> (String, usize) {
    let sel = selection.clamp(text.chars().count());
    let start = byte_offset(text, sel.start);
    let end = byte_offset(text, sel.end);

    let mut out = String::with_capacity(text.len() + mark.len_utf8());
    out.push_str(&text[..start]);
    out.push(mark);
    out.push_str(&text[end..]);
    (out, sel.start + 1)
}

/// Remove every tashkeel mark from `text`.
pub fn strip_tashkeel(text: &str) -> String {
    text.chars().filter(|&c| !is_tashkeel(c)).collect()
}

/// Remove tashkeel from the selected range only.
///
/// An empty selection cleans the whole text. The returned selection covers
/// the cleaned part so an editor can keep it highlighted.
pub fn strip_tashkeel_in(text: &str, selection: Selection) -> (String, Selection) {
    let sel = selection.clamp(text.chars().count());
    if sel.is_empty() {
        let cleaned = strip_tashkeel(text);
        let len = cleaned.chars().count();
        return (cleaned, Selection::cursor(sel.start.min(len)));
    }

    let start = byte_offset(text, sel.start);
    let end = byte_offset(text, sel.end);
    let cleaned = strip_tashkeel(&text[start..end]);
    let cleaned_len = cleaned.chars().count();

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&cleaned);
    out.push_str(&text[end..]);
    (out, Selection::new(sel.start, sel.start + cleaned_len))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonCategory {
    Alphabet,
    Phrases,
    Grammar,
}

/// A ready-made practice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub title: &'static str,
    pub content: &'static str,
    pub category: LessonCategory,
}

pub const PRESET_LESSONS: [Lesson; 4] = [
    Lesson {
        category: LessonCategory::Alphabet,
        title: "الحروف الهجائية",
        content: "أ ب ت ث ج ح خ د ذ ر ز س ش ص ض ط ظ ع غ ف ق ك ل م ن ه و ي",
    },
    Lesson {
        category: LessonCategory::Phrases,
        title: "التحية والترحيب",
        content: "السَّلامُ عَلَيْكُمْ وَرَحْمَةُ اللهِ وَبَرَكَاتُهُ. كَيْفَ حَالُكَ اليوم؟",
    },
    Lesson {
        category: LessonCategory::Phrases,
        title: "في المدرسة",
        content: "أَيْنَ الكِتَابُ؟ الكِتَابُ عَلَى المَكْتَبِ. هَلْ فَهِمْتَ الدَّرْسَ؟",
    },
    Lesson {
        category: LessonCategory::Grammar,
        title: "جملة فعلية بسيطة",
        content: "ذَهَبَ الطَّالِبُ إِلَى المَدْرَسَةِ لِيَتَعَلَّمَ العُلُومَ النَّافِعَةَ.",
    },
];
