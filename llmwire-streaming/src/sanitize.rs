//! Unicode noise removal for model output.

use std::borrow::Cow;

/// A UTF-8 byte-order mark decoded as Latin-1.
const MISDECODED_BOM: &str = "\u{00EF}\u{00BB}\u{00BF}";

/// Strip characters that must never reach an output channel.
///
/// Removes replacement characters, byte-order marks (including the
/// misdecoded three-character form), control characters other than tab,
/// LF and CR, and zero-width/bidi controls in U+200B–U+200F, U+202A–U+202E
/// and U+2060–U+206F. Returns the input unchanged when nothing matches.
///
/// Lone UTF-16 surrogates cannot occur in a Rust `str`; the incremental
/// decoder has already turned them into U+FFFD, which is stripped here.
#[must_use]
pub fn sanitize(text: &str) -> Cow<'_, str> {
    let has_bom = text.contains(MISDECODED_BOM);
    if !has_bom && !text.chars().any(is_noise) {
        return Cow::Borrowed(text);
    }

    let text: Cow<'_, str> = if has_bom {
        Cow::Owned(text.replace(MISDECODED_BOM, ""))
    } else {
        Cow::Borrowed(text)
    };
    Cow::Owned(text.chars().filter(|c| !is_noise(*c)).collect())
}

fn is_noise(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{FFFD}'
        | '\u{FEFF}'
        | '\u{200B}'..='\u{200F}'
        | '\u{202A}'..='\u{202E}'
        | '\u{2060}'..='\u{206F}' => true,
        c => c.is_control(),
    }
}
