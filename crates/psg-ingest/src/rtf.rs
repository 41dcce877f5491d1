//! Rich text to plain text conversion for Deltamed event logs.
//!
//! Only what the event log export needs: paragraph and tab controls become
//! whitespace, `\'hh` and `\uN` escapes become characters, and destination
//! groups (font and colour tables, document info, pictures, headers) are
//! skipped entirely.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\\([a-z]{1,32})(-?\d{1,10})?[ ]?|\\'([0-9a-f]{2})|\\([^a-z])|([{}])|[\r\n]+|(.)")
        .expect("Invalid RTF token regex")
});

/// Formatting leftovers that survive conversion in some exports.
static CONTROL_SEQUENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\*?\\.+(;\})|\s?\\[A-Za-z0-9]+|\s?\{\s?\\[A-Za-z0-9]+\s?|\s?\}\s?")
        .expect("Invalid RTF control sequence regex")
});

/// Control words opening a group whose text is not document content.
const DESTINATIONS: &[&str] = &[
    "author",
    "bkmkend",
    "bkmkstart",
    "buptim",
    "colortbl",
    "comment",
    "company",
    "creatim",
    "datastore",
    "doccomm",
    "fldinst",
    "fonttbl",
    "footer",
    "footerf",
    "footerl",
    "footerr",
    "generator",
    "header",
    "headerf",
    "headerl",
    "headerr",
    "info",
    "keywords",
    "latentstyles",
    "listoverridetable",
    "listtable",
    "objdata",
    "object",
    "operator",
    "pict",
    "printim",
    "revtim",
    "rsidtbl",
    "stylesheet",
    "subject",
    "themedata",
    "title",
    "xmlnstbl",
];

fn special_char(word: &str) -> Option<&'static str> {
    let text = match word {
        "par" | "line" | "row" => "\n",
        "sect" | "page" => "\n\n",
        "tab" => "\t",
        "cell" | "nestcell" => "|",
        "emdash" => "\u{2014}",
        "endash" => "\u{2013}",
        "emspace" => "\u{2003}",
        "enspace" => "\u{2002}",
        "qmspace" => "\u{2005}",
        "bullet" => "\u{2022}",
        "lquote" => "\u{2018}",
        "rquote" => "\u{2019}",
        "ldblquote" => "\u{201C}",
        "rdblquote" => "\u{201D}",
        _ => return None,
    };
    Some(text)
}

/// Extracts the visible text of an RTF document.
///
/// `\'hh` escapes are read as Latin-1 bytes.
pub fn rtf_to_text(rtf: &str) -> String {
    let mut out = String::with_capacity(rtf.len() / 2);
    // (unicode skip count, ignorable) saved per open group
    let mut stack: Vec<(usize, bool)> = Vec::new();
    let mut ignorable = false;
    let mut uc_skip = 1usize;
    let mut pending_skip = 0usize;

    for caps in TOKEN_REGEX.captures_iter(rtf) {
        if let Some(brace) = caps.get(5) {
            pending_skip = 0;
            if brace.as_str() == "{" {
                stack.push((uc_skip, ignorable));
            } else if let Some((skip, ignore)) = stack.pop() {
                uc_skip = skip;
                ignorable = ignore;
            }
        } else if let Some(symbol) = caps.get(4) {
            pending_skip = 0;
            match symbol.as_str() {
                "~" if !ignorable => out.push('\u{A0}'),
                "{" | "}" | "\\" if !ignorable => out.push_str(symbol.as_str()),
                "*" => ignorable = true,
                _ => {}
            }
        } else if let Some(word) = caps.get(1) {
            pending_skip = 0;
            let word = word.as_str();
            let arg = caps.get(2).and_then(|m| m.as_str().parse::<i64>().ok());
            if DESTINATIONS.contains(&word) {
                ignorable = true;
            } else if ignorable {
                continue;
            } else if let Some(text) = special_char(word) {
                out.push_str(text);
            } else if word == "uc" {
                uc_skip = arg.and_then(|n| usize::try_from(n).ok()).unwrap_or(1);
            } else if word == "u"
                && let Some(code) = arg
            {
                let code = if code < 0 { code + 0x1_0000 } else { code };
                if let Some(ch) = u32::try_from(code).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
                pending_skip = uc_skip;
            }
        } else if let Some(hex) = caps.get(3) {
            if pending_skip > 0 {
                pending_skip -= 1;
            } else if !ignorable && let Ok(byte) = u8::from_str_radix(hex.as_str(), 16) {
                out.push(char::from(byte));
            }
        } else if let Some(text) = caps.get(6) {
            if pending_skip > 0 {
                pending_skip -= 1;
            } else if !ignorable {
                out.push_str(text.as_str());
            }
        }
    }
    out
}

/// Replaces leftover formatting sequences with `;`.
pub fn replace_control_sequences(text: &str) -> String {
    CONTROL_SEQUENCE_REGEX.replace_all(text, ";").into_owned()
}
