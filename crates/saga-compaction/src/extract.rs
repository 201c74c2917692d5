//! Summarizer output extraction.
//!
//! Generation backends rarely return the summary alone: replies arrive
//! wrapped in `<result>` tags, preceded by reasoning, or trailed by
//! commentary. Extraction anchors on the RIGHTMOST closing tag and the
//! nearest opening tag before it, so reasoning that itself quotes a
//! `<result>` block never wins over the final answer.

use tracing::warn;

const RESULT_START: &str = "<result>";
const RESULT_END: &str = "</result>";

/// Pull the usable summary out of a raw summarizer reply.
///
/// Resolution order:
/// 1. Rightmost `</result>` paired with the nearest `<result>` before it.
/// 2. A dangling `<result>` with no close, accepted only when what
///    follows it reads like enumerated summary lines.
/// 3. The whole reply with tag fragments stripped.
///
/// The result is trimmed but otherwise verbatim; an empty result is the
/// caller's problem to classify.
#[must_use]
pub fn extract_result(raw: &str) -> String {
    if let Some(end) = raw.rfind(RESULT_END) {
        if let Some(start) = raw[..end].rfind(RESULT_START) {
            return raw[start + RESULT_START.len()..end].trim().to_string();
        }
        warn!("closing result tag with no opener, falling back to cleanup");
    } else if let Some(start) = raw.rfind(RESULT_START) {
        let tail = raw[start + RESULT_START.len()..].trim();
        if looks_like_summary_lines(tail) {
            warn!("result tag never closed, trusting trailing content");
            return tail.to_string();
        }
    }

    strip_noise(raw)
}

/// True when most non-blank lines look like enumerated or bulleted
/// summary output rather than free-running prose.
fn looks_like_summary_lines(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return false;
    }
    let structured = lines.iter().filter(|l| is_list_line(l)).count();
    structured * 2 >= lines.len()
}

fn is_list_line(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Last resort: drop tag fragments and code-fence markers, keep the rest.
fn strip_noise(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .replace(RESULT_START, "")
        .replace(RESULT_END, "")
        .trim()
        .to_string()
}
