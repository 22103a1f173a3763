//! Enrollment info extraction and course-code resolution.

use super::Extracted;
use crate::error::UfrgsError;
use crate::session::{UfrgsSession, ENROLLMENT_URL, SCHEDULE_URL};
use crate::similarity;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static ENROLLMENT_BLOCK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("fieldset.moldura").unwrap());
static COURSE_SELECT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select#selecionado").unwrap());
static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());
static COURSE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Habilitação:\s*(.+)").unwrap());

/// Fetches the enrollment page and extracts the student's program name.
pub fn fetch_course_name(session: &UfrgsSession) -> Result<Extracted<Option<String>>, UfrgsError> {
    let html = session.fetch(ENROLLMENT_URL)?;
    Ok(parse_course_name(&html).logged("enrollment"))
}

/// Extracts the program name: the text following `Habilitação:` inside the
/// enrollment info block, up to end of line.
pub fn parse_course_name(html: &str) -> Extracted<Option<String>> {
    let document = Html::parse_document(html);
    let mut result = Extracted::new(None);

    let Some(block) = document.select(&ENROLLMENT_BLOCK_SELECTOR).next() else {
        result.diag("no enrollment info block found");
        return result;
    };

    let text = block.text().collect::<String>();
    match COURSE_NAME_RE.captures(&text) {
        Some(caps) => result.data = Some(caps[1].trim().to_string()),
        None => result.diag("enrollment block has no \"Habilitação:\" label"),
    }
    result
}

/// Fetches the course selection page and resolves the portal's internal code
/// for `course_name`.
pub fn fetch_course_code(
    session: &UfrgsSession,
    course_name: &str,
) -> Result<Extracted<Option<String>>, UfrgsError> {
    let html = session.fetch(SCHEDULE_URL)?;
    Ok(resolve_course_code(&html, course_name).logged("course selection"))
}

/// Picks the `select#selecionado` option whose label is most similar to
/// `course_name` and returns its value.
///
/// The enrollment label and the selector option are independently formatted
/// names for the same program, hence the fuzzy match. Both sides are
/// lowercased before scoring; on a tie the first option in document order
/// wins.
pub fn resolve_course_code(html: &str, course_name: &str) -> Extracted<Option<String>> {
    let document = Html::parse_document(html);
    let mut result = Extracted::new(None);

    let Some(select) = document.select(&COURSE_SELECT_SELECTOR).next() else {
        result.diag("no course selector (select#selecionado) found");
        return result;
    };

    let wanted = course_name.to_lowercase();
    let mut best: Option<(f64, String)> = None;
    for option in select.select(&OPTION_SELECTOR) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        let label = option.text().collect::<String>().trim().to_lowercase();
        let score = similarity::ratio(&label, &wanted);
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, value.to_string()));
        }
    }

    match best {
        Some((_, value)) => result.data = Some(value),
        None => result.diag("course selector has no options"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_name_extracted() {
        let html = r#"<fieldset class="moldura">
            Curso: Engenharia
            Habilitação: Engenharia de Computação
            Currículo: 2018
        </fieldset>"#;
        let extracted = parse_course_name(html);
        assert_eq!(
            extracted.data.as_deref(),
            Some("Engenharia de Computação")
        );
        assert!(extracted.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_block_and_missing_label_are_distinct() {
        let no_block = parse_course_name("<html><body></body></html>");
        assert_eq!(no_block.data, None);
        assert!(no_block.diagnostics[0].contains("block"));

        let no_label = parse_course_name(r#"<fieldset class="moldura">Curso: X</fieldset>"#);
        assert_eq!(no_label.data, None);
        assert!(no_label.diagnostics[0].contains("Habilitação"));
    }

    #[test]
    fn test_fuzzy_resolution_prefers_closest_label() {
        let html = r#"<select id="selecionado">
            <option value="101">Engenharia de Computação</option>
            <option value="202">Ciência da Computação</option>
        </select>"#;
        let extracted = resolve_course_code(html, "Eng. de Computação");
        assert_eq!(extracted.data.as_deref(), Some("101"));
    }

    #[test]
    fn test_resolution_is_case_insensitive() {
        let html = r#"<select id="selecionado">
            <option value="101">ENGENHARIA DE COMPUTAÇÃO</option>
            <option value="202">Ciência da Computação</option>
        </select>"#;
        let extracted = resolve_course_code(html, "engenharia de computação");
        assert_eq!(extracted.data.as_deref(), Some("101"));
    }

    #[test]
    fn test_missing_selector_is_diagnostic() {
        let extracted = resolve_course_code("<html></html>", "Engenharia");
        assert_eq!(extracted.data, None);
        assert!(extracted.diagnostics[0].contains("selector"));
    }
}
