//! Curriculum analysis page extraction.
//!
//! The page renders one `fieldset` per requirement group ("etapa"), each with
//! a legend and a table. The legend becomes the stage name and every valid
//! body row becomes a header-keyed mapping under that stage.

use super::Extracted;
use crate::error::UfrgsError;
use crate::session::{UfrgsSession, CURRICULUM_URL};
use crate::types::CurriculumStage;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

static FIELDSET_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("fieldset.fieldset-2.moldura").unwrap());
static LEGEND_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("legend").unwrap());
static HEADER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table thead tr th").unwrap());
static TBODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tbody").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Fetches and parses the curriculum analysis for the logged-in student.
pub fn fetch_curriculum(
    session: &UfrgsSession,
) -> Result<Extracted<Vec<CurriculumStage>>, UfrgsError> {
    let html = session.fetch(CURRICULUM_URL)?;
    Ok(parse_curriculum(&html).logged("curriculum"))
}

/// Parses the curriculum analysis page.
///
/// Rows whose cell count does not match the group's header count are skipped
/// (the portal renders merged/irregular rows for notes). Groups that share a
/// legend accumulate into one stage rather than overwriting each other.
pub fn parse_curriculum(html: &str) -> Extracted<Vec<CurriculumStage>> {
    let document = Html::parse_document(html);
    let mut result = Extracted::new(Vec::new());

    let mut found_any = false;
    for (idx, fieldset) in document.select(&FIELDSET_SELECTOR).enumerate() {
        found_any = true;
        let idx = idx + 1;

        let Some(legend) = fieldset.select(&LEGEND_SELECTOR).next() else {
            result.diag(format!("fieldset {idx} has no legend, skipping"));
            continue;
        };
        let stage_name = text_of(&legend);

        let headers: Vec<String> = fieldset
            .select(&HEADER_SELECTOR)
            .map(|th| text_of(&th))
            .collect();
        if headers.is_empty() {
            result.diag(format!("fieldset {idx} has no table headers, skipping"));
            continue;
        }

        let Some(tbody) = fieldset.select(&TBODY_SELECTOR).next() else {
            result.diag(format!("fieldset {idx} has no table body, skipping"));
            continue;
        };

        let mut rows = Vec::new();
        for row in tbody.select(&ROW_SELECTOR) {
            let cells: Vec<String> = row.select(&CELL_SELECTOR).map(|td| text_of(&td)).collect();
            if cells.len() != headers.len() {
                continue;
            }
            let mapping: HashMap<String, String> =
                headers.iter().cloned().zip(cells).collect();
            rows.push(mapping);
        }
        if rows.is_empty() {
            result.diag(format!("fieldset {idx} has no table rows, skipping"));
            continue;
        }

        let stages: &mut Vec<CurriculumStage> = &mut result.data;
        match stages.iter_mut().find(|stage| stage.name == stage_name) {
            Some(stage) => stage.rows.extend(rows),
            None => stages.push(CurriculumStage {
                name: stage_name,
                rows,
            }),
        }
    }

    if !found_any {
        result.diag("no curriculum fieldsets found on the page");
    }
    result
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fieldset(legend: &str, rows: &str) -> String {
        format!(
            r#"<fieldset class="fieldset-2 moldura">
                 <legend>{legend}</legend>
                 <table>
                   <thead><tr><th>Sigla</th><th>Nome da Atividade</th><th>Situação</th></tr></thead>
                   <tbody>{rows}</tbody>
                 </table>
               </fieldset>"#
        )
    }

    #[test]
    fn test_rows_keyed_by_header() {
        let html = fieldset(
            "Etapa 1",
            "<tr><td>INF01202</td><td>Algoritmos</td><td>Liberada</td></tr>",
        );
        let extracted = parse_curriculum(&html);
        assert!(extracted.diagnostics.is_empty());
        assert_eq!(extracted.data.len(), 1);

        let stage = &extracted.data[0];
        assert_eq!(stage.name, "Etapa 1");
        assert_eq!(stage.rows.len(), 1);
        assert_eq!(stage.rows[0]["Sigla"], "INF01202");
        assert_eq!(stage.rows[0]["Situação"], "Liberada");
    }

    #[test]
    fn test_irregular_row_skipped() {
        let html = fieldset(
            "Etapa 1",
            "<tr><td>INF01202</td><td>Algoritmos</td><td>Liberada</td></tr>
             <tr><td colspan=\"3\">Observação geral</td></tr>",
        );
        let extracted = parse_curriculum(&html);
        assert_eq!(extracted.data[0].rows.len(), 1);
    }

    #[test]
    fn test_shared_legend_accumulates() {
        let html = format!(
            "{}{}",
            fieldset(
                "Etapa 1",
                "<tr><td>INF01202</td><td>Algoritmos</td><td>Liberada</td></tr>"
            ),
            fieldset(
                "Etapa 1",
                "<tr><td>MAT01353</td><td>Cálculo I</td><td>Liberada</td></tr>"
            ),
        );
        let extracted = parse_curriculum(&html);
        assert_eq!(extracted.data.len(), 1);
        assert_eq!(extracted.data[0].rows.len(), 2);
    }

    #[test]
    fn test_missing_legend_is_diagnostic() {
        let html = r#"<fieldset class="fieldset-2 moldura"><table>
            <thead><tr><th>Sigla</th></tr></thead>
            <tbody><tr><td>INF01202</td></tr></tbody>
        </table></fieldset>"#;
        let extracted = parse_curriculum(html);
        assert!(extracted.data.is_empty());
        assert_eq!(extracted.diagnostics.len(), 1);
        assert!(extracted.diagnostics[0].contains("no legend"));
    }

    #[test]
    fn test_empty_page_is_diagnostic() {
        let extracted = parse_curriculum("<html><body></body></html>");
        assert!(extracted.data.is_empty());
        assert!(!extracted.diagnostics.is_empty());
    }
}
