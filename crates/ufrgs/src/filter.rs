//! Eligibility and time filtering over extracted data. Pure functions, no I/O.

use crate::types::{CurriculumStage, DisciplineOffering, EligibleDiscipline, ACTIVITY_COLUMN};
use regex::Regex;
use std::collections::HashSet;

/// Status column in the curriculum analysis.
pub const STATUS_COLUMN: &str = "Situação";
/// Status value meaning all prerequisites are satisfied.
pub const PREREQUISITES_OBTAINED: &str = "Pré-requisito(s) obtido(s)";
/// Prefix of administrative rows (enrollment-bond entries, not disciplines).
pub const ACADEMIC_BOND_PREFIX: &str = "VÍNCULO ACADÊMICO";

/// How a time pattern must relate to a section's schedule slots.
///
/// Both semantics are in active use: "find me a section fully inside my free
/// mornings" wants `All`, "anything touching Tuesday evening" wants `Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMatch {
    /// At least one slot's time text must match
    Any,
    /// Every slot's time text must match
    All,
}

/// Scans every stage for rows whose prerequisites are satisfied.
///
/// Administrative rows (activity name starting with the academic-bond marker)
/// are skipped. Rows are deduplicated by full equality, so the same row under
/// two different stages yields two entries while a repeat within one stage
/// yields one.
pub fn compute_eligible(stages: &[CurriculumStage]) -> Vec<EligibleDiscipline> {
    let mut eligible: Vec<EligibleDiscipline> = Vec::new();

    for stage in stages {
        for row in &stage.rows {
            if row
                .get(ACTIVITY_COLUMN)
                .is_some_and(|name| name.starts_with(ACADEMIC_BOND_PREFIX))
            {
                continue;
            }
            if row.get(STATUS_COLUMN).map(String::as_str) != Some(PREREQUISITES_OBTAINED) {
                continue;
            }
            let candidate = EligibleDiscipline {
                stage: stage.name.clone(),
                row: row.clone(),
            };
            if !eligible.contains(&candidate) {
                eligible.push(candidate);
            }
        }
    }
    eligible
}

/// Keeps only offerings whose code belongs to some eligible discipline.
pub fn intersect(
    offerings: Vec<DisciplineOffering>,
    eligible: &[EligibleDiscipline],
) -> Vec<DisciplineOffering> {
    let codes: HashSet<&str> = eligible.iter().filter_map(EligibleDiscipline::code).collect();
    offerings
        .into_iter()
        .filter(|offering| codes.contains(offering.code.as_str()))
        .collect()
}

/// Keeps only the sections whose schedule matches `pattern` under the given
/// mode, dropping disciplines left with no sections.
///
/// Discipline metadata is otherwise unchanged; matching sections are kept
/// whole, including their non-matching slots under [`SlotMatch::Any`].
pub fn filter_by_time(
    offerings: Vec<DisciplineOffering>,
    pattern: &Regex,
    mode: SlotMatch,
) -> Vec<DisciplineOffering> {
    offerings
        .into_iter()
        .filter_map(|mut offering| {
            offering.sections.retain(|section| match mode {
                SlotMatch::Any => section
                    .schedule
                    .iter()
                    .any(|slot| pattern.is_match(&slot.time)),
                SlotMatch::All => section
                    .schedule
                    .iter()
                    .all(|slot| pattern.is_match(&slot.time)),
            });
            if offering.sections.is_empty() {
                None
            } else {
                Some(offering)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassSection, ScheduleSlot};
    use std::collections::HashMap;

    fn row(name: &str, status: &str) -> HashMap<String, String> {
        HashMap::from([
            (ACTIVITY_COLUMN.to_string(), name.to_string()),
            (STATUS_COLUMN.to_string(), status.to_string()),
        ])
    }

    fn stage(name: &str, rows: Vec<HashMap<String, String>>) -> CurriculumStage {
        CurriculumStage {
            name: name.to_string(),
            rows,
        }
    }

    #[test]
    fn test_eligible_requires_exact_status() {
        let stages = vec![stage(
            "Etapa 1",
            vec![
                row("INF01202 Algoritmos", PREREQUISITES_OBTAINED),
                row("MAT01353 Cálculo I", "Pré-requisito(s) não obtido(s)"),
            ],
        )];
        let eligible = compute_eligible(&stages);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].code(), Some("INF01202"));
        assert_eq!(eligible[0].stage, "Etapa 1");
    }

    #[test]
    fn test_academic_bond_rows_skipped() {
        let stages = vec![stage(
            "Etapa 1",
            vec![row(
                "VÍNCULO ACADÊMICO - Cartão 123456",
                PREREQUISITES_OBTAINED,
            )],
        )];
        assert!(compute_eligible(&stages).is_empty());
    }

    #[test]
    fn test_dedup_within_stage_but_not_across_stages() {
        let shared = row("INF01202 Algoritmos", PREREQUISITES_OBTAINED);
        let stages = vec![
            stage("Etapa 1", vec![shared.clone(), shared.clone()]),
            stage("Etapa 2", vec![shared]),
        ];
        let eligible = compute_eligible(&stages);
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].stage, "Etapa 1");
        assert_eq!(eligible[1].stage, "Etapa 2");
    }

    fn offering(code: &str, sections: Vec<ClassSection>) -> DisciplineOffering {
        DisciplineOffering {
            code: code.to_string(),
            name: format!("Disciplina {code}"),
            credits: "4".to_string(),
            syllabus: String::new(),
            sections,
        }
    }

    fn section(times: &[&str]) -> ClassSection {
        ClassSection {
            attrs: HashMap::new(),
            schedule: times
                .iter()
                .map(|time| ScheduleSlot {
                    time: time.to_string(),
                    location: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_intersect_by_code() {
        let offerings = vec![offering("INF01202", vec![]), offering("MAT01353", vec![])];
        let eligible = vec![EligibleDiscipline {
            stage: "Etapa 1".to_string(),
            row: row("INF01202 Algoritmos", PREREQUISITES_OBTAINED),
        }];
        let kept = intersect(offerings, &eligible);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "INF01202");
    }

    #[test]
    fn test_filter_any_keeps_partially_matching_section() {
        let pattern = Regex::new("8:30|10:30").unwrap();
        let offerings = vec![offering(
            "INF01202",
            vec![
                section(&["Segunda 08:30 - 10:10", "Quarta 16:30 - 18:10"]),
                section(&["Sexta 18:30 - 20:10"]),
            ],
        )];
        let kept = filter_by_time(offerings, &pattern, SlotMatch::Any);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].sections.len(), 1);
        // The non-matching slot survives inside the kept section.
        assert_eq!(kept[0].sections[0].schedule.len(), 2);
    }

    #[test]
    fn test_filter_all_requires_every_slot() {
        let pattern = Regex::new("8:30|10:30").unwrap();
        let offerings = vec![offering(
            "INF01202",
            vec![
                section(&["Segunda 08:30 - 10:10", "Quarta 16:30 - 18:10"]),
                section(&["Segunda 08:30 - 10:10", "Quarta 10:30 - 12:10"]),
            ],
        )];
        let kept = filter_by_time(offerings, &pattern, SlotMatch::All);
        assert_eq!(kept[0].sections.len(), 1);
        assert_eq!(kept[0].sections[0].schedule[1].time, "Quarta 10:30 - 12:10");
    }

    #[test]
    fn test_discipline_with_no_matching_sections_dropped() {
        let pattern = Regex::new("8:30").unwrap();
        let offerings = vec![
            offering("INF01202", vec![section(&["Sexta 18:30 - 20:10"])]),
            offering("MAT01353", vec![section(&["Quarta 20:30 - 22:10"])]),
        ];
        // 18:30 contains "8:30"; only the 20:30 one is dropped.
        let kept = filter_by_time(offerings, &pattern, SlotMatch::Any);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "INF01202");
    }
}
