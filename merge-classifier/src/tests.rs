use crate::Classifier;
use crate::instances::{GRAMMAR_ORDER, GRAMMARS};
use chrono::{NaiveDate, NaiveDateTime};
use merge_traits::{DocumentType, ExtractError, PageText, TextSource};
use std::path::{Path, PathBuf};

fn classifier() -> Classifier {
    Classifier::radiotherapy().expect("built-in grammars compile")
}

fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

const ECLIPSE_PLAN: &str = "TREATMENT PLAN REPORTPatient IDs:123456BirthdatePlan ID:Prostate1Plan \
    Status: Approved Printed Wednesday, June 12, 2019 02:30:00 PM by jdoe";

const ONCENTRA_PLAN: &str = "Oncentra Brachy microSelectron v3 Patient Male45 DOE 19700101A100, \
    Plan Cervix Time zone: US Mountain Standard Time Printed by physicist on 01 Oct 2020 09:00:00 by Oncentra";

const ECLIPSE_DVH: &str = "DVHStructureStructure Status Patient IDs:123456Comment: \
    Plan HistoryProstate1C1 Printed Thursday, June 13, 2019 09:15:00 AM by jdoe";

const ONCENTRA_DVH: &str = "DVH values: Patient name: DOE A100Patient ID: 19700101 \
    Printed on 01-Oct-2020 12:00:00Time zone US Mountain";

const ECLIPSE_BEAMS_EYE: &str = "Fields in plan 'Prostate1' of course 'C1' \
    Patient Name:Course:Plan:DOE, JOHN (123456)C1 Field 'AP' plotted at 100% \
    Printed Wednesday, June 12, 2019 02:30 PM by jdoe";

const CLEARCHECK: &str = "ConstraintTemplateRTOG (v2)Prostate1PlanningApproved DOE, JOHN \
    (123456)BirthDate: 01/01/1970 printedby jdoe, 10/01/20209:30:00AMPage 1 of 2";

const LINAC_SECOND_CHECK: &str = "PhotonMonitor Unit Calc Patient ID#:123456Calculation Name:\
    Prostate1Comments: none Calculated By: jdoe 10/01/2020Checked By: asmith";

const BRACHY_SECOND_CHECK: &str = "BrachytherapyDosimetric Verification Patient Name:A100, DOE \
    Patient ID: 19700101 Calculated By: jdoe 10/01/2020Checked By: asmith";

#[test]
fn eclipse_plan_report() {
    let doc = classifier().classify(ECLIPSE_PLAN);
    assert_eq!(doc.document_type, DocumentType::EclipsePlan);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.plan_id.as_deref(), Some("Prostate1"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2019, 6, 12, 14, 30, 0)));
    assert_eq!(doc.field_id, None);
}

#[test]
fn oncentra_plan_report() {
    let doc = classifier().classify(ONCENTRA_PLAN);
    assert_eq!(doc.document_type, DocumentType::OncentraPlan);
    assert_eq!(doc.patient_id.as_deref(), Some("A100"));
    assert_eq!(doc.plan_id, None);
    assert_eq!(doc.printed_at, Some(ymd_hms(2020, 10, 1, 9, 0, 0)));
}

#[test]
fn eclipse_dvh_report() {
    let doc = classifier().classify(ECLIPSE_DVH);
    assert_eq!(doc.document_type, DocumentType::EclipseDvh);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.plan_id.as_deref(), Some("Prostate1"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2019, 6, 13, 9, 15, 0)));
}

#[test]
fn oncentra_dvh_report() {
    let doc = classifier().classify(ONCENTRA_DVH);
    assert_eq!(doc.document_type, DocumentType::OncentraDvh);
    assert_eq!(doc.patient_id.as_deref(), Some("A100"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2020, 10, 1, 12, 0, 0)));
}

#[test]
fn beams_eye_view_carries_field_name() {
    let doc = classifier().classify(ECLIPSE_BEAMS_EYE);
    assert_eq!(doc.document_type, DocumentType::EclipseBeamsEye);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.plan_id.as_deref(), Some("Prostate1"));
    assert_eq!(doc.field_id.as_deref(), Some("AP"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2019, 6, 12, 14, 30, 0)));
}

#[test]
fn clearcheck_report() {
    let doc = classifier().classify(CLEARCHECK);
    assert_eq!(doc.document_type, DocumentType::ClearCheck);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.plan_id.as_deref(), Some("Prostate1"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2020, 10, 1, 9, 30, 0)));
}

#[test]
fn linac_second_check() {
    let doc = classifier().classify(LINAC_SECOND_CHECK);
    assert_eq!(doc.document_type, DocumentType::LinacSecondCheck);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.plan_id.as_deref(), Some("Prostate1"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2020, 10, 1, 0, 0, 0)));
}

#[test]
fn brachy_second_check() {
    let doc = classifier().classify(BRACHY_SECOND_CHECK);
    assert_eq!(doc.document_type, DocumentType::BrachySecondCheck);
    assert_eq!(doc.patient_id.as_deref(), Some("A100"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2020, 10, 1, 0, 0, 0)));
}

#[test]
fn unknown_text_uses_fallback_fields() {
    let doc = classifier()
        .classify("Some other report (123456) Printed on Wednesday, June 12, 2019 02:30:00 PM by jdoe");
    assert_eq!(doc.document_type, DocumentType::Unknown);
    assert_eq!(doc.patient_id.as_deref(), Some("123456"));
    assert_eq!(doc.printed_at, Some(ymd_hms(2019, 6, 12, 14, 30, 0)));
}

#[test]
fn empty_text_is_unknown_without_fields() {
    let doc = classifier().classify("");
    assert_eq!(doc.document_type, DocumentType::Unknown);
    assert_eq!(doc.patient_id, None);
    assert_eq!(doc.plan_id, None);
    assert_eq!(doc.printed_at, None);
}

#[test]
fn marker_alone_is_enough() {
    let classifier = classifier();
    for spec in GRAMMARS.iter() {
        let marker = spec.marker.unwrap();
        let doc = classifier.classify(marker);
        assert_eq!(doc.document_type, spec.document_type, "marker {marker:?}");
        assert_eq!(doc.printed_at, None, "marker {marker:?}");
    }
}

#[test]
fn earlier_grammar_wins_when_markers_overlap() {
    let classifier = classifier();
    for (i, earlier) in GRAMMARS.iter().enumerate() {
        for later in GRAMMARS.iter().skip(i + 1) {
            // later marker first in the text, so position cannot be what decides
            let text = format!("{} {}", later.marker.unwrap(), earlier.marker.unwrap());
            assert_eq!(
                classifier.classify(&text).document_type,
                GRAMMAR_ORDER[i],
                "{text:?}"
            );
        }
    }
}

#[test]
fn plan_report_wins_over_its_own_dvh_marker() {
    let text = format!("{ONCENTRA_DVH} {ONCENTRA_PLAN}");
    assert_eq!(classifier().classify(&text).document_type, DocumentType::OncentraPlan);
}

struct FakeSource;

impl TextSource for FakeSource {
    fn first_page(&self, path: &Path) -> Result<PageText, ExtractError> {
        match path.to_str() {
            Some("plan.pdf") => Ok(PageText {
                text: ONCENTRA_PLAN.to_string(),
                page_count: 12,
            }),
            _ => Err(ExtractError::NoPages {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[test]
fn classify_file_attaches_source() {
    let doc = classifier()
        .classify_file(Path::new("plan.pdf"), &FakeSource)
        .unwrap();
    assert_eq!(doc.source_path, PathBuf::from("plan.pdf"));
    assert_eq!(doc.page_count, 12);
    assert_eq!(doc.document_type, DocumentType::OncentraPlan);
}

#[test]
fn unreadable_file_is_an_error_not_unknown() {
    let result = classifier().classify_file(Path::new("broken.pdf"), &FakeSource);
    assert!(matches!(result, Err(ExtractError::NoPages { .. })));
}
