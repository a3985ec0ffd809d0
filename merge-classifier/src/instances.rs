use crate::ClassifierError;
use crate::pattern::*;
use merge_traits::{ClassifiedDocument, DocumentType};

/// Static description of one document grammar.
///
/// `marker` is the substring whose presence identifies the type; `None`
/// is reserved for the fallback grammar, which applies when nothing else does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarSpec {
    pub document_type: DocumentType,
    pub marker: Option<&'static str>,
    pub patient: Option<Pattern>,
    pub plan: Option<Pattern>,
    pub printed: Option<TimestampPattern>,
    pub field: Option<Pattern>,
}

/// The order grammars are tried in. First marker found wins.
pub const GRAMMAR_ORDER: [DocumentType; 8] = [
    DocumentType::EclipsePlan,
    DocumentType::OncentraPlan,
    DocumentType::EclipseDvh,
    DocumentType::OncentraDvh,
    DocumentType::EclipseBeamsEye,
    DocumentType::ClearCheck,
    DocumentType::LinacSecondCheck,
    DocumentType::BrachySecondCheck,
];

pub const GRAMMARS: [GrammarSpec; 8] = [
    GrammarSpec {
        document_type: DocumentType::EclipsePlan,
        marker: Some("TREATMENT PLAN REPORT"),
        patient: Some(Pattern::Capture(r"IDs:([0-9]*)Birthdate")),
        plan: Some(Pattern::Capture(r"Plan ID:(.*?)Plan")),
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Printed (.*?) by"),
            ECLIPSE_PRINTED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::OncentraPlan,
        marker: Some("microSelectron v3"),
        patient: Some(Pattern::Capture(r"ale[0-9]* .*? [0-9]*(.*?),")),
        plan: None,
        printed: Some(TimestampPattern::new(
            Pattern::Capture(
                r"US Mountain Standard Time.*? by .*?([0-9]* [A-Z][a-z][a-z] [0-9]* [0-9]*:[0-9]*:[0-9]*) by",
            ),
            ONCENTRA_PLAN_PRINTED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::EclipseDvh,
        marker: Some("DVHStructureStructure Status"),
        patient: Some(Pattern::Capture(r"Patient IDs:([0-9]*)Comment:")),
        plan: Some(Pattern::Capture(r"Plan History(.*?)C[0-9]")),
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Printed (.*?) by"),
            ECLIPSE_PRINTED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::OncentraDvh,
        marker: Some("DVH values:"),
        patient: Some(Pattern::Trimmed(r"Patient name.*?(\W\w*?)Patient ID")),
        plan: None,
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Printed.*?([0-9]*-\w*-[0-9]* [0-9]*:[0-9]*:[0-9]*)Time zone"),
            ONCENTRA_DVH_PRINTED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::EclipseBeamsEye,
        marker: Some("Fields in plan"),
        patient: Some(Pattern::Capture(r"Patient Name:Course:Plan:.* \(([0-9]*)\)C")),
        plan: Some(Pattern::Capture(r"in plan '(.*?)' of")),
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Printed (.*?) by"),
            ECLIPSE_PRINTED_SHORT,
        )),
        field: Some(Pattern::Capture(r"Field '(.*?)' plotted at")),
    },
    GrammarSpec {
        document_type: DocumentType::ClearCheck,
        marker: Some("ConstraintTemplate"),
        patient: Some(Pattern::Capture(r"\(([0-9]*)\)BirthDate:")),
        plan: Some(Pattern::Capture(r"\)(.*?)PlanningApproved")),
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"printedby.*?,.*?([0-9]*/[0-9]*/[0-9]*:[0-9]*:[0-9]*.*?)Page"),
            CLEARCHECK_PRINTED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::LinacSecondCheck,
        marker: Some("PhotonMonitor Unit Calc"),
        patient: Some(Pattern::Capture(r"Patient ID#:(.*?)Calculation Name")),
        plan: Some(Pattern::Capture(r"Calculation Name:(.*?)Comments")),
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Calculated By:.*? ([0-9]*/[0-9]*/[0-9]*)Checked By"),
            SECOND_CHECK_CALCULATED,
        )),
        field: None,
    },
    GrammarSpec {
        document_type: DocumentType::BrachySecondCheck,
        marker: Some("BrachytherapyDosimetric Verification"),
        patient: Some(Pattern::Capture(r"Patient Name:(.*?), .*?Patient ID")),
        plan: None,
        printed: Some(TimestampPattern::new(
            Pattern::Capture(r"Calculated By:.*? ([0-9]*/[0-9]*/[0-9]*)Checked By"),
            SECOND_CHECK_CALCULATED,
        )),
        field: None,
    },
];

/// Applied when no marker matched: a bare parenthesised numeric id and
/// an Eclipse style "Printed on ... by" stamp.
pub const FALLBACK: GrammarSpec = GrammarSpec {
    document_type: DocumentType::Unknown,
    marker: None,
    patient: Some(Pattern::Capture(r"\(([0-9]*)\)")),
    plan: None,
    printed: Some(TimestampPattern::new(
        Pattern::Capture(r"Printed on (.*?) by"),
        ECLIPSE_PRINTED,
    )),
    field: None,
};

/// A [GrammarSpec] with every pattern compiled.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) document_type: DocumentType,
    pub(crate) marker: Option<&'static str>,
    patient: Option<CompiledPattern>,
    plan: Option<CompiledPattern>,
    printed: Option<(CompiledPattern, TimestampFormat)>,
    field: Option<CompiledPattern>,
}

impl Grammar {
    pub fn compile(spec: &GrammarSpec) -> Result<Self, ClassifierError> {
        fn compile_opt(p: Option<Pattern>) -> Result<Option<CompiledPattern>, ClassifierError> {
            p.map(|p| p.compile()).transpose()
        }

        let printed = match spec.printed {
            Some(ts) => Some((ts.pattern.compile()?, ts.format)),
            None => None,
        };

        Ok(Self {
            document_type: spec.document_type,
            marker: spec.marker,
            patient: compile_opt(spec.patient)?,
            plan: compile_opt(spec.plan)?,
            printed,
            field: compile_opt(spec.field)?,
        })
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn marker(&self) -> Option<&'static str> {
        self.marker
    }

    /// Whether this grammar claims `text`. The fallback claims everything.
    pub fn matches(&self, text: &str) -> bool {
        match self.marker {
            Some(marker) => text.contains(marker),
            None => true,
        }
    }

    /// Runs every field pattern independently over `text`.
    pub fn extract(&self, text: &str) -> ClassifiedDocument {
        let mut doc = ClassifiedDocument::unclassified(self.document_type);

        doc.patient_id = self.patient.as_ref().and_then(|p| p.extract(text));
        doc.plan_id = self.plan.as_ref().and_then(|p| p.extract(text));
        doc.printed_at = self
            .printed
            .as_ref()
            .and_then(|(p, format)| format.parse(&p.extract(text)?));
        doc.field_id = self.field.as_ref().and_then(|p| p.extract(text));

        doc
    }
}
