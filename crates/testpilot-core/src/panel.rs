//! UI-agnostic feature panel state
//!
//! A panel owns the form values for one feature, the phase of its single
//! in-flight call and whatever that call last produced. It does not run the
//! call itself: `begin_submit` hands out a ticketed request, and the caller
//! reports back through `complete` with the same ticket. Completions carrying
//! any other ticket are ignored, which is how a call detached by a panel
//! switch is discarded.

use crate::error::FlowError;
use crate::features::{Feature, FeatureKey, ResultView};
use crate::flows::{FlowRequest, FlowResult};
use crate::schema::Fields;

/// How many UI ticks a notice stays visible
pub const NOTICE_TICKS: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Idle,
    Submitting { ticket: u64 },
}

/// Transient message shown over the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
    ticks_left: u16,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error",
            message: message.into(),
            ticks_left: NOTICE_TICKS,
        }
    }

    pub fn ticks_left(&self) -> u16 {
        self.ticks_left
    }
}

/// A request handed to the caller to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: u64,
    pub request: FlowRequest,
}

/// One block of the result area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultBlock<'a> {
    Field { view: &'static ResultView, value: &'a str },
    Fallback(&'static str),
}

#[derive(Debug)]
pub struct Panel {
    feature: &'static Feature,
    inputs: Vec<String>,
    phase: PanelPhase,
    result: Option<FlowResult>,
    notice: Option<Notice>,
    next_ticket: u64,
}

impl Panel {
    pub fn new(key: FeatureKey) -> Self {
        let feature = key.feature();
        Self {
            feature,
            inputs: feature.inputs.iter().map(|i| i.default.to_string()).collect(),
            phase: PanelPhase::Idle,
            result: None,
            notice: None,
            next_ticket: 1,
        }
    }

    pub fn feature(&self) -> &'static Feature {
        self.feature
    }

    pub fn key(&self) -> FeatureKey {
        self.feature.key
    }

    /// Form values, aligned with `feature().inputs`
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut String> {
        self.inputs.get_mut(index)
    }

    /// Set a form value by its request field name
    pub fn set_input(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.feature.inputs.iter().position(|i| i.name == name) {
            Some(index) => {
                self.inputs[index] = value.into();
                true
            }
            None => false,
        }
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, PanelPhase::Submitting { .. })
    }

    pub fn result(&self) -> Option<&FlowResult> {
        self.result.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The request the form currently describes; fixed fields are filled in.
    ///
    /// Nothing is validated here, the executor does that.
    pub fn build_request(&self) -> FlowRequest {
        let mut fields = Fields::new();
        for (input, value) in self.feature.inputs.iter().zip(&self.inputs) {
            fields.insert(input.name, value.clone());
        }
        for &(name, value) in self.feature.fixed {
            fields.insert(name, value);
        }
        FlowRequest::from_fields(self.feature.flow, fields)
    }

    /// Start a submission unless one is already in flight.
    ///
    /// Clears the previous result and notice.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.is_submitting() {
            return None;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.result = None;
        self.notice = None;
        self.phase = PanelPhase::Submitting { ticket };

        Some(Submission {
            ticket,
            request: self.build_request(),
        })
    }

    /// Apply the outcome of a submission. Returns false if `ticket` is stale.
    pub fn complete(&mut self, ticket: u64, outcome: Result<FlowResult, FlowError>) -> bool {
        if self.phase != (PanelPhase::Submitting { ticket }) {
            return false;
        }

        self.phase = PanelPhase::Idle;
        match outcome {
            Ok(result) => self.result = Some(result),
            Err(err) => self.notice = Some(Notice::error(err.to_string())),
        }
        true
    }

    /// Give up on the in-flight call, if any; returns its ticket
    pub fn detach(&mut self) -> Option<u64> {
        match self.phase {
            PanelPhase::Submitting { ticket } => {
                self.phase = PanelPhase::Idle;
                Some(ticket)
            }
            PanelPhase::Idle => None,
        }
    }

    /// Advance time by one UI tick, expiring the notice
    pub fn tick(&mut self) {
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// What the result area shows: non-empty fields in view order, or the
    /// feature's fallback line when every field is blank.
    pub fn result_blocks(&self) -> Vec<ResultBlock<'_>> {
        let Some(result) = &self.result else {
            return Vec::new();
        };

        let blocks: Vec<ResultBlock<'_>> = self
            .feature
            .results
            .iter()
            .filter_map(|view| {
                let value = result.field(view.field)?;
                (!value.trim().is_empty()).then_some(ResultBlock::Field { view, value })
            })
            .collect();

        match (blocks.is_empty(), self.feature.empty_result) {
            (true, Some(fallback)) => vec![ResultBlock::Fallback(fallback)],
            _ => blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, ValidationError};
    use crate::flows::{ExplainBugOutput, SmartCodeSuggestionsInput, SmartCodeSuggestionsOutput};

    fn explain_result() -> FlowResult {
        FlowResult::ExplainBug(ExplainBugOutput {
            explanation: "subtracts instead of adds".to_string(),
            suggested_fix: "return a + b".to_string(),
        })
    }

    #[test]
    fn test_new_panel_uses_defaults() {
        let panel = Panel::new(FeatureKey::SmartCodeSuggestions);
        assert_eq!(panel.inputs(), &["", "JavaScript", "Jest", ""]);
        assert_eq!(panel.phase(), PanelPhase::Idle);
    }

    #[test]
    fn test_begin_submit_is_guarded() {
        let mut panel = Panel::new(FeatureKey::BugDetection);
        let first = panel.begin_submit().unwrap();
        assert!(panel.is_submitting());
        assert!(panel.begin_submit().is_none());

        assert!(panel.complete(first.ticket, Ok(explain_result())));
        assert!(panel.begin_submit().is_some());
    }

    #[test]
    fn test_submit_clears_previous_outcome() {
        let mut panel = Panel::new(FeatureKey::BugDetection);
        let s = panel.begin_submit().unwrap();
        panel.complete(s.ticket, Ok(explain_result()));
        assert!(panel.result().is_some());

        panel.begin_submit().unwrap();
        assert!(panel.result().is_none());
        assert!(panel.notice().is_none());
    }

    #[test]
    fn test_failure_keeps_inputs_and_shows_notice() {
        let mut panel = Panel::new(FeatureKey::AutoFix);
        panel.set_input("description", "optimize this");
        let s = panel.begin_submit().unwrap();

        let err = FlowError::Validation(ValidationError::Empty {
            schema: "SuggestCodeFixInput",
            field: "code",
        });
        assert!(panel.complete(s.ticket, Err(err)));

        let notice = panel.notice().unwrap();
        assert_eq!(notice.title, "Error");
        assert!(notice.message.contains("code"));
        assert_eq!(panel.inputs()[1], "optimize this");
        assert!(panel.result().is_none());
        assert_eq!(panel.phase(), PanelPhase::Idle);
    }

    #[test]
    fn test_detached_completion_is_ignored() {
        let mut panel = Panel::new(FeatureKey::BugDetection);
        let s = panel.begin_submit().unwrap();
        assert_eq!(panel.detach(), Some(s.ticket));
        assert_eq!(panel.detach(), None);

        assert!(!panel.complete(s.ticket, Ok(explain_result())));
        assert!(panel.result().is_none());

        let next = panel.begin_submit().unwrap();
        assert_ne!(next.ticket, s.ticket);
        assert!(!panel.complete(s.ticket, Err(ModelError::Timeout.into())));
        assert!(panel.is_submitting());
    }

    #[test]
    fn test_notice_expires() {
        let mut panel = Panel::new(FeatureKey::BugDetection);
        let s = panel.begin_submit().unwrap();
        panel.complete(s.ticket, Err(ModelError::Timeout.into()));

        for _ in 0..NOTICE_TICKS - 1 {
            panel.tick();
        }
        assert!(panel.notice().is_some());
        panel.tick();
        assert!(panel.notice().is_none());
    }

    #[test]
    fn test_query_panel_fills_fixed_fields() {
        let mut panel = Panel::new(FeatureKey::NaturalLanguageQuery);
        panel.set_input("objective", "How do I test this API?");
        assert_eq!(
            panel.build_request(),
            FlowRequest::SmartCodeSuggestions(SmartCodeSuggestionsInput {
                code_snippet: String::new(),
                language: "general".to_string(),
                testing_framework: "any".to_string(),
                objective: "How do I test this API?".to_string(),
            })
        );
    }

    #[test]
    fn test_result_blocks_skip_blank_fields() {
        let mut panel = Panel::new(FeatureKey::SmartCodeSuggestions);
        let s = panel.begin_submit().unwrap();
        panel.complete(
            s.ticket,
            Ok(FlowResult::SmartCodeSuggestions(SmartCodeSuggestionsOutput {
                suggested_code: " ".to_string(),
                explanation: "use a data-testid".to_string(),
            })),
        );

        let blocks = panel.result_blocks();
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], ResultBlock::Field { value: "use a data-testid", .. }));
    }

    #[test]
    fn test_query_panel_falls_back_when_empty() {
        let mut panel = Panel::new(FeatureKey::NaturalLanguageQuery);
        let s = panel.begin_submit().unwrap();
        panel.complete(
            s.ticket,
            Ok(FlowResult::SmartCodeSuggestions(SmartCodeSuggestionsOutput::default())),
        );

        match panel.result_blocks().as_slice() {
            [ResultBlock::Fallback(text)] => assert!(text.starts_with("The AI did not provide")),
            other => panic!("unexpected blocks: {:?}", other),
        }
    }
}
