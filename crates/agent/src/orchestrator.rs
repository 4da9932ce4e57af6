//! Turn loop and widen-and-retry search.
//!
//! A conversation runs through three phases: the fixed-order mandatory
//! questions, a free-form optional phase that only ends on proceed intent,
//! and a fully automatic search that widens the criteria at most twice.

use carfinder_core::config::SearchConfig;
use carfinder_core::dialogue::{
    RelaxationLevel, RelaxationPlanner, RelaxedFilterView, SlotSequencer,
};
use carfinder_core::domain::criterion::Criterion;
use carfinder_core::domain::filter::SearchFilter;
use carfinder_core::domain::slots::SlotState;
use carfinder_core::domain::vehicle::VehicleRecord;
use carfinder_core::errors::{ApplicationError, DomainError};
use carfinder_core::flows::{
    CarSearchFlow, DialogueEvent, DialoguePhase, FlowContext, FlowEngine, FlowTransitionError,
};
use carfinder_core::search::{SearchError, VehicleSearch};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::conversation::ConversationChannel;
use crate::extraction::ExtractionGateway;
use crate::gatekeeper::{GateDecision, IntentClassifier, ProceedGatekeeper};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("catalog search failed: {0}")]
    SearchUnavailable(#[from] SearchError),
    #[error("conversation channel failed: {0:#}")]
    Channel(anyhow::Error),
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

impl From<OrchestratorError> for ApplicationError {
    fn from(value: OrchestratorError) -> Self {
        match value {
            OrchestratorError::SearchUnavailable(error) => error.into(),
            OrchestratorError::Channel(error) => Self::Integration(format!("{error:#}")),
            OrchestratorError::Flow(error) => DomainError::from(error).into(),
        }
    }
}

/// One catalog query issued during the search phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchAttempt {
    /// Relaxations applied on top of the user's criteria, in order.
    pub levels: Vec<RelaxationLevel>,
    pub filter: SearchFilter,
    pub returned: usize,
}

impl SearchAttempt {
    pub fn level(&self) -> Option<RelaxationLevel> {
        self.levels.last().copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchReport {
    pub records: Vec<VehicleRecord>,
    pub attempts: Vec<SearchAttempt>,
}

impl SearchReport {
    /// Terminal outcome after every allowed widening came back empty.
    pub fn is_no_match(&self) -> bool {
        self.records.is_empty()
    }

    pub fn was_relaxed(&self) -> bool {
        self.attempts.iter().any(|attempt| attempt.level().is_some())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogueOutcome {
    Completed { slots: SlotState, report: SearchReport },
    Abandoned { slots: SlotState },
}

/// Effect of feeding one utterance through the extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnEffect {
    Applied { changed: usize },
    Unparsed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PhaseExit {
    Resolved,
    Left,
}

pub struct SearchOrchestrator<E, I, S> {
    extractor: E,
    gatekeeper: ProceedGatekeeper<I>,
    catalog: S,
    sequencer: SlotSequencer,
    planner: RelaxationPlanner,
    flow: FlowEngine<CarSearchFlow>,
    settings: SearchConfig,
}

impl<E, I, S> SearchOrchestrator<E, I, S>
where
    E: ExtractionGateway,
    I: IntentClassifier,
    S: VehicleSearch,
{
    pub fn new(extractor: E, classifier: I, catalog: S, settings: SearchConfig) -> Self {
        Self {
            extractor,
            gatekeeper: ProceedGatekeeper::new(classifier),
            catalog,
            sequencer: SlotSequencer::new(),
            planner: RelaxationPlanner::new(),
            flow: FlowEngine::default(),
            settings,
        }
    }

    /// Runs one conversation from the first question to the final result set.
    ///
    /// Search failures come back as [`OrchestratorError::SearchUnavailable`],
    /// never as an empty report.
    pub async fn run_dialogue<C>(
        &self,
        channel: &mut C,
        conversation_id: &str,
    ) -> Result<DialogueOutcome, OrchestratorError>
    where
        C: ConversationChannel + ?Sized,
    {
        let mut slots = SlotState::new();
        let mut phase = self.flow.initial_phase();
        info!(event_name = "dialogue.started", conversation_id, "conversation started");

        if self.mandatory_phase(channel, &mut slots, conversation_id).await? == PhaseExit::Left {
            self.advance(&mut phase, DialogueEvent::UserLeft, &slots, conversation_id)?;
            return Ok(DialogueOutcome::Abandoned { slots });
        }
        self.advance(&mut phase, DialogueEvent::MandatoryResolved, &slots, conversation_id)?;

        if self.optional_phase(channel, &mut slots, conversation_id).await? == PhaseExit::Left {
            self.advance(&mut phase, DialogueEvent::UserLeft, &slots, conversation_id)?;
            return Ok(DialogueOutcome::Abandoned { slots });
        }
        self.advance(&mut phase, DialogueEvent::ProceedRequested, &slots, conversation_id)?;

        match self.search_and_relax(&slots, channel).await {
            Ok(report) => {
                self.advance(&mut phase, DialogueEvent::SearchFinished, &slots, conversation_id)?;
                info!(
                    event_name = "dialogue.completed",
                    conversation_id,
                    returned = report.records.len(),
                    attempts = report.attempts.len(),
                    relaxed = report.was_relaxed(),
                    "conversation completed"
                );
                Ok(DialogueOutcome::Completed { slots, report })
            }
            Err(error) => {
                self.advance(&mut phase, DialogueEvent::SearchFailed, &slots, conversation_id)?;
                warn!(
                    event_name = "dialogue.search_failed",
                    conversation_id,
                    error = %error,
                    "search phase failed"
                );
                Err(error)
            }
        }
    }

    /// Extracts criteria from one utterance and applies them.
    ///
    /// Extractor faults are absorbed: the state is left untouched.
    pub async fn absorb_turn(
        &self,
        slots: &mut SlotState,
        text: &str,
        hint: Option<Criterion>,
    ) -> TurnEffect {
        match self.extractor.extract(text, hint).await {
            Ok(update) => {
                let changed = slots.apply_update(&update);
                debug!(
                    event_name = "turn.applied",
                    hint = hint.map(Criterion::key),
                    extracted = update.len(),
                    changed,
                    "criteria applied"
                );
                TurnEffect::Applied { changed }
            }
            Err(error) => {
                warn!(
                    event_name = "turn.extraction_failed",
                    hint = hint.map(Criterion::key),
                    error = %error,
                    "extraction failed; re-prompting"
                );
                TurnEffect::Unparsed
            }
        }
    }

    /// Searches with the exact criteria, then widens at most twice.
    ///
    /// Each widened query is announced on `channel` before it runs.
    pub async fn search_and_relax<C>(
        &self,
        slots: &SlotState,
        channel: &mut C,
    ) -> Result<SearchReport, OrchestratorError>
    where
        C: ConversationChannel + ?Sized,
    {
        let mut report = SearchReport::default();

        let mut records = self.attempt(slots.to_filter(), Vec::new(), &mut report).await?;

        let mut soft_view = None;
        if records.is_empty() {
            let view = self.planner.relax(slots, RelaxationLevel::Soft);
            records = self.widened_attempt(&view, channel, &mut report).await?;
            soft_view = Some(view);
        }

        if records.len() < self.settings.min_results {
            let view = match &soft_view {
                Some(soft) => self.planner.escalate(soft, RelaxationLevel::Hard),
                None => self.planner.relax(slots, RelaxationLevel::Hard),
            };
            let more = self.widened_attempt(&view, channel, &mut report).await?;
            // Deliberate: a car the hard query returns again is not listed twice.
            let appended = append_unseen(&mut records, more);
            debug!(event_name = "search.merged", appended, total = records.len(), "results merged");
        }

        report.records = records;
        Ok(report)
    }

    async fn widened_attempt<C>(
        &self,
        view: &RelaxedFilterView,
        channel: &mut C,
        report: &mut SearchReport,
    ) -> Result<Vec<VehicleRecord>, OrchestratorError>
    where
        C: ConversationChannel + ?Sized,
    {
        if let Some(level) = view.levels.last() {
            channel.emit(level.notice()).await.map_err(OrchestratorError::Channel)?;
        }
        self.attempt(view.filter(), view.levels.clone(), report).await
    }

    async fn attempt(
        &self,
        filter: SearchFilter,
        levels: Vec<RelaxationLevel>,
        report: &mut SearchReport,
    ) -> Result<Vec<VehicleRecord>, OrchestratorError> {
        let level = levels.last().map(ToString::to_string);
        let records = self.catalog.search(&filter, self.settings.max_results).await?;
        info!(
            event_name = "search.attempt",
            level = level.as_deref().unwrap_or("exact"),
            returned = records.len(),
            "catalog queried"
        );
        report.attempts.push(SearchAttempt { levels, filter, returned: records.len() });
        Ok(records)
    }

    async fn mandatory_phase<C>(
        &self,
        channel: &mut C,
        slots: &mut SlotState,
        conversation_id: &str,
    ) -> Result<PhaseExit, OrchestratorError>
    where
        C: ConversationChannel + ?Sized,
    {
        while let Some(gap) = self.sequencer.next_mandatory_gap(slots) {
            if let Some(prompt) = self.sequencer.prompt_for(gap) {
                channel.emit(prompt).await.map_err(OrchestratorError::Channel)?;
            }

            let Some(text) = channel.next_turn().await.map_err(OrchestratorError::Channel)? else {
                info!(event_name = "dialogue.abandoned", conversation_id, criterion = gap.key());
                return Ok(PhaseExit::Left);
            };

            self.absorb_turn(slots, &text, Some(gap)).await;
        }

        Ok(PhaseExit::Resolved)
    }

    async fn optional_phase<C>(
        &self,
        channel: &mut C,
        slots: &mut SlotState,
        conversation_id: &str,
    ) -> Result<PhaseExit, OrchestratorError>
    where
        C: ConversationChannel + ?Sized,
    {
        let menu = self.sequencer.optional_menu();
        channel.emit(&menu).await.map_err(OrchestratorError::Channel)?;

        loop {
            let Some(text) = channel.next_turn().await.map_err(OrchestratorError::Channel)? else {
                info!(event_name = "dialogue.abandoned", conversation_id, phase = "optional");
                return Ok(PhaseExit::Left);
            };

            if self.gatekeeper.decide(slots, &text).await == GateDecision::Proceed {
                return Ok(PhaseExit::Resolved);
            }

            if self.absorb_turn(slots, &text, None).await == TurnEffect::Unparsed {
                channel.emit(&menu).await.map_err(OrchestratorError::Channel)?;
            }
        }
    }

    fn advance(
        &self,
        phase: &mut DialoguePhase,
        event: DialogueEvent,
        slots: &SlotState,
        conversation_id: &str,
    ) -> Result<(), OrchestratorError> {
        let outcome = self.flow.apply(phase, &event, &FlowContext::from_slots(slots))?;
        debug!(
            event_name = "dialogue.transition",
            conversation_id,
            from = ?outcome.from,
            to = ?outcome.to,
            event = ?outcome.event,
            "phase changed"
        );
        *phase = outcome.to;
        Ok(())
    }
}

/// Appends records not already present; records without an id are always kept.
fn append_unseen(records: &mut Vec<VehicleRecord>, more: Vec<VehicleRecord>) -> usize {
    let mut appended = 0;
    for record in more {
        let seen = record.id.is_some() && records.iter().any(|existing| existing.id == record.id);
        if !seen {
            records.push(record);
            appended += 1;
        }
    }
    appended
}
