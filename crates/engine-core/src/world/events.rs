use serde_json::Value;

use contracts::{Diagnostic, EngineEvent, EventType, RejectReason};

use super::{mix_event_hash, HistoryWorld};

impl HistoryWorld {
    /// Append one event, advancing the in-tick sequence and folding the
    /// event into the state hash.
    pub(super) fn push_event(
        &mut self,
        tick: u64,
        sequence_in_tick: &mut u64,
        event_type: EventType,
        subject_ids: Vec<String>,
        description: String,
        payload: Option<Value>,
    ) -> String {
        let sequence = *sequence_in_tick;
        *sequence_in_tick += 1;
        let event_id = format!("evt:{tick}:{sequence}");
        self.state_hash = mix_event_hash(self.state_hash, &event_id, &description);
        self.event_log.push(EngineEvent {
            event_id: event_id.clone(),
            tick,
            epoch: self.status.current_epoch,
            sequence_in_tick: sequence,
            event_type,
            subject_ids,
            description,
            payload,
        });
        event_id
    }

    pub(super) fn push_diagnostic(
        &mut self,
        tick: u64,
        source: String,
        reason: RejectReason,
        detail: String,
    ) {
        self.diagnostics.push(Diagnostic {
            tick,
            source,
            reason,
            detail,
        });
    }
}
