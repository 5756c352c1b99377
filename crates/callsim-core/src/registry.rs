//! The Call Registry: the set of active call legs.
//!
//! Legs are kept in creation order so that multi-leg payloads (hangup,
//! end of an agent leg) list calls deterministically. A leg is removed the
//! moment it ends; the registry never holds an `ENDED` call.

use callsim_contracts::{
    call::{Call, CallId, CallSelector, CallType, ParticipantType},
    error::{CallLookup, CallsimError, CallsimResult},
    result::ActiveCalls,
};

#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: Vec<Call>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new active leg. Fails if a leg with the same id is active.
    pub fn add(&mut self, call: Call) -> CallsimResult<()> {
        if self.calls.iter().any(|c| c.call_id == call.call_id) {
            return Err(CallsimError::DuplicateCallId { call_id: call.call_id });
        }
        self.calls.push(call);
        Ok(())
    }

    /// Remove and return the leg with `call_id`.
    pub fn remove(&mut self, call_id: &CallId) -> CallsimResult<Call> {
        let index = self
            .calls
            .iter()
            .position(|c| &c.call_id == call_id)
            .ok_or_else(|| CallsimError::CallNotFound(CallLookup::CallId(call_id.clone())))?;
        Ok(self.calls.remove(index))
    }

    /// Resolve a selector to an active leg.
    ///
    /// An empty registry always reports `CallLookup::Any`, whatever the
    /// selector asked for.
    pub fn find(&self, selector: &CallSelector) -> CallsimResult<&Call> {
        let index = self.position(selector)?;
        Ok(&self.calls[index])
    }

    pub fn find_mut(&mut self, selector: &CallSelector) -> CallsimResult<&mut Call> {
        let index = self.position(selector)?;
        Ok(&mut self.calls[index])
    }

    /// The first active leg playing `participant_type`, if any.
    pub fn participant(&self, participant_type: ParticipantType) -> Option<&Call> {
        self.calls.iter().find(|c| c.participant_type == participant_type)
    }

    pub fn contains_participant(&self, participant_type: ParticipantType) -> bool {
        self.participant(participant_type).is_some()
    }

    /// The oldest active leg.
    pub fn first(&self) -> Option<&Call> {
        self.calls.first()
    }

    /// Whether an outbound leg currently occupies the outbound slot.
    pub fn has_outbound(&self) -> bool {
        self.calls.iter().any(|c| c.call_type == CallType::Outbound)
    }

    /// Owned snapshot keyed by call id.
    pub fn all(&self) -> ActiveCalls {
        self.calls.iter().map(|c| (c.call_id.clone(), c.clone())).collect()
    }

    /// Owned snapshot in creation order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.clone()
    }

    /// Remove every leg, returning them in creation order.
    pub fn drain(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    fn position(&self, selector: &CallSelector) -> CallsimResult<usize> {
        if self.calls.is_empty() {
            return Err(CallsimError::CallNotFound(CallLookup::Any));
        }
        match selector {
            CallSelector::ById(id) => self
                .calls
                .iter()
                .position(|c| &c.call_id == id)
                .ok_or_else(|| CallsimError::CallNotFound(CallLookup::CallId(id.clone()))),
            CallSelector::ByParticipant(participant_type) => self
                .calls
                .iter()
                .position(|c| c.participant_type == *participant_type)
                .ok_or(CallsimError::CallNotFound(CallLookup::Participant(*participant_type))),
        }
    }
}
