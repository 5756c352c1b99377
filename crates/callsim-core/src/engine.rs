//! The Telephony Engine: call/participant state machine and event emission.
//!
//! Every piece of mutable state (active legs, agent configuration, presence,
//! mute flag, pending wrap-ups) lives in one `EngineState` behind a
//! `std::sync::Mutex`. The lock is only ever held for synchronous sections;
//! the two suspension points (backend calls and the wrap-up sleep) run with
//! the lock released, and every check that allocates a slot is repeated
//! under the same acquisition that commits it.
//!
//! Events are published after the lock is released, in the order the
//! mutations were applied.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use callsim_contracts::{
    agent::{AgentConfig, AgentConfigUpdate, AgentPresence, AgentStatus, AgentStatusInfo},
    call::{
        Call, CallAttributes, CallId, CallInfo, CallSelector, CallState, CallType, DialOptions,
        ParticipantType,
    },
    capability::GatedOperation,
    config::{CallCenterConfig, EngineConfig, EnqueuedStatusPolicy},
    contact::{Contact, ContactFilter},
    error::{CallLookup, CallsimError, CallsimResult, Unavailability},
    event::{AfterCallWork, EventType, TelephonyEvent},
    result::{
        ActiveCallsResult, CallResult, GenericResult, HangupResult, HoldToggleResult,
        InitResult, MuteToggleResult, ParticipantResult, PhoneContactsResult,
        RecordingToggleResult,
    },
};

use crate::{
    registry::CallRegistry,
    traits::{
        CapabilityGate, EventPublisher, RegistrationRequest, RegistrationResponse,
        TelephonyBackend,
    },
    wrapup::WrapupManager,
};

/// Everything the engine mutates.
struct EngineState {
    registry: CallRegistry,
    agent_config: AgentConfig,
    /// Presence as last reported by the host.
    presence: AgentPresence,
    /// Whether new inbound calls may reach the agent.
    agent_available: bool,
    /// Status queued with `enqueue_next_state`, applied when the last leg ends.
    pending_presence: Option<AgentPresence>,
    is_muted: bool,
    logged_in: bool,
    show_login_page: bool,
    error_injection: bool,
    wrapup: WrapupManager,
}

impl EngineState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            registry: CallRegistry::new(),
            agent_config: config.agent_config.clone(),
            presence: AgentPresence::new(config.initial_status),
            agent_available: config.initial_status.is_available(),
            pending_presence: None,
            is_muted: false,
            logged_in: false,
            show_login_page: config.show_login_page,
            error_injection: false,
            wrapup: WrapupManager::new(),
        }
    }

    fn hold_result(&self) -> HoldToggleResult {
        let on_hold = |participant_type| {
            self.registry
                .participant(participant_type)
                .is_some_and(|call| call.call_info.is_on_hold)
        };
        HoldToggleResult {
            is_customer_on_hold: on_hold(ParticipantType::InitialCaller),
            is_third_party_on_hold: on_hold(ParticipantType::ThirdParty),
            calls: self.registry.all(),
        }
    }
}

/// Static settings copied out of `EngineConfig` at construction.
struct Settings {
    wrapup_delay: Duration,
    login_frame_height: u32,
    enqueued_status: EnqueuedStatusPolicy,
    phone_contacts: Vec<Contact>,
}

/// The reference telephony engine.
///
/// Cloning is cheap and every clone drives the same session.
#[derive(Clone)]
pub struct TelephonyEngine {
    state: Arc<Mutex<EngineState>>,
    settings: Arc<Settings>,
    gate: Arc<dyn CapabilityGate>,
    publisher: Arc<dyn EventPublisher>,
    backend: Arc<dyn TelephonyBackend>,
}

fn lock_state(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn require_state(call: &Call, expected: CallState, operation: &'static str) -> CallsimResult<()> {
    if call.state == expected {
        Ok(())
    } else {
        Err(CallsimError::InvalidTransition {
            call_id: call.call_id.clone(),
            state: call.state,
            operation,
        })
    }
}

/// The remote party picked up. A leg put on hold while it was still ringing
/// lands in `ON_HOLD` rather than `CONNECTED`.
fn answer(call: &mut Call) {
    if call.call_info.is_on_hold {
        call.transition(CallState::OnHold);
    } else {
        call.transition(CallState::Connected);
    }
}

fn set_hold(call: &mut Call, on_hold: bool) {
    call.call_info.is_on_hold = on_hold;
    match (on_hold, call.state) {
        (true, CallState::Connected) => call.transition(CallState::OnHold),
        (false, CallState::OnHold) => call.transition(CallState::Connected),
        _ => {}
    }
}

/// The id a wrap-up is keyed to: the customer leg when it was among the
/// ended legs, otherwise the first one.
fn wrapup_key(ended: &[Call]) -> Option<CallId> {
    ended
        .iter()
        .find(|call| call.participant_type == ParticipantType::InitialCaller)
        .or_else(|| ended.first())
        .map(|call| call.call_id.clone())
}

impl TelephonyEngine {
    pub fn new(
        config: EngineConfig,
        gate: Arc<dyn CapabilityGate>,
        publisher: Arc<dyn EventPublisher>,
        backend: Arc<dyn TelephonyBackend>,
    ) -> Self {
        info!(
            wrapup_delay_ms = config.wrapup_delay_ms,
            initial_status = ?config.initial_status,
            enqueued_status = ?config.enqueued_status,
            "telephony engine created"
        );
        let state = EngineState::new(&config);
        let settings = Settings {
            wrapup_delay: config.wrapup_delay(),
            login_frame_height: config.login_frame_height,
            enqueued_status: config.enqueued_status,
            phone_contacts: config.phone_contacts,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            settings: Arc::new(settings),
            gate,
            publisher,
            backend,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        lock_state(&self.state)
    }

    /// Lock the state for a host command, failing first if error injection
    /// is on.
    fn command_state(&self) -> CallsimResult<MutexGuard<'_, EngineState>> {
        let state = self.lock();
        if state.error_injection {
            warn!("error injection active, rejecting command");
            return Err(CallsimError::InjectedFailure);
        }
        Ok(state)
    }

    /// Publish an event for a state change that has already been applied.
    /// A sink failure is logged; the change stands and the caller still
    /// gets its result.
    fn publish(&self, event: TelephonyEvent) {
        let event_type = event.event_type();
        debug!(event_type = %event_type, "publishing event");
        if let Err(err) = self.publisher.publish(event) {
            warn!(event_type = %event_type, error = %err, "failed to publish event");
        }
    }

    // ── Session ──────────────────────────────────────────────────────────────

    /// Configure the tenant and report whether the host must show a login
    /// page.
    pub async fn init(&self, config: &CallCenterConfig) -> CallsimResult<InitResult> {
        drop(self.command_state()?);

        let configured = self.backend.configure_tenant(config).await.map_err(|err| {
            warn!(error = %err, "tenant configuration request failed");
            CallsimError::ExternalServiceFailure { reason: err.reason }
        })?;
        if !configured {
            warn!("backend refused tenant configuration");
            return Err(CallsimError::ExternalServiceFailure {
                reason: "failed to configure tenant information".to_string(),
            });
        }

        let show_login = self.lock().show_login_page;
        info!(show_login, "engine initialised");
        Ok(InitResult {
            show_login,
            login_frame_height: show_login.then_some(self.settings.login_frame_height),
        })
    }

    /// Simulator toggle for the login page reported by `init`.
    pub fn show_login_page(&self, show: bool) {
        self.lock().show_login_page = show;
    }

    /// Result of the vendor subsystem login, forwarded as `LOGIN_RESULT`.
    pub fn subsystem_login_result(&self, success: bool) -> CallsimResult<()> {
        self.lock().logged_in = success;
        info!(success, "subsystem login result");
        self.publish(TelephonyEvent::LoginResult(GenericResult { success }));
        Ok(())
    }

    /// Vendor-initiated logout, forwarded as `LOGOUT_RESULT`.
    pub fn subsystem_logout(&self) -> CallsimResult<()> {
        self.lock().logged_in = false;
        info!("subsystem logout");
        self.publish(TelephonyEvent::LogoutResult(GenericResult::ok()));
        Ok(())
    }

    /// Host-initiated logout. Always succeeds.
    pub async fn logout(&self) -> CallsimResult<GenericResult> {
        self.command_state()?.logged_in = false;
        info!("agent logged out");
        Ok(GenericResult::ok())
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().logged_in
    }

    /// Forward an arbitrary payload to the host as `MESSAGE`. Nothing else
    /// changes, so a sink failure is returned to the caller.
    pub fn publish_message(&self, message: serde_json::Value) -> CallsimResult<()> {
        debug!(event_type = %EventType::Message, "publishing event");
        self.publisher.publish(TelephonyEvent::Message(message))
    }

    /// While enabled, every host command rejects with `InjectedFailure`.
    pub fn set_error_injection(&self, enabled: bool) {
        self.lock().error_injection = enabled;
        info!(enabled, "error injection toggled");
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub async fn get_active_calls(&self) -> CallsimResult<ActiveCallsResult> {
        let state = self.command_state()?;
        Ok(ActiveCallsResult { active_calls: state.registry.all() })
    }

    /// Snapshot of one active leg.
    pub fn get_call(&self, selector: &CallSelector) -> CallsimResult<Call> {
        self.lock().registry.find(selector).cloned()
    }

    pub fn is_on_hold(&self, selector: &CallSelector) -> CallsimResult<bool> {
        self.lock().registry.find(selector).map(|call| call.call_info.is_on_hold)
    }

    pub fn is_muted(&self) -> bool {
        self.lock().is_muted
    }

    pub async fn get_phone_contacts(
        &self,
        filter: Option<ContactFilter>,
    ) -> CallsimResult<PhoneContactsResult> {
        drop(self.command_state()?);
        let contacts = self
            .settings
            .phone_contacts
            .iter()
            .filter(|contact| filter.as_ref().map_or(true, |f| f.matches(contact)))
            .cloned()
            .collect();
        Ok(PhoneContactsResult { contacts })
    }

    // ── Inbound, outbound and callback legs ──────────────────────────────────

    /// Register a new inbound leg with the backend and ring the agent.
    pub async fn start_inbound_call(
        &self,
        phone_number: impl Into<String>,
        attributes: CallAttributes,
    ) -> CallsimResult<CallResult> {
        let phone_number = phone_number.into();
        {
            let state = self.command_state()?;
            if !state.agent_available {
                warn!(phone_number = %phone_number, "inbound call while agent unavailable");
                return Err(CallsimError::AgentUnavailable(Unavailability::Inbound {
                    phone_number,
                }));
            }
        }

        let request = RegistrationRequest {
            phone_number: phone_number.clone(),
            attributes: attributes.clone(),
        };
        let call_id = match self.backend.register_call(request).await {
            Ok(RegistrationResponse::VoiceCallId(id)) => CallId::new(id),
            Ok(RegistrationResponse::Unavailable) => {
                let id = CallId::generate();
                warn!(call_id = %id, "backend did not mint a call id, using a local one");
                id
            }
            Err(err) => {
                warn!(error = %err, "call registration failed");
                return Err(CallsimError::ExternalServiceFailure { reason: err.reason });
            }
        };

        let participant_type = attributes.participant_type.unwrap_or(ParticipantType::InitialCaller);
        let call = {
            let mut state = self.lock();
            if !state.agent_available {
                warn!(call_id = %call_id, "agent became unavailable during registration");
                return Err(CallsimError::AgentUnavailable(Unavailability::Inbound {
                    phone_number,
                }));
            }
            let mut call =
                Call::new(call_id, CallType::Inbound, CallState::Ringing, participant_type);
            call.phone_number = Some(phone_number);
            state.registry.add(call.clone())?;
            call
        };

        info!(
            call_id = %call.call_id,
            participant = %call.participant_type,
            "inbound call ringing"
        );
        let result = CallResult { call };
        self.publish(TelephonyEvent::CallStarted(result.clone()));
        Ok(result)
    }

    /// Place an outbound call. Only one outbound leg may be active.
    pub async fn dial(&self, contact: Contact, options: DialOptions) -> CallsimResult<CallResult> {
        let call = {
            let mut state = self.command_state()?;
            if state.registry.has_outbound() {
                warn!("dial rejected, outbound call already active");
                return Err(CallsimError::AgentUnavailable(Unavailability::Outbound));
            }
            let mut call = Call::new(
                CallId::generate(),
                CallType::Outbound,
                CallState::Connecting,
                ParticipantType::InitialCaller,
            );
            call.phone_number = contact.phone_number.clone();
            call.contact = Some(contact);
            call.call_info = CallInfo::new(options.is_softphone_call);
            state.registry.add(call.clone())?;
            call
        };

        info!(
            call_id = %call.call_id,
            softphone = call.call_info.is_softphone_call,
            "outbound call connecting"
        );
        let result = CallResult { call };
        if result.call.call_info.is_softphone_call {
            self.publish(TelephonyEvent::CallStarted(result.clone()));
        }
        Ok(result)
    }

    /// Vendor side: the remote party answered an outbound leg.
    pub fn connect_call(&self, selector: Option<CallSelector>) -> CallsimResult<CallResult> {
        let selector = selector.unwrap_or_else(CallSelector::initial_caller);
        let call = {
            let mut state = self.lock();
            let call = state.registry.find_mut(&selector)?;
            require_state(call, CallState::Connecting, "connect")?;
            answer(call);
            call.clone()
        };

        info!(call_id = %call.call_id, "outbound call connected");
        let result = CallResult { call };
        self.publish(TelephonyEvent::CallConnected(result.clone()));
        Ok(result)
    }

    /// Vendor side: a customer asked to be called back.
    pub fn request_callback(&self, contact: Contact) -> CallsimResult<CallResult> {
        let call = {
            let mut state = self.lock();
            let mut call = Call::new(
                CallId::generate(),
                CallType::Callback,
                CallState::Ringing,
                ParticipantType::InitialCaller,
            );
            call.phone_number = contact.phone_number.clone();
            call.contact = Some(contact);
            state.registry.add(call.clone())?;
            call
        };

        info!(call_id = %call.call_id, "callback queued");
        let result = CallResult { call };
        self.publish(TelephonyEvent::QueuedCallStarted(result.clone()));
        Ok(result)
    }

    pub async fn accept_call(&self, selector: Option<CallSelector>) -> CallsimResult<CallResult> {
        let selector = selector.unwrap_or_else(CallSelector::initial_caller);
        let mut state = self.command_state()?;
        let call = state.registry.find_mut(&selector)?;
        require_state(call, CallState::Ringing, "accept")?;
        answer(call);
        info!(call_id = %call.call_id, call_type = ?call.call_type, "call accepted");
        Ok(CallResult { call: call.clone() })
    }

    pub async fn decline_call(&self, selector: Option<CallSelector>) -> CallsimResult<CallResult> {
        let selector = selector.unwrap_or_else(CallSelector::initial_caller);
        let mut state = self.command_state()?;
        let call = state.registry.find(&selector)?;
        require_state(call, CallState::Ringing, "decline")?;
        let call_id = call.call_id.clone();

        let mut ended = self.end_legs(&mut state, &[call_id])?;
        let call = ended.remove(0);
        info!(call_id = %call.call_id, "call declined");
        Ok(CallResult { call })
    }

    // ── Ending legs ──────────────────────────────────────────────────────────

    /// End one leg. Ending the agent's own leg takes the customer and the
    /// third party down with it; both must be present.
    pub async fn end_call(&self, selector: CallSelector) -> CallsimResult<HangupResult> {
        let mut state = self.command_state()?;
        let target = state.registry.find(&selector)?;

        let ids = if target.participant_type == ParticipantType::Agent {
            let agent_id = target.call_id.clone();
            let initial = state
                .registry
                .find(&CallSelector::ByParticipant(ParticipantType::InitialCaller))?
                .call_id
                .clone();
            let third_party = state
                .registry
                .find(&CallSelector::ByParticipant(ParticipantType::ThirdParty))?
                .call_id
                .clone();
            vec![initial, third_party, agent_id]
        } else {
            vec![target.call_id.clone()]
        };

        let calls = self.end_legs(&mut state, &ids)?;
        info!(ended = calls.len(), "call ended");
        Ok(HangupResult { calls })
    }

    /// End every active leg and publish a single `HANGUP`.
    pub async fn hangup(&self) -> CallsimResult<HangupResult> {
        let calls = {
            let mut state = self.command_state()?;
            let mut calls = state.registry.drain();
            for call in &mut calls {
                call.transition(CallState::Ended);
            }
            self.on_legs_ended(&mut state, &calls);
            calls
        };

        if calls.is_empty() {
            debug!("hangup with no active calls");
            return Ok(HangupResult { calls });
        }

        info!(ended = calls.len(), "hung up all calls");
        let result = HangupResult { calls };
        self.publish(TelephonyEvent::Hangup(result.clone()));
        Ok(result)
    }

    /// Remove the leg playing `participant_type` and publish
    /// `PARTICIPANT_REMOVED`.
    pub async fn remove_participant(
        &self,
        participant_type: ParticipantType,
    ) -> CallsimResult<CallResult> {
        let call = {
            let mut state = self.command_state()?;
            let call_id = state
                .registry
                .find(&CallSelector::ByParticipant(participant_type))?
                .call_id
                .clone();
            let mut ended = self.end_legs(&mut state, &[call_id])?;
            ended.remove(0)
        };

        info!(call_id = %call.call_id, participant = %participant_type, "participant removed");
        let result = CallResult { call };
        self.publish(TelephonyEvent::ParticipantRemoved(result.clone()));
        Ok(result)
    }

    /// Remove `ids` from the active set in order, marking each `ENDED`.
    fn end_legs(&self, state: &mut EngineState, ids: &[CallId]) -> CallsimResult<Vec<Call>> {
        let mut ended = Vec::with_capacity(ids.len());
        for id in ids {
            let mut call = state.registry.remove(id)?;
            call.transition(CallState::Ended);
            debug!(call_id = %call.call_id, participant = %call.participant_type, "leg ended");
            ended.push(call);
        }
        self.on_legs_ended(state, &ended);
        Ok(ended)
    }

    /// Once no leg is active: apply a queued status and start wrap-up.
    fn on_legs_ended(&self, state: &mut EngineState, ended: &[Call]) {
        if !state.registry.is_empty() {
            return;
        }
        if let Some(presence) = state.pending_presence.take() {
            info!(status = ?presence.status, "applying queued agent status");
            state.agent_available = presence.status.is_available();
            state.presence = presence;
        }
        if let Some(call_id) = wrapup_key(ended) {
            self.schedule_wrapup(state, call_id);
        }
    }

    fn schedule_wrapup(&self, state: &mut EngineState, call_id: CallId) {
        let deadline = Instant::now() + self.settings.wrapup_delay;
        let shared = Arc::clone(&self.state);
        let publisher = Arc::clone(&self.publisher);
        let key = call_id.clone();

        let scheduled = state.wrapup.schedule(call_id.clone(), deadline, move |token| {
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                let fired = lock_state(&shared).wrapup.complete(&key, token);
                if !fired {
                    return;
                }
                info!(call_id = %key, "after-call work started");
                let event = TelephonyEvent::AfterCallWorkStarted(AfterCallWork { call_id: key });
                if let Err(err) = publisher.publish(event) {
                    warn!(error = %err, "failed to publish after-call work event");
                }
            })
            .abort_handle()
        });

        if scheduled {
            debug!(
                call_id = %call_id,
                delay_ms = self.settings.wrapup_delay.as_millis() as u64,
                "wrap-up scheduled"
            );
        }
    }

    /// Cancel every pending wrap-up. Safe to call when none is pending.
    pub fn end_wrapup(&self) {
        let cancelled = self.lock().wrapup.cancel_all();
        for call_id in &cancelled {
            info!(call_id = %call_id, "wrap-up cancelled");
        }
    }

    pub fn is_wrapup_pending(&self, call_id: &CallId) -> bool {
        self.lock().wrapup.is_pending(call_id)
    }

    // ── Mute, hold and recording ─────────────────────────────────────────────

    pub async fn mute(&self) -> CallsimResult<MuteToggleResult> {
        self.set_muted(GatedOperation::Mute, true)
    }

    pub async fn unmute(&self) -> CallsimResult<MuteToggleResult> {
        self.set_muted(GatedOperation::Unmute, false)
    }

    fn set_muted(&self, operation: GatedOperation, muted: bool) -> CallsimResult<MuteToggleResult> {
        let mut state = self.command_state()?;
        self.gate.check(operation, &state.agent_config)?;
        state.is_muted = muted;
        debug!(muted, "mute toggled");
        Ok(MuteToggleResult { is_muted: muted })
    }

    pub async fn hold(&self, selector: Option<CallSelector>) -> CallsimResult<HoldToggleResult> {
        self.set_on_hold(selector, true)
    }

    pub async fn resume(&self, selector: Option<CallSelector>) -> CallsimResult<HoldToggleResult> {
        self.set_on_hold(selector, false)
    }

    fn set_on_hold(
        &self,
        selector: Option<CallSelector>,
        on_hold: bool,
    ) -> CallsimResult<HoldToggleResult> {
        let selector = selector.unwrap_or_else(CallSelector::initial_caller);
        let mut state = self.command_state()?;
        let call = state.registry.find_mut(&selector)?;
        set_hold(call, on_hold);
        debug!(call_id = %call.call_id, on_hold, "hold toggled");
        Ok(state.hold_result())
    }

    /// Exchange the hold state of two legs. Both legs are resolved before
    /// either is touched.
    pub async fn swap_calls(
        &self,
        first: CallSelector,
        second: CallSelector,
    ) -> CallsimResult<HoldToggleResult> {
        let mut state = self.command_state()?;
        self.gate.check(GatedOperation::SwapCalls, &state.agent_config)?;

        let first = state.registry.find(&first)?;
        let (first_id, first_held) = (first.call_id.clone(), first.call_info.is_on_hold);
        let second = state.registry.find(&second)?;
        let (second_id, second_held) = (second.call_id.clone(), second.call_info.is_on_hold);

        match (first_held, second_held) {
            (true, true) => {
                set_hold(state.registry.find_mut(&CallSelector::ById(second_id))?, false);
            }
            (false, false) => {}
            _ => {
                set_hold(state.registry.find_mut(&CallSelector::ById(first_id))?, !first_held);
                set_hold(state.registry.find_mut(&CallSelector::ById(second_id))?, !second_held);
            }
        }

        debug!("calls swapped");
        Ok(state.hold_result())
    }

    /// Merge legs into one conversation by taking all of them off hold. An
    /// empty list merges every active leg.
    pub async fn conference(&self, calls: Vec<CallSelector>) -> CallsimResult<HoldToggleResult> {
        let mut state = self.command_state()?;
        self.gate.check(GatedOperation::Conference, &state.agent_config)?;

        let ids: Vec<CallId> = if calls.is_empty() {
            state.registry.calls().into_iter().map(|call| call.call_id).collect()
        } else {
            calls
                .iter()
                .map(|selector| state.registry.find(selector).map(|call| call.call_id.clone()))
                .collect::<CallsimResult<Vec<_>>>()?
        };
        for id in ids {
            set_hold(state.registry.find_mut(&CallSelector::ById(id))?, false);
        }

        info!(legs = state.registry.len(), "conference started");
        Ok(state.hold_result())
    }

    pub async fn pause_recording(
        &self,
        selector: Option<CallSelector>,
    ) -> CallsimResult<RecordingToggleResult> {
        self.set_recording_paused(GatedOperation::PauseRecording, selector, true)
    }

    pub async fn resume_recording(
        &self,
        selector: Option<CallSelector>,
    ) -> CallsimResult<RecordingToggleResult> {
        self.set_recording_paused(GatedOperation::ResumeRecording, selector, false)
    }

    fn set_recording_paused(
        &self,
        operation: GatedOperation,
        selector: Option<CallSelector>,
        paused: bool,
    ) -> CallsimResult<RecordingToggleResult> {
        let selector = selector.unwrap_or_else(CallSelector::initial_caller);
        let mut state = self.command_state()?;
        self.gate.check(operation, &state.agent_config)?;
        let call = state.registry.find_mut(&selector)?;
        call.call_info.is_recording_paused = paused;
        debug!(call_id = %call.call_id, paused, "recording toggled");
        Ok(RecordingToggleResult {
            call_id: call.call_id.clone(),
            is_recording_paused: paused,
        })
    }

    /// Send DTMF digits on the active call.
    pub async fn send_digits(&self, digits: &str) -> CallsimResult<()> {
        let state = self.command_state()?;
        let call = state.registry.first().ok_or(CallsimError::CallNotFound(CallLookup::Any))?;
        debug!(call_id = %call.call_id, digits, "digits sent");
        Ok(())
    }

    // ── Transfer ─────────────────────────────────────────────────────────────

    /// Bring a third party into the interaction referenced by `call`.
    ///
    /// A warm transfer keeps the customer leg and needs the merge
    /// capability; a blind transfer drops the customer leg immediately.
    pub async fn add_participant(
        &self,
        contact: Contact,
        call: CallSelector,
        is_blind_transfer: bool,
    ) -> CallsimResult<ParticipantResult> {
        let mut state = self.command_state()?;
        if !is_blind_transfer {
            self.gate.check(GatedOperation::AddParticipant, &state.agent_config)?;
        }
        if state.registry.contains_participant(ParticipantType::ThirdParty) {
            warn!("transfer rejected, third party already active");
            return Err(CallsimError::AgentUnavailable(Unavailability::Transfer));
        }

        let initial = state.registry.find(&call)?.clone();
        let mut third_party = Call::new(
            CallId::generate(),
            initial.call_type,
            CallState::Ringing,
            ParticipantType::ThirdParty,
        );
        third_party.phone_number = contact.phone_number.clone();
        third_party.contact = Some(contact.clone());
        let result_call_info = third_party.call_info.clone();
        let third_party_id = third_party.call_id.clone();
        state.registry.add(third_party)?;

        if is_blind_transfer {
            self.end_legs(&mut state, &[initial.call_id.clone()])?;
        }

        info!(
            call_id = %third_party_id,
            initial_call_id = %initial.call_id,
            blind = is_blind_transfer,
            "participant added"
        );
        Ok(ParticipantResult {
            call_id: third_party_id,
            phone_number: initial.phone_number.or(contact.phone_number),
            call_info: result_call_info,
            initial_call_has_ended: is_blind_transfer,
        })
    }

    /// Vendor side: the third party answered.
    pub fn connect_participant(&self) -> CallsimResult<ParticipantResult> {
        let result = {
            let mut state = self.lock();
            let initial = state.registry.participant(ParticipantType::InitialCaller).cloned();
            let third_party = state
                .registry
                .find_mut(&CallSelector::ByParticipant(ParticipantType::ThirdParty))?;
            require_state(third_party, CallState::Ringing, "connect participant")?;
            answer(third_party);
            ParticipantResult {
                call_id: third_party.call_id.clone(),
                phone_number: initial
                    .as_ref()
                    .and_then(|call| call.phone_number.clone())
                    .or_else(|| third_party.phone_number.clone()),
                call_info: third_party.call_info.clone(),
                initial_call_has_ended: initial.is_none(),
            }
        };

        info!(call_id = %result.call_id, "participant connected");
        self.publish(TelephonyEvent::ParticipantConnected(result.clone()));
        Ok(result)
    }

    // ── Agent status and configuration ───────────────────────────────────────

    /// Change the agent's presence.
    ///
    /// With `enqueue_next_state` set while legs are active, the reported
    /// status changes when the last leg ends; whether call availability
    /// changes now or then follows `EngineConfig::enqueued_status`.
    pub async fn set_agent_status(
        &self,
        status: AgentStatus,
        info: Option<AgentStatusInfo>,
        enqueue_next_state: bool,
    ) -> CallsimResult<GenericResult> {
        let mut state = self.command_state()?;
        let presence = AgentPresence { status, info };

        if enqueue_next_state && !state.registry.is_empty() {
            if self.settings.enqueued_status == EnqueuedStatusPolicy::GateImmediately {
                state.agent_available = status.is_available();
            }
            info!(status = ?status, policy = ?self.settings.enqueued_status, "agent status queued");
            state.pending_presence = Some(presence);
        } else {
            info!(status = ?status, "agent status set");
            state.agent_available = status.is_available();
            state.presence = presence;
            state.pending_presence = None;
        }
        Ok(GenericResult::ok())
    }

    /// Presence as currently reported.
    pub fn agent_presence(&self) -> AgentPresence {
        self.lock().presence.clone()
    }

    pub fn is_agent_available(&self) -> bool {
        self.lock().agent_available
    }

    pub async fn get_agent_config(&self) -> CallsimResult<AgentConfig> {
        Ok(self.command_state()?.agent_config.clone())
    }

    /// Host-initiated partial configuration change.
    pub async fn set_agent_config(&self, update: AgentConfigUpdate) -> CallsimResult<GenericResult> {
        let mut state = self.command_state()?;
        state.agent_config.apply(update);
        debug!(config = ?state.agent_config, "agent config updated");
        Ok(GenericResult::ok())
    }

    /// Simulator-side configuration change; never rejected.
    pub fn update_agent_config(&self, update: AgentConfigUpdate) {
        let mut state = self.lock();
        state.agent_config.apply(update);
        debug!(config = ?state.agent_config, "agent config updated by simulator");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;
    use callsim_contracts::{
        agent::Phone, capability::Capability, contact::ContactType, event::EventType,
    };
    use tokio::sync::Notify;

    use crate::traits::BackendError;

    // ── Mock implementations ─────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct RecordingPublisher {
        events: Arc<Mutex<Vec<TelephonyEvent>>>,
    }

    impl RecordingPublisher {
        fn events(&self) -> Vec<TelephonyEvent> {
            self.events.lock().unwrap().clone()
        }

        fn types(&self) -> Vec<EventType> {
            self.events().iter().map(TelephonyEvent::event_type).collect()
        }

        fn count(&self, event_type: EventType) -> usize {
            self.types().into_iter().filter(|t| *t == event_type).count()
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, event: TelephonyEvent) -> CallsimResult<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// Mirrors the agent-config gate: each operation needs one flag.
    struct FlagGate;

    impl CapabilityGate for FlagGate {
        fn check(&self, operation: GatedOperation, config: &AgentConfig) -> CallsimResult<()> {
            let (capability, enabled) = match operation {
                GatedOperation::Mute | GatedOperation::Unmute => (Capability::Mute, config.has_mute),
                GatedOperation::Conference | GatedOperation::AddParticipant => {
                    (Capability::Merge, config.has_merge)
                }
                GatedOperation::SwapCalls => (Capability::Swap, config.has_swap),
                GatedOperation::PauseRecording | GatedOperation::ResumeRecording => {
                    (Capability::Record, config.has_record)
                }
            };
            if enabled {
                Ok(())
            } else {
                Err(CallsimError::CapabilityNotSupported { capability })
            }
        }
    }

    #[derive(Clone, Copy)]
    enum Registration {
        Mint,
        Decline,
        Fail,
        /// Always answers with the same id.
        Fixed,
    }

    struct MockBackend {
        registration: Registration,
        tenant_ok: bool,
        counter: AtomicU64,
        requests: Arc<Mutex<Vec<RegistrationRequest>>>,
        /// When set, registration waits for a notification before answering.
        hold_until: Option<Arc<Notify>>,
    }

    impl MockBackend {
        fn new(registration: Registration) -> Self {
            Self {
                registration,
                tenant_ok: true,
                counter: AtomicU64::new(0),
                requests: Arc::new(Mutex::new(Vec::new())),
                hold_until: None,
            }
        }
    }

    #[async_trait]
    impl TelephonyBackend for MockBackend {
        async fn register_call(
            &self,
            request: RegistrationRequest,
        ) -> Result<RegistrationResponse, BackendError> {
            self.requests.lock().unwrap().push(request);
            if let Some(notify) = &self.hold_until {
                notify.notified().await;
            }
            match self.registration {
                Registration::Mint => {
                    let n = self.counter.fetch_add(1, Ordering::SeqCst);
                    Ok(RegistrationResponse::VoiceCallId(format!("vc-{n}")))
                }
                Registration::Decline => Ok(RegistrationResponse::Unavailable),
                Registration::Fail => Err(BackendError::new("503 service unavailable")),
                Registration::Fixed => Ok(RegistrationResponse::VoiceCallId("vc-fixed".into())),
            }
        }

        async fn configure_tenant(&self, _config: &CallCenterConfig) -> Result<bool, BackendError> {
            Ok(self.tenant_ok)
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Refuses every event.
    struct RefusingPublisher;

    impl EventPublisher for RefusingPublisher {
        fn publish(&self, _event: TelephonyEvent) -> CallsimResult<()> {
            Err(CallsimError::PublishFailed { reason: "host disconnected".into() })
        }
    }

    const CALLER: &str = "555-0100";

    fn build(config: EngineConfig, backend: MockBackend) -> (TelephonyEngine, RecordingPublisher) {
        let publisher = RecordingPublisher::default();
        let engine = TelephonyEngine::new(
            config,
            Arc::new(FlagGate),
            Arc::new(publisher.clone()),
            Arc::new(backend),
        );
        (engine, publisher)
    }

    fn engine() -> (TelephonyEngine, RecordingPublisher) {
        build(EngineConfig::default(), MockBackend::new(Registration::Mint))
    }

    async fn inbound(engine: &TelephonyEngine) -> Call {
        engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::InitialCaller))
            .await
            .unwrap()
            .call
    }

    async fn inbound_with_third_party(engine: &TelephonyEngine) -> (Call, CallId) {
        let initial = inbound(engine).await;
        let added = engine
            .add_participant(Contact::with_number("555-0300"), (&initial).into(), false)
            .await
            .unwrap();
        (initial, added.call_id)
    }

    async fn past_wrapup() {
        tokio::time::sleep(Duration::from_millis(5_001)).await;
    }

    // ── Publish failures ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn publish_failure_keeps_the_committed_change() {
        let engine = TelephonyEngine::new(
            EngineConfig::default(),
            Arc::new(FlagGate),
            Arc::new(RefusingPublisher),
            Arc::new(MockBackend::new(Registration::Mint)),
        );

        let started = engine
            .start_inbound_call(CALLER, CallAttributes::default())
            .await
            .unwrap();
        let active = engine.get_active_calls().await.unwrap();
        assert!(active.active_calls.contains_key(&started.call.call_id));

        let hangup = engine.hangup().await.unwrap();
        assert_eq!(hangup.calls.len(), 1);
        assert!(engine.get_active_calls().await.unwrap().active_calls.is_empty());

        assert!(engine.subsystem_login_result(true).is_ok());
        assert!(engine.is_logged_in());

        assert!(matches!(
            engine.publish_message(serde_json::json!({ "text": "hi" })),
            Err(CallsimError::PublishFailed { .. })
        ));
    }

    // ── Inbound calls ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn inbound_call_rings_then_connects_on_accept() {
        let (engine, publisher) = engine();

        let started = engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::InitialCaller))
            .await
            .unwrap();
        assert!(!started.call.call_id.as_str().is_empty());
        assert_eq!(started.call.state, CallState::Ringing);
        assert_eq!(started.call.phone_number.as_deref(), Some(CALLER));

        match publisher.events().as_slice() {
            [TelephonyEvent::CallStarted(result)] => {
                assert_eq!(result.call.state, CallState::Ringing);
                assert_eq!(result.call.call_id, started.call.call_id);
            }
            other => panic!("expected one CALL_STARTED, got {:?}", other),
        }

        let accepted = engine.accept_call(Some((&started.call).into())).await.unwrap();
        assert_eq!(accepted.call.state, CallState::Connected);
        assert!(accepted.call.call_info.call_state_timestamp >= started.call.call_info.call_state_timestamp);
    }

    #[tokio::test]
    async fn inbound_defaults_to_initial_caller() {
        let (engine, _) = engine();
        let call = engine
            .start_inbound_call(CALLER, CallAttributes::default())
            .await
            .unwrap()
            .call;
        assert_eq!(call.participant_type, ParticipantType::InitialCaller);
    }

    #[tokio::test]
    async fn inbound_rejected_while_offline() {
        let (engine, publisher) = engine();
        engine.set_agent_status(AgentStatus::Offline, None, false).await.unwrap();

        let result = engine.start_inbound_call(CALLER, CallAttributes::default()).await;
        match result {
            Err(err @ CallsimError::AgentUnavailable(Unavailability::Inbound { .. })) => {
                assert!(err.to_string().contains(CALLER));
            }
            other => panic!("expected AgentUnavailable(Inbound), got {:?}", other),
        }
        assert!(publisher.events().is_empty());
        assert!(engine.get_active_calls().await.unwrap().active_calls.is_empty());
    }

    #[tokio::test]
    async fn declined_registration_falls_back_to_local_id() {
        let (engine, publisher) = build(EngineConfig::default(), MockBackend::new(Registration::Decline));

        let call = inbound(&engine).await;
        assert!(!call.call_id.as_str().is_empty());
        assert!(!call.call_id.as_str().starts_with("vc-"));
        assert_eq!(publisher.count(EventType::CallStarted), 1);
    }

    #[tokio::test]
    async fn failed_registration_is_propagated() {
        let (engine, publisher) = build(EngineConfig::default(), MockBackend::new(Registration::Fail));

        let result = engine.start_inbound_call(CALLER, CallAttributes::default()).await;
        match result {
            Err(CallsimError::ExternalServiceFailure { reason }) => {
                assert!(reason.contains("503"));
            }
            other => panic!("expected ExternalServiceFailure, got {:?}", other),
        }
        assert!(publisher.events().is_empty());
        assert!(engine.get_active_calls().await.unwrap().active_calls.is_empty());
    }

    #[tokio::test]
    async fn duplicate_backend_id_is_rejected() {
        let (engine, _) = build(EngineConfig::default(), MockBackend::new(Registration::Fixed));

        inbound(&engine).await;
        let second = engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::ThirdParty))
            .await;
        assert!(matches!(second, Err(CallsimError::DuplicateCallId { .. })));
        assert_eq!(engine.get_active_calls().await.unwrap().active_calls.len(), 1);
    }

    #[tokio::test]
    async fn availability_is_rechecked_after_registration() {
        let notify = Arc::new(Notify::new());
        let mut backend = MockBackend::new(Registration::Mint);
        backend.hold_until = Some(Arc::clone(&notify));
        let requests = Arc::clone(&backend.requests);
        let (engine, publisher) = build(EngineConfig::default(), backend);

        let pending = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.start_inbound_call(CALLER, CallAttributes::default()).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(requests.lock().unwrap().len(), 1);

        engine.set_agent_status(AgentStatus::Offline, None, false).await.unwrap();
        notify.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(
            result,
            Err(CallsimError::AgentUnavailable(Unavailability::Inbound { .. }))
        ));
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn accept_requires_ringing() {
        let (engine, _) = engine();
        let call = inbound(&engine).await;
        engine.accept_call(None).await.unwrap();

        match engine.accept_call(Some((&call).into())).await {
            Err(CallsimError::InvalidTransition { state, operation, .. }) => {
                assert_eq!(state, CallState::Connected);
                assert_eq!(operation, "accept");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn hold_before_accept_answers_on_hold() {
        let (engine, _) = engine();
        let call = inbound(&engine).await;

        let held = engine.hold(None).await.unwrap();
        assert!(held.is_customer_on_hold);
        assert_eq!(engine.get_call(&(&call).into()).unwrap().state, CallState::Ringing);

        let accepted = engine.accept_call(None).await.unwrap().call;
        assert_eq!(accepted.state, CallState::OnHold);
        assert!(accepted.call_info.is_on_hold);

        engine.resume(None).await.unwrap();
        let leg = engine.get_call(&(&call).into()).unwrap();
        assert_eq!(leg.state, CallState::Connected);
        assert!(!leg.call_info.is_on_hold);
    }

    #[tokio::test(start_paused = true)]
    async fn decline_ends_the_leg_and_starts_wrapup() {
        let (engine, publisher) = engine();
        let call = inbound(&engine).await;

        let declined = engine.decline_call(None).await.unwrap();
        assert_eq!(declined.call.state, CallState::Ended);
        assert!(engine.get_active_calls().await.unwrap().active_calls.is_empty());
        assert!(engine.is_wrapup_pending(&call.call_id));

        past_wrapup().await;
        assert_eq!(publisher.count(EventType::AfterCallWorkStarted), 1);
    }

    // ── Outbound calls ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn dial_hangup_dial_releases_the_outbound_slot() {
        let (engine, _) = engine();

        engine.dial(Contact::with_number("555-0200"), DialOptions::default()).await.unwrap();
        engine.hangup().await.unwrap();
        let again = engine.dial(Contact::with_number("555-0200"), DialOptions::default()).await;
        assert!(again.is_ok(), "second dial failed: {:?}", again);
    }

    #[tokio::test]
    async fn second_dial_rejected_while_outbound_active() {
        let (engine, publisher) = engine();

        engine.dial(Contact::with_number("555-0201"), DialOptions::default()).await.unwrap();
        let second = engine.dial(Contact::with_number("555-0200"), DialOptions::default()).await;
        match second {
            Err(CallsimError::AgentUnavailable(Unavailability::Outbound)) => {}
            other => panic!("expected AgentUnavailable(Outbound), got {:?}", other),
        }
        assert_eq!(publisher.count(EventType::CallStarted), 1);
    }

    #[tokio::test]
    async fn concurrent_dials_allocate_one_slot() {
        let (engine, _) = engine();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .dial(Contact::with_number(format!("555-02{i:02}")), DialOptions::default())
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CallsimError::AgentUnavailable(Unavailability::Outbound)) => {}
                Err(other) => panic!("unexpected error {:?}", other),
            }
        }
        assert_eq!(succeeded, 1);
    }

    #[tokio::test]
    async fn dial_from_desk_phone_publishes_nothing() {
        let (engine, publisher) = engine();

        let result = engine
            .dial(Contact::with_number("555-0200"), DialOptions { is_softphone_call: false })
            .await
            .unwrap();
        assert_eq!(result.call.state, CallState::Connecting);
        assert_eq!(result.call.call_type, CallType::Outbound);
        assert!(!result.call.call_info.is_softphone_call);
        assert!(publisher.events().is_empty());
    }

    #[tokio::test]
    async fn connect_call_moves_connecting_to_connected() {
        let (engine, publisher) = engine();
        engine.dial(Contact::with_number("555-0200"), DialOptions::default()).await.unwrap();

        let connected = engine.connect_call(None).unwrap();
        assert_eq!(connected.call.state, CallState::Connected);
        assert_eq!(publisher.types(), vec![EventType::CallStarted, EventType::CallConnected]);

        assert!(matches!(
            engine.connect_call(None),
            Err(CallsimError::InvalidTransition { operation: "connect", .. })
        ));
    }

    #[tokio::test]
    async fn callback_is_queued_then_accepted() {
        let (engine, publisher) = engine();

        let queued = engine.request_callback(Contact::with_number("555-0400")).unwrap();
        assert_eq!(queued.call.call_type, CallType::Callback);
        assert_eq!(queued.call.state, CallState::Ringing);
        assert_eq!(publisher.types(), vec![EventType::QueuedCallStarted]);

        let accepted = engine.accept_call(None).await.unwrap();
        assert_eq!(accepted.call.state, CallState::Connected);
    }

    // ── Transfer and participants ────────────────────────────────────────────

    #[tokio::test]
    async fn add_participant_reports_initial_caller() {
        let (engine, publisher) = engine();
        let initial = inbound(&engine).await;

        let added = engine
            .add_participant(Contact::with_number("555-0300"), (&initial).into(), false)
            .await
            .unwrap();
        assert_eq!(added.phone_number.as_deref(), Some(CALLER));
        assert!(!added.initial_call_has_ended);
        assert!(!added.call_info.is_on_hold);
        assert_ne!(added.call_id, initial.call_id);

        let leg = engine.get_call(&added.call_id.clone().into()).unwrap();
        assert_eq!(leg.participant_type, ParticipantType::ThirdParty);
        assert_eq!(leg.state, CallState::Ringing);
        assert_eq!(leg.phone_number.as_deref(), Some("555-0300"));
        // Adding a participant publishes nothing on its own.
        assert_eq!(publisher.types(), vec![EventType::CallStarted]);
    }

    #[tokio::test]
    async fn second_add_participant_is_rejected() {
        let (engine, _) = engine();
        let (initial, _) = inbound_with_third_party(&engine).await;

        let second = engine
            .add_participant(Contact::with_number("555-0301"), (&initial).into(), false)
            .await;
        match second {
            Err(CallsimError::AgentUnavailable(Unavailability::Transfer)) => {}
            other => panic!("expected AgentUnavailable(Transfer), got {:?}", other),
        }
        assert_eq!(engine.get_active_calls().await.unwrap().active_calls.len(), 2);
    }

    #[tokio::test]
    async fn blind_transfer_drops_initial_leg() {
        let (engine, _) = engine();
        engine
            .update_agent_config(AgentConfigUpdate { has_merge: Some(false), ..Default::default() });
        let initial = inbound(&engine).await;

        let added = engine
            .add_participant(Contact::with_number("555-0300"), (&initial).into(), true)
            .await
            .unwrap();
        assert!(added.initial_call_has_ended);

        let active = engine.get_active_calls().await.unwrap().active_calls;
        assert_eq!(active.len(), 1);
        assert!(active.contains_key(&added.call_id));
        assert!(!engine.is_wrapup_pending(&initial.call_id));
    }

    #[tokio::test]
    async fn warm_transfer_needs_merge() {
        let (engine, _) = engine();
        engine
            .update_agent_config(AgentConfigUpdate { has_merge: Some(false), ..Default::default() });
        let initial = inbound(&engine).await;

        let result = engine
            .add_participant(Contact::with_number("555-0300"), (&initial).into(), false)
            .await;
        assert!(matches!(
            result,
            Err(CallsimError::CapabilityNotSupported { capability: Capability::Merge })
        ));
        assert_eq!(engine.get_active_calls().await.unwrap().active_calls.len(), 1);
    }

    #[tokio::test]
    async fn connect_participant_publishes_participant_connected() {
        let (engine, publisher) = engine();
        let (_, third_party) = inbound_with_third_party(&engine).await;

        let result = engine.connect_participant().unwrap();
        assert_eq!(result.call_id, third_party);
        assert_eq!(result.phone_number.as_deref(), Some(CALLER));
        assert!(!result.initial_call_has_ended);

        match publisher.events().last() {
            Some(TelephonyEvent::ParticipantConnected(payload)) => assert_eq!(payload, &result),
            other => panic!("expected PARTICIPANT_CONNECTED, got {:?}", other),
        }
        let leg = engine.get_call(&ParticipantType::ThirdParty.into()).unwrap();
        assert_eq!(leg.state, CallState::Connected);
    }

    #[tokio::test]
    async fn connect_participant_requires_a_ringing_third_party() {
        let (engine, publisher) = engine();
        inbound_with_third_party(&engine).await;
        engine.connect_participant().unwrap();
        engine.hold(Some(ParticipantType::ThirdParty.into())).await.unwrap();

        match engine.connect_participant() {
            Err(CallsimError::InvalidTransition { state, operation, .. }) => {
                assert_eq!(state, CallState::OnHold);
                assert_eq!(operation, "connect participant");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        let leg = engine.get_call(&ParticipantType::ThirdParty.into()).unwrap();
        assert_eq!(leg.state, CallState::OnHold);
        assert!(leg.call_info.is_on_hold);
        assert_eq!(publisher.count(EventType::ParticipantConnected), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_third_party_keeps_customer_and_skips_wrapup() {
        let (engine, publisher) = engine();
        inbound_with_third_party(&engine).await;

        let removed = engine.remove_participant(ParticipantType::ThirdParty).await.unwrap();
        assert_eq!(removed.call.state, CallState::Ended);

        past_wrapup().await;
        assert_eq!(publisher.types(), vec![EventType::CallStarted, EventType::ParticipantRemoved]);
        match publisher.events().last() {
            Some(TelephonyEvent::ParticipantRemoved(payload)) => assert_eq!(payload, &removed),
            other => panic!("expected PARTICIPANT_REMOVED, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn removing_last_leg_starts_wrapup_after_delay() {
        let (engine, publisher) = engine();
        let call = inbound(&engine).await;

        engine.remove_participant(ParticipantType::InitialCaller).await.unwrap();

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(publisher.count(EventType::AfterCallWorkStarted), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        match publisher.events().last() {
            Some(TelephonyEvent::AfterCallWorkStarted(payload)) => {
                assert_eq!(payload.call_id, call.call_id)
            }
            other => panic!("expected AFTER_CALL_WORK_STARTED, got {:?}", other),
        }
        assert!(!engine.is_wrapup_pending(&call.call_id));
    }

    // ── Ending calls ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn end_agent_leg_without_third_party_names_third_party() {
        let (engine, _) = engine();
        inbound(&engine).await;
        engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::Agent))
            .await
            .unwrap();

        let result = engine.end_call(ParticipantType::Agent.into()).await;
        match result {
            Err(CallsimError::CallNotFound(CallLookup::Participant(missing))) => {
                assert_eq!(missing, ParticipantType::ThirdParty)
            }
            other => panic!("expected CallNotFound(THIRD_PARTY), got {:?}", other),
        }
        assert_eq!(engine.get_active_calls().await.unwrap().active_calls.len(), 2);
    }

    #[tokio::test]
    async fn end_agent_leg_without_initial_caller_names_initial_caller() {
        let (engine, _) = engine();
        engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::ThirdParty))
            .await
            .unwrap();
        engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::Agent))
            .await
            .unwrap();

        let result = engine.end_call(ParticipantType::Agent.into()).await;
        assert!(matches!(
            result,
            Err(CallsimError::CallNotFound(CallLookup::Participant(ParticipantType::InitialCaller)))
        ));
        assert_eq!(engine.get_active_calls().await.unwrap().active_calls.len(), 2);
    }

    #[tokio::test]
    async fn end_agent_leg_ends_the_whole_conference() {
        let (engine, publisher) = engine();
        let (initial, third_party) = inbound_with_third_party(&engine).await;
        let agent = engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::Agent))
            .await
            .unwrap()
            .call;

        let ended = engine.end_call((&agent).into()).await.unwrap();
        let ids: Vec<_> = ended.calls.iter().map(|c| c.call_id.clone()).collect();
        assert_eq!(ids, vec![initial.call_id.clone(), third_party, agent.call_id]);
        assert!(ended.calls.iter().all(|c| c.state == CallState::Ended));
        assert!(engine.get_active_calls().await.unwrap().active_calls.is_empty());
        assert!(engine.is_wrapup_pending(&initial.call_id));
        assert_eq!(publisher.count(EventType::Hangup), 0);
    }

    #[tokio::test]
    async fn end_call_ends_only_that_leg() {
        let (engine, _) = engine();
        let (initial, third_party) = inbound_with_third_party(&engine).await;

        let ended = engine.end_call(third_party.clone().into()).await.unwrap();
        assert_eq!(ended.calls.len(), 1);
        assert_eq!(ended.calls[0].call_id, third_party);
        assert!(engine.get_call(&(&initial).into()).is_ok());
        assert!(!engine.is_wrapup_pending(&third_party));
    }

    #[tokio::test(start_paused = true)]
    async fn hangup_publishes_all_legs_in_creation_order() {
        let (engine, publisher) = engine();
        let (initial, third_party) = inbound_with_third_party(&engine).await;

        let result = engine.hangup().await.unwrap();
        let ids: Vec<_> = result.calls.iter().map(|c| c.call_id.clone()).collect();
        assert_eq!(ids, vec![initial.call_id.clone(), third_party]);

        match publisher.events().last() {
            Some(TelephonyEvent::Hangup(payload)) => assert_eq!(payload, &result),
            other => panic!("expected HANGUP, got {:?}", other),
        }

        past_wrapup().await;
        match publisher.events().last() {
            Some(TelephonyEvent::AfterCallWorkStarted(payload)) => {
                assert_eq!(payload.call_id, initial.call_id)
            }
            other => panic!("expected AFTER_CALL_WORK_STARTED, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn hangup_without_calls_is_silent() {
        let (engine, publisher) = engine();
        let result = engine.hangup().await.unwrap();
        assert!(result.calls.is_empty());
        assert!(publisher.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn end_wrapup_cancels_pending_timer() {
        let (engine, publisher) = engine();
        let call = inbound(&engine).await;
        engine.hangup().await.unwrap();
        assert!(engine.is_wrapup_pending(&call.call_id));

        engine.end_wrapup();
        engine.end_wrapup();
        assert!(!engine.is_wrapup_pending(&call.call_id));

        past_wrapup().await;
        assert_eq!(publisher.count(EventType::AfterCallWorkStarted), 0);
    }

    // ── Hold, mute, swap, conference, recording ──────────────────────────────

    #[tokio::test]
    async fn hold_then_resume_is_idempotent() {
        let (engine, _) = engine();
        inbound(&engine).await;
        engine.accept_call(None).await.unwrap();

        let held = engine.hold(None).await.unwrap();
        assert!(held.is_customer_on_hold);
        assert!(!held.is_third_party_on_hold);
        assert!(engine.hold(None).await.unwrap().is_customer_on_hold);
        let call = engine.get_call(&CallSelector::initial_caller()).unwrap();
        assert_eq!(call.state, CallState::OnHold);

        assert!(!engine.resume(None).await.unwrap().is_customer_on_hold);
        assert!(!engine.resume(None).await.unwrap().is_customer_on_hold);
        assert!(!engine.is_on_hold(&CallSelector::initial_caller()).unwrap());
        let call = engine.get_call(&CallSelector::initial_caller()).unwrap();
        assert_eq!(call.state, CallState::Connected);
    }

    #[tokio::test]
    async fn hold_on_missing_leg_reports_lookup() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.hold(None).await,
            Err(CallsimError::CallNotFound(CallLookup::Any))
        ));
    }

    #[tokio::test]
    async fn mute_disabled_rejects_mute_and_unmute() {
        let (engine, _) = engine();
        engine.set_agent_config(AgentConfigUpdate { has_mute: Some(false), ..Default::default() })
            .await
            .unwrap();

        for result in [engine.mute().await, engine.unmute().await] {
            match result {
                Err(err @ CallsimError::CapabilityNotSupported { capability: Capability::Mute }) => {
                    assert!(err.to_string().contains("mute"));
                }
                other => panic!("expected CapabilityNotSupported(mute), got {:?}", other),
            }
        }
        assert!(!engine.is_muted());
    }

    #[tokio::test]
    async fn mute_toggles_session_flag() {
        let (engine, _) = engine();
        assert!(engine.mute().await.unwrap().is_muted);
        assert!(engine.is_muted());
        assert!(!engine.unmute().await.unwrap().is_muted);
        assert!(!engine.is_muted());
    }

    #[tokio::test]
    async fn swap_exchanges_hold_state() {
        let (engine, _) = engine();
        let (initial, third_party) = inbound_with_third_party(&engine).await;
        engine.hold(Some((&initial).into())).await.unwrap();

        let swapped = engine
            .swap_calls((&initial).into(), third_party.clone().into())
            .await
            .unwrap();
        assert!(!swapped.is_customer_on_hold);
        assert!(swapped.is_third_party_on_hold);

        let swapped_back = engine
            .swap_calls((&initial).into(), third_party.into())
            .await
            .unwrap();
        assert!(swapped_back.is_customer_on_hold);
        assert!(!swapped_back.is_third_party_on_hold);
    }

    #[tokio::test]
    async fn swap_with_missing_leg_changes_nothing() {
        let (engine, _) = engine();
        let initial = inbound(&engine).await;
        engine.hold(None).await.unwrap();

        let result = engine
            .swap_calls((&initial).into(), ParticipantType::ThirdParty.into())
            .await;
        assert!(matches!(
            result,
            Err(CallsimError::CallNotFound(CallLookup::Participant(ParticipantType::ThirdParty)))
        ));
        assert!(engine.is_on_hold(&(&initial).into()).unwrap());
    }

    #[tokio::test]
    async fn swap_needs_swap_capability() {
        let (engine, _) = engine();
        engine.update_agent_config(AgentConfigUpdate { has_swap: Some(false), ..Default::default() });
        let result = engine
            .swap_calls(CallSelector::initial_caller(), ParticipantType::ThirdParty.into())
            .await;
        assert!(matches!(
            result,
            Err(CallsimError::CapabilityNotSupported { capability: Capability::Swap })
        ));
    }

    #[tokio::test]
    async fn conference_takes_every_leg_off_hold() {
        let (engine, _) = engine();
        let (initial, third_party) = inbound_with_third_party(&engine).await;
        engine.hold(Some((&initial).into())).await.unwrap();
        engine.hold(Some(third_party.clone().into())).await.unwrap();

        let result = engine
            .conference(vec![(&initial).into(), third_party.into()])
            .await
            .unwrap();
        assert!(!result.is_customer_on_hold);
        assert!(!result.is_third_party_on_hold);
        assert_eq!(result.calls.len(), 2);
    }

    #[tokio::test]
    async fn conference_with_unknown_leg_merges_nothing() {
        let (engine, _) = engine();
        let initial = inbound(&engine).await;
        engine.accept_call(None).await.unwrap();
        engine.hold(None).await.unwrap();

        let result = engine
            .conference(vec![(&initial).into(), CallSelector::ById(CallId::new("missing"))])
            .await;
        match result {
            Err(CallsimError::CallNotFound(CallLookup::CallId(id))) => {
                assert_eq!(id.as_str(), "missing")
            }
            other => panic!("expected CallNotFound, got {:?}", other),
        }

        let leg = engine.get_call(&(&initial).into()).unwrap();
        assert_eq!(leg.state, CallState::OnHold);
        assert!(leg.call_info.is_on_hold);
    }

    #[tokio::test]
    async fn conference_needs_merge_even_without_calls() {
        let (engine, _) = engine();
        engine.update_agent_config(AgentConfigUpdate { has_merge: Some(false), ..Default::default() });
        assert!(matches!(
            engine.conference(Vec::new()).await,
            Err(CallsimError::CapabilityNotSupported { capability: Capability::Merge })
        ));
    }

    #[tokio::test]
    async fn recording_pause_and_resume() {
        let (engine, _) = engine();
        let call = inbound(&engine).await;

        let paused = engine.pause_recording(None).await.unwrap();
        assert_eq!(paused.call_id, call.call_id);
        assert!(paused.is_recording_paused);
        assert!(engine.get_call(&(&call).into()).unwrap().call_info.is_recording_paused);

        let resumed = engine.resume_recording(Some((&call).into())).await.unwrap();
        assert!(!resumed.is_recording_paused);
    }

    #[tokio::test]
    async fn recording_needs_record_capability() {
        let (engine, _) = engine();
        engine.update_agent_config(AgentConfigUpdate { has_record: Some(false), ..Default::default() });
        inbound(&engine).await;

        for result in [engine.pause_recording(None).await, engine.resume_recording(None).await] {
            assert!(matches!(
                result,
                Err(CallsimError::CapabilityNotSupported { capability: Capability::Record })
            ));
        }
    }

    #[tokio::test]
    async fn send_digits_needs_an_active_call() {
        let (engine, _) = engine();
        assert!(matches!(
            engine.send_digits("123#").await,
            Err(CallsimError::CallNotFound(CallLookup::Any))
        ));
        inbound(&engine).await;
        assert!(engine.send_digits("123#").await.is_ok());
    }

    // ── Agent status and configuration ───────────────────────────────────────

    #[tokio::test]
    async fn queued_status_defers_until_idle_by_default() {
        let (engine, _) = engine();
        inbound(&engine).await;

        engine.set_agent_status(AgentStatus::Offline, None, true).await.unwrap();
        assert!(engine.is_agent_available());
        assert_eq!(engine.agent_presence().status, AgentStatus::Online);

        engine.hangup().await.unwrap();
        assert!(!engine.is_agent_available());
        assert_eq!(engine.agent_presence().status, AgentStatus::Offline);
    }

    #[tokio::test]
    async fn queued_status_can_gate_immediately() {
        let config = EngineConfig {
            enqueued_status: EnqueuedStatusPolicy::GateImmediately,
            ..EngineConfig::default()
        };
        let (engine, _) = build(config, MockBackend::new(Registration::Mint));
        inbound(&engine).await;

        engine.set_agent_status(AgentStatus::Offline, None, true).await.unwrap();
        assert!(!engine.is_agent_available());
        assert_eq!(engine.agent_presence().status, AgentStatus::Online);
        assert!(engine
            .start_inbound_call(CALLER, CallAttributes::participant(ParticipantType::ThirdParty))
            .await
            .is_err());

        engine.hangup().await.unwrap();
        assert_eq!(engine.agent_presence().status, AgentStatus::Offline);
    }

    #[tokio::test]
    async fn status_info_is_kept_with_presence() {
        let (engine, _) = engine();
        let info = AgentStatusInfo {
            status_id: Some("0N5xx0000000001".into()),
            status_api_name: Some("Available".into()),
            status_name: Some("Available".into()),
        };
        engine
            .set_agent_status(AgentStatus::Online, Some(info.clone()), false)
            .await
            .unwrap();
        assert_eq!(engine.agent_presence().info, Some(info));
    }

    #[tokio::test]
    async fn agent_config_merges_partially() {
        let (engine, _) = engine();
        engine
            .set_agent_config(AgentConfigUpdate {
                has_swap: Some(false),
                selected_phone: Some(Phone::desk_phone("111 333 0456").into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let config = engine.get_agent_config().await.unwrap();
        assert!(!config.has_swap);
        assert!(config.has_mute);
        assert_eq!(config.selected_phone, Phone::desk_phone("111 333 0456"));
    }

    #[tokio::test]
    async fn phone_contacts_are_filtered() {
        let config = EngineConfig {
            phone_contacts: vec![
                Contact {
                    id: Some("q1".into()),
                    contact_type: Some(ContactType::Queue),
                    ..Default::default()
                },
                Contact {
                    phone_number: Some("555-1234".into()),
                    contact_type: Some(ContactType::PhoneBook),
                    ..Default::default()
                },
            ],
            ..EngineConfig::default()
        };
        let (engine, _) = build(config, MockBackend::new(Registration::Mint));

        assert_eq!(engine.get_phone_contacts(None).await.unwrap().contacts.len(), 2);
        let by_number = engine
            .get_phone_contacts(Some(ContactFilter { contains: Some("123".into()), contact_type: None }))
            .await
            .unwrap();
        assert_eq!(by_number.contacts.len(), 1);
        let queues = engine
            .get_phone_contacts(Some(ContactFilter {
                contains: None,
                contact_type: Some(ContactType::Queue),
            }))
            .await
            .unwrap();
        assert_eq!(queues.contacts[0].id.as_deref(), Some("q1"));
    }

    // ── Session ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn init_reports_login_page() {
        let (engine, _) = engine();
        let result = engine.init(&CallCenterConfig::default()).await.unwrap();
        assert!(!result.show_login);
        assert_eq!(result.login_frame_height, None);

        engine.show_login_page(true);
        let result = engine.init(&CallCenterConfig::default()).await.unwrap();
        assert!(result.show_login);
        assert_eq!(result.login_frame_height, Some(350));
    }

    #[tokio::test]
    async fn init_fails_when_tenant_is_refused() {
        let mut backend = MockBackend::new(Registration::Mint);
        backend.tenant_ok = false;
        let (engine, _) = build(EngineConfig::default(), backend);

        match engine.init(&CallCenterConfig::default()).await {
            Err(CallsimError::ExternalServiceFailure { reason }) => {
                assert_eq!(reason, "failed to configure tenant information")
            }
            other => panic!("expected ExternalServiceFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn subsystem_events_are_forwarded() {
        let (engine, publisher) = engine();

        engine.subsystem_login_result(true).unwrap();
        assert!(engine.is_logged_in());
        engine.publish_message(serde_json::json!({ "text": "hello" })).unwrap();
        engine.subsystem_logout().unwrap();
        assert!(!engine.is_logged_in());

        assert_eq!(
            publisher.types(),
            vec![EventType::LoginResult, EventType::Message, EventType::LogoutResult]
        );
        assert!(engine.logout().await.unwrap().success);
        assert!(engine.logout().await.unwrap().success);
    }

    #[tokio::test]
    async fn error_injection_rejects_host_commands() {
        let (engine, publisher) = engine();
        let call = inbound(&engine).await;
        engine.set_error_injection(true);

        let injected = |result: CallsimResult<()>| matches!(result, Err(CallsimError::InjectedFailure));
        assert!(injected(engine.accept_call(None).await.map(drop)));
        assert!(injected(engine.hold(None).await.map(drop)));
        assert!(injected(engine.mute().await.map(drop)));
        assert!(injected(engine.hangup().await.map(drop)));
        assert!(injected(engine.end_call((&call).into()).await.map(drop)));
        assert!(injected(engine.dial(Contact::default(), DialOptions::default()).await.map(drop)));
        assert!(injected(engine.get_active_calls().await.map(drop)));
        assert!(injected(engine.get_agent_config().await.map(drop)));
        assert!(injected(engine.logout().await.map(drop)));
        assert!(injected(engine.init(&CallCenterConfig::default()).await.map(drop)));
        assert!(injected(
            engine.start_inbound_call(CALLER, CallAttributes::default()).await.map(drop)
        ));
        assert!(injected(
            engine.set_agent_status(AgentStatus::Offline, None, false).await.map(drop)
        ));

        // Nothing changed while commands were failing.
        assert_eq!(engine.get_call(&(&call).into()).unwrap().state, CallState::Ringing);
        assert_eq!(publisher.count(EventType::Hangup), 0);

        engine.set_error_injection(false);
        assert!(engine.accept_call(None).await.is_ok());
    }
}
