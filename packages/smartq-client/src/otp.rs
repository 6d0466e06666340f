//! OTP verification flow for account registration.
//!
//! The flow owns a six-slot code buffer, a resend countdown and a phase:
//!
//! ```text
//! Editing -> Verifying -> Success
//!                      -> Failed(message)   (retryable, behaves like Editing)
//! ```
//!
//! Verification is two dependent calls: verify the code, then register the
//! customer. Methods take `&mut self`, so at most one verify-or-resend is ever
//! outstanding.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::contact::Contact;
use crate::error::{ClientError, Result};
use crate::session::SessionContext;
use crate::traits::BaseAuthApi;
use crate::types::{Acknowledgement, RegisterCustomer, UserData};

/// Digits in a verification code.
pub const OTP_LENGTH: usize = 6;

/// Seconds before a new code can be requested.
pub const RESEND_SECONDS: u32 = 60;

/// Shown when the backend rejects a code without saying why.
const DEFAULT_REJECTION: &str = "Invalid verification code";

/// Six single-digit slots plus the focused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpCode {
    slots: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn slot(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == OTP_LENGTH
    }

    /// The six digits, once every slot is filled.
    pub fn code(&self) -> Option<String> {
        self.slots.iter().copied().collect()
    }

    /// Text typed into a slot. Non-digits are stripped; a digit fills the slot
    /// and moves focus to the next one, input without a digit empties the slot
    /// and keeps focus.
    pub fn input(&mut self, index: usize, text: &str) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };

        let digit = text.chars().find(char::is_ascii_digit);
        *slot = digit;
        self.focus = index;
        if digit.is_some() && index + 1 < OTP_LENGTH {
            self.focus = index + 1;
        }
    }

    /// Backspace in a slot. An empty slot hands focus (and its deletion) to
    /// the previous slot; a filled slot is just cleared.
    pub fn backspace(&mut self, index: usize) {
        if index >= OTP_LENGTH {
            return;
        }

        if self.slots[index].is_some() {
            self.slots[index] = None;
            self.focus = index;
        } else if index > 0 {
            self.slots[index - 1] = None;
            self.focus = index - 1;
        }
    }

    /// Fill slots from the start with the digits of a whole code.
    pub fn fill(&mut self, code: &str) {
        self.clear();
        for (index, digit) in code.chars().filter(char::is_ascii_digit).take(OTP_LENGTH).enumerate() {
            self.input(index, &digit.to_string());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Resend gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Cooling(u32),
    Ready,
}

/// Countdown gating re-issuance of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendTimer {
    remaining: u32,
}

impl Default for ResendTimer {
    fn default() -> Self {
        Self {
            remaining: RESEND_SECONDS,
        }
    }
}

impl ResendTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// One second elapsed.
    pub fn tick(&mut self) {
        self.elapse(1);
    }

    /// Several seconds elapsed at once.
    pub fn elapse(&mut self, seconds: u32) {
        self.remaining = self.remaining.saturating_sub(seconds);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }

    pub fn state(&self) -> TimerState {
        if self.remaining == 0 {
            TimerState::Ready
        } else {
            TimerState::Cooling(self.remaining)
        }
    }

    pub fn reset(&mut self) {
        self.remaining = RESEND_SECONDS;
    }
}

/// Periodic tick source for a [`ResendTimer`].
///
/// The task publishes how many whole periods have passed since it was
/// spawned; [`CountdownHandle::tick`] returns the periods since the previous
/// call. A consumer busy for several periods gets them all on its next tick,
/// so the countdown never runs slow.
///
/// The task stops when the handle is cancelled or dropped, so a dismissed
/// screen never receives a late tick.
pub struct CountdownHandle {
    elapsed: watch::Receiver<u32>,
    seen: u32,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn spawn(period: Duration) -> Self {
        let (tx, elapsed) = watch::channel(0u32);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let started = Instant::now();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(started + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let periods = started.elapsed().as_nanos() / period.as_nanos().max(1);
                        let periods = u32::try_from(periods).unwrap_or(u32::MAX);
                        if tx.send(periods).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Resend countdown stopped");
        });

        Self {
            elapsed,
            seen: 0,
            cancel,
            task,
        }
    }

    /// Wait for the next tick and return the periods elapsed since the last
    /// one (at least 1). `None` once cancelled.
    pub async fn tick(&mut self) -> Option<u32> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                changed = self.elapsed.changed() => changed.ok()?,
            }

            let total = *self.elapsed.borrow_and_update();
            if total > self.seen {
                let delta = total - self.seen;
                self.seen = total;
                return Some(delta);
            }
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Fields collected by the registration form, carried into the OTP step.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub contact: Contact,
    pub password: SecretString,
}

impl Registration {
    pub fn new(username: impl Into<String>, contact: Contact, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            contact,
            password: SecretString::from(password.into()),
        }
    }

    fn email(&self) -> String {
        match &self.contact {
            Contact::Email(email) => email.clone(),
            Contact::Phone(_) => String::new(),
        }
    }

    fn phone_number(&self) -> String {
        match &self.contact {
            Contact::Phone(phone) => phone.clone(),
            Contact::Email(_) => String::new(),
        }
    }

    fn customer(&self) -> RegisterCustomer {
        RegisterCustomer {
            name: self.username.clone(),
            email: self.email(),
            phone_number: self.phone_number(),
            password: self.password.expose_secret().to_string(),
        }
    }

    fn profile(&self, ack: &Acknowledgement) -> UserData {
        let id = ack
            .customer
            .as_ref()
            .map(|c| UserData::from_user_record(c).id)
            .unwrap_or_default();

        UserData {
            username: self.username.clone(),
            email: self.email(),
            phone_number: self.phone_number(),
            password: self.password.expose_secret().to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpPhase {
    Editing,
    Verifying,
    Success,
    /// Last attempt failed; input and verify are still accepted.
    Failed(String),
}

impl OtpPhase {
    pub fn is_editable(&self) -> bool {
        matches!(self, OtpPhase::Editing | OtpPhase::Failed(_))
    }
}

/// Where the front-end goes after verification succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Enter the authenticated area, discarding history back to registration.
    ResetToHome,
}

/// One verification attempt for a registration.
pub struct OtpFlow {
    session: SessionContext,
    registration: Registration,
    code: OtpCode,
    timer: ResendTimer,
    phase: OtpPhase,
}

impl OtpFlow {
    /// Flow for a code that has already been sent.
    pub fn new(session: SessionContext, registration: Registration) -> Self {
        Self {
            session,
            registration,
            code: OtpCode::new(),
            timer: ResendTimer::new(),
            phase: OtpPhase::Editing,
        }
    }

    /// Send the first code and open the flow.
    pub async fn start<A: BaseAuthApi + ?Sized>(
        api: &A,
        session: SessionContext,
        registration: Registration,
    ) -> Result<Self> {
        let ack = api.send_code(&registration.contact).await?;
        if !ack.success {
            return Err(ClientError::Rejected(ack.message));
        }
        info!(contact = %registration.contact.masked(), "Verification code sent");
        Ok(Self::new(session, registration))
    }

    pub fn contact(&self) -> &Contact {
        &self.registration.contact
    }

    pub fn code(&self) -> &OtpCode {
        &self.code
    }

    pub fn timer(&self) -> &ResendTimer {
        &self.timer
    }

    pub fn phase(&self) -> &OtpPhase {
        &self.phase
    }

    pub fn can_resend(&self) -> bool {
        self.timer.can_resend()
    }

    pub fn input(&mut self, index: usize, text: &str) {
        if !self.phase.is_editable() {
            return;
        }
        self.code.input(index, text);
    }

    pub fn backspace(&mut self, index: usize) {
        if !self.phase.is_editable() {
            return;
        }
        self.code.backspace(index);
    }

    /// Replace the buffer with a whole typed or pasted code.
    pub fn enter_code(&mut self, code: &str) {
        if !self.phase.is_editable() {
            return;
        }
        self.code.fill(code);
    }

    /// One second of resend countdown.
    pub fn tick(&mut self) {
        self.timer.tick();
    }

    /// Seconds of resend countdown reported by a [`CountdownHandle`].
    pub fn elapse(&mut self, seconds: u32) {
        self.timer.elapse(seconds);
    }

    /// Verify the code, then register the customer.
    ///
    /// Fewer than six digits fails locally with `IncompleteCode`. Any remote
    /// failure leaves the phase at `Failed` with the entered digits intact.
    pub async fn verify<A: BaseAuthApi + ?Sized>(&mut self, api: &A) -> Result<Navigation> {
        if self.phase == OtpPhase::Success {
            return Ok(Navigation::ResetToHome);
        }

        let code = self.code.code().ok_or(ClientError::IncompleteCode)?;

        self.phase = OtpPhase::Verifying;
        match self.verify_and_register(api, &code).await {
            Ok(profile) => {
                info!(
                    contact = %self.registration.contact.masked(),
                    "Contact verified, account created"
                );
                self.session.set_user_data(profile);
                self.phase = OtpPhase::Success;
                Ok(Navigation::ResetToHome)
            }
            Err(e) => {
                warn!(error = %e, "Verification failed");
                self.phase = OtpPhase::Failed(e.user_message());
                Err(e)
            }
        }
    }

    async fn verify_and_register<A: BaseAuthApi + ?Sized>(
        &self,
        api: &A,
        code: &str,
    ) -> Result<UserData> {
        let verification = api.verify_code(&self.registration.contact, code).await?;
        if !verification.verified {
            let message = if verification.message.is_empty() {
                DEFAULT_REJECTION.to_string()
            } else {
                verification.message
            };
            return Err(ClientError::OtpRejected(message));
        }

        let ack = api.register(&self.registration.customer()).await?;
        if !ack.success {
            return Err(ClientError::Rejected(ack.message));
        }

        Ok(self.registration.profile(&ack))
    }

    /// Request a fresh code once the countdown has run out.
    ///
    /// Resets the countdown and clears the slots before calling the backend.
    pub async fn resend<A: BaseAuthApi + ?Sized>(&mut self, api: &A) -> Result<Acknowledgement> {
        if !self.timer.can_resend() {
            return Err(ClientError::ResendNotReady(self.timer.remaining()));
        }
        if self.phase == OtpPhase::Success {
            return Err(ClientError::Rejected("Already verified".to_string()));
        }

        self.timer.reset();
        self.code.clear();

        match api.send_code(&self.registration.contact).await {
            Ok(ack) => {
                info!(contact = %self.registration.contact.masked(), "Verification code resent");
                self.phase = OtpPhase::Editing;
                Ok(ack)
            }
            Err(e) => {
                self.phase = OtpPhase::Failed(e.user_message());
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for OtpFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpFlow")
            .field("contact", &self.registration.contact.masked())
            .field("filled", &self.code.filled())
            .field("timer", &self.timer.state())
            .field("phase", &self.phase)
            .finish()
    }
}
