//! Screen state for the wallet front end
//!
//! The controller owns everything that outlives a single user action: the token
//! registry, which tab is showing, the intent picked up by the last scan, the
//! hash of the last submitted transaction and the busy flag that keeps a second
//! submit from racing the first.

use std::sync::{Mutex, MutexGuard};

use ethers_core::types::H256;
use tracing::{debug, info};

use crate::dispatch::{dispatch, BusyFlag, DispatchReceipt, WalletSigner};
use crate::intent::PaymentIntent;
use crate::token::TokenRegistry;
use crate::validate::{validate, TransferRequest};
use crate::{DispatchError, PayError};

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Pay,
    Receive,
    History,
}

/// What happened to a submit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another submission was already running; nothing was sent
    Ignored,
    Submitted(DispatchReceipt),
}

#[derive(Debug, Default)]
struct ControllerState {
    tab: Tab,
    scanned: Option<PaymentIntent>,
    last_tx_hash: Option<H256>,
}

pub struct PaymentController {
    registry: TokenRegistry,
    busy: BusyFlag,
    state: Mutex<ControllerState>,
}

impl PaymentController {
    pub fn new(registry: TokenRegistry) -> Self {
        Self {
            registry,
            busy: BusyFlag::new(),
            state: Mutex::new(ControllerState::default()),
        }
    }

    // State is only touched between awaits, so a poisoned lock still holds
    // consistent data.
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn tab(&self) -> Tab {
        self.state().tab
    }

    pub fn select_tab(&self, tab: Tab) {
        debug!("Switching to {:?} tab", tab);
        self.state().tab = tab;
    }

    /// Hold a freshly scanned intent until the user confirms or discards it.
    /// Scanning always lands on the pay tab.
    pub fn hold_scanned(&self, intent: PaymentIntent) {
        let mut state = self.state();
        state.scanned = Some(intent);
        state.tab = Tab::Pay;
    }

    pub fn scanned(&self) -> Option<PaymentIntent> {
        self.state().scanned.clone()
    }

    pub fn discard_scanned(&self) -> Option<PaymentIntent> {
        self.state().scanned.take()
    }

    pub fn last_tx_hash(&self) -> Option<H256> {
        self.state().last_tx_hash
    }

    /// Dispatch `request` unless another submission is in flight
    pub async fn submit<S>(
        &self,
        request: &TransferRequest,
        signer: &S,
    ) -> Result<SubmitOutcome, DispatchError>
    where
        S: WalletSigner + ?Sized,
    {
        let Some(_guard) = self.busy.try_begin() else {
            info!("Submission already in progress, ignoring");
            return Ok(SubmitOutcome::Ignored);
        };
        self.dispatch_claimed(request, signer).await
    }

    /// Pay the held scanned intent.
    ///
    /// The intent is consumed by any attempt that reaches validation, so a
    /// failed payment has to be scanned again. An ignored submit keeps it.
    pub async fn pay_scanned<S>(&self, signer: &S) -> Result<SubmitOutcome, PayError>
    where
        S: WalletSigner + ?Sized,
    {
        // Claimed before the intent is taken
        let Some(_guard) = self.busy.try_begin() else {
            info!("Submission already in progress, ignoring");
            return Ok(SubmitOutcome::Ignored);
        };

        let intent = self.discard_scanned().ok_or(PayError::NothingScanned)?;
        let request = validate(&intent, &self.registry)?;
        Ok(self.dispatch_claimed(&request, signer).await?)
    }

    // Caller holds the busy guard
    async fn dispatch_claimed<S>(
        &self,
        request: &TransferRequest,
        signer: &S,
    ) -> Result<SubmitOutcome, DispatchError>
    where
        S: WalletSigner + ?Sized,
    {
        let receipt = dispatch(request, signer).await?;
        self.state().last_tx_hash = Some(receipt.tx_hash);
        Ok(SubmitOutcome::Submitted(receipt))
    }
}

impl Default for PaymentController {
    fn default() -> Self {
        Self::new(TokenRegistry::kaia_mainnet())
    }
}
