//! Mock renewal gateway.
//!
//! Stands in for the payment processor in tests and harness runs.
//! Supports:
//! - Approving every charge by default
//! - Declining charges for chosen tenants
//! - Failing every charge (processor outage)
//! - Call tracking

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::TenantId;
use crate::ports::{PaymentError, RenewalGateway, RenewalReceipt, RenewalRequest};

/// Mock renewal gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockRenewalGateway::new();
/// gateway.decline_for(tenant_id.clone());
///
/// let result = gateway.charge_renewal(&request).await;
/// assert!(result.is_err());
/// assert_eq!(gateway.charges().len(), 1);
/// ```
#[derive(Default)]
pub struct MockRenewalGateway {
    inner: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    declined: HashSet<TenantId>,
    outage: bool,
    charges: Vec<RenewalRequest>,
}

impl MockRenewalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose every charge fails as unavailable.
    pub fn unavailable() -> Self {
        let gateway = Self::new();
        gateway.state().outage = true;
        gateway
    }

    /// Decline every charge for `tenant_id`.
    pub fn decline_for(&self, tenant_id: TenantId) {
        self.state().declined.insert(tenant_id);
    }

    /// Every charge attempted so far, in order.
    pub fn charges(&self) -> Vec<RenewalRequest> {
        self.state().charges.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RenewalGateway for MockRenewalGateway {
    async fn charge_renewal(&self, request: &RenewalRequest) -> Result<RenewalReceipt, PaymentError> {
        let mut state = self.state();
        state.charges.push(request.clone());

        if state.outage {
            return Err(PaymentError::ProviderUnavailable(
                "mock processor offline".to_string(),
            ));
        }
        if state.declined.contains(&request.tenant_id) {
            return Err(PaymentError::Declined(format!(
                "card declined for {}",
                request.tenant_id
            )));
        }

        let reference = request
            .processor
            .subscription_ref
            .as_deref()
            .or(request.processor.customer_ref.as_deref())
            .ok_or_else(|| PaymentError::UnknownReference(request.tenant_id.to_string()))?;

        Ok(RenewalReceipt {
            transaction_ref: format!("txn_{}_{}", reference, state.charges.len()),
        })
    }
}
