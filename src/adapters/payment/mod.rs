//! Payment adapters - Renewal gateway implementations.
//!
//! - `MockRenewalGateway` - Configurable stand-in for the payment processor

mod mock_renewal_gateway;

pub use mock_renewal_gateway::MockRenewalGateway;
