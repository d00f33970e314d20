// self
use crate::obs::{OperationOutcome, ProviderOperation};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(
	provider: &str,
	operation: ProviderOperation,
	outcome: OperationOutcome,
) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_proxy_provider_operation_total",
			"provider" => provider.to_owned(),
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, operation, outcome);
	}
}
