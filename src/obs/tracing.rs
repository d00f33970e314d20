// self
use crate::{_prelude::*, obs::ProviderOperation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by provider operations.
#[derive(Clone, Debug)]
pub struct ProviderSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ProviderSpan {
	/// Creates a new span tagged with the provider name + operation.
	pub fn new(provider: &str, operation: ProviderOperation) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_proxy.provider",
				provider,
				operation = operation.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (provider, operation);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a diagnostic for a failed operation (when tracing is enabled).
pub fn trace_failure(operation: ProviderOperation, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = operation.as_str(), error = %error, "Provider operation failed.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, error);
	}
}
