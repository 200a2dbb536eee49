//! Mapping of transport-native failures into the crate taxonomy.

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError, TransportError},
};

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted while calling `path` into a crate error.
	fn map_transport_error(&self, path: &str, error: E) -> Error;
}

/// Mapper that treats every transport failure as a network error.
#[derive(Clone, Debug, Default)]
pub struct GenericTransportErrorMapper;
impl<E> TransportErrorMapper<E> for GenericTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, path: &str, error: E) -> Error {
		TransportError::network(path, error).into()
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, path: &str, error: ReqwestError) -> Error {
		if error.is_timeout() {
			return TransientError::Timeout { path: path.to_owned() }.into();
		}
		if error.is_builder() {
			return ConfigError::from(error).into();
		}

		TransportError::network(path, error).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generic_mapper_reports_network_failures() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
		let err = GenericTransportErrorMapper.map_transport_error("/resources/applicants/a/one", io);

		assert!(matches!(err, Error::Transport(TransportError::Network { ref path, .. }) if path == "/resources/applicants/a/one"));
		assert!(err.is_retryable());
	}
}
