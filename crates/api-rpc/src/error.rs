//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use repogate_core::error::AppError;
use repogate_core::port::ProviderError;
use serde_json::json;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    /// GitHub rate limit (primary or secondary)
    pub const THROTTLED: i32 = 4003;
    /// Queued task exceeded its timeout
    pub const QUEUE_TIMEOUT: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const UPSTREAM_ERROR: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::Provider(ProviderError::NotFound(what)) => {
            ErrorObjectOwned::owned(code::NOT_FOUND, format!("Not found: {}", what), None::<()>)
        }
        AppError::Provider(e) if e.is_rate_limit() => {
            ErrorObjectOwned::owned(code::THROTTLED, e.to_string(), None::<()>)
        }
        AppError::Provider(e) => {
            ErrorObjectOwned::owned(code::UPSTREAM_ERROR, e.to_string(), None::<()>)
        }
        AppError::Timeout { queue, timeout_ms } => ErrorObjectOwned::owned(
            code::QUEUE_TIMEOUT,
            format!("Task in queue '{}' timed out after {}ms", queue, timeout_ms),
            Some(json!({ "queue": queue, "timeout_ms": timeout_ms })),
        ),
        AppError::Config(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
        AppError::Internal(msg) => ErrorObjectOwned::owned(code::INTERNAL_ERROR, msg, None::<()>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_4000() {
        let err = to_rpc_error(AppError::Validation("owner must not be empty".into()));
        assert_eq!(err.code(), code::VALIDATION_ERROR);
        assert_eq!(err.message(), "owner must not be empty");
    }

    #[test]
    fn test_rate_limits_map_to_throttled() {
        let primary = to_rpc_error(AppError::Provider(ProviderError::RateLimited {
            retry_after_secs: 30,
        }));
        let secondary = to_rpc_error(AppError::Provider(ProviderError::SecondaryRateLimited));
        assert_eq!(primary.code(), code::THROTTLED);
        assert_eq!(secondary.code(), code::THROTTLED);
    }

    #[test]
    fn test_timeout_carries_queue_data() {
        let err = to_rpc_error(AppError::Timeout {
            queue: "repository".into(),
            timeout_ms: 5000,
        });
        assert_eq!(err.code(), code::QUEUE_TIMEOUT);

        let data: serde_json::Value = serde_json::from_str(err.data().unwrap().get()).unwrap();
        assert_eq!(data["queue"], "repository");
        assert_eq!(data["timeout_ms"], 5000);
    }

    #[test]
    fn test_upstream_failures() {
        let err = to_rpc_error(AppError::Provider(ProviderError::Status {
            status: 502,
            message: "Bad Gateway".into(),
        }));
        assert_eq!(err.code(), code::UPSTREAM_ERROR);

        let missing = to_rpc_error(AppError::Provider(ProviderError::NotFound("octo/x".into())));
        assert_eq!(missing.code(), code::NOT_FOUND);
    }
}
