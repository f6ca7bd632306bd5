//! The single result of one request.

use crate::error::TransportError;
use crate::http::ServerResponse;

/// Exit names, kept verbatim for callers that route on them.
pub mod exits {
    pub const SUCCESS: &str = "success";
    pub const NON_200_RESPONSE: &str = "non200Response";
    pub const REQUEST_FAILED: &str = "requestFailed";
}

/// Exactly one of these is produced per request.
///
/// `S` is the success payload (a buffered response, decoded JSON, or a
/// stream handle). `N` is what a non-2xx response carries: the full
/// response in buffered mode, only the head in streaming mode.
#[derive(Debug)]
pub enum Outcome<S, N = ServerResponse> {
    Success(S),
    NonSuccessResponse(N),
    TransportFailure(TransportError),
}

impl<S, N> Outcome<S, N> {
    pub fn exit_name(&self) -> &'static str {
        match self {
            Outcome::Success(_) => exits::SUCCESS,
            Outcome::NonSuccessResponse(_) => exits::NON_200_RESPONSE,
            Outcome::TransportFailure(_) => exits::REQUEST_FAILED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn map_success<U>(self, f: impl FnOnce(S) -> U) -> Outcome<U, N> {
        match self {
            Outcome::Success(s) => Outcome::Success(f(s)),
            Outcome::NonSuccessResponse(n) => Outcome::NonSuccessResponse(n),
            Outcome::TransportFailure(e) => Outcome::TransportFailure(e),
        }
    }

    pub fn success(self) -> Option<S> {
        match self {
            Outcome::Success(s) => Some(s),
            _ => None,
        }
    }

    pub fn non_success(self) -> Option<N> {
        match self {
            Outcome::NonSuccessResponse(n) => Some(n),
            _ => None,
        }
    }

    pub fn transport_failure(self) -> Option<TransportError> {
        match self {
            Outcome::TransportFailure(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorKind;

    #[test]
    fn exit_names_are_verbatim() {
        let ok: Outcome<u8, ()> = Outcome::Success(1);
        let non: Outcome<u8, ()> = Outcome::NonSuccessResponse(());
        let failed: Outcome<u8, ()> =
            Outcome::TransportFailure(TransportError::new(TransportErrorKind::Connect, "refused"));
        assert_eq!(ok.exit_name(), "success");
        assert_eq!(non.exit_name(), "non200Response");
        assert_eq!(failed.exit_name(), "requestFailed");
    }

    #[test]
    fn map_success_leaves_other_exits_alone() {
        let non: Outcome<u8, &str> = Outcome::NonSuccessResponse("404");
        assert_eq!(non.map_success(|n| n * 2).non_success(), Some("404"));
        let ok: Outcome<u8, &str> = Outcome::Success(21);
        assert_eq!(ok.map_success(|n| n * 2).success(), Some(42));
    }
}
