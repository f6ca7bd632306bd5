//! Response classification.
//!
//! # Design
//! `Classifier` is the per-request terminal-state token. Its phase moves
//! `Pending -> TransportFailed` or `Pending -> ResponseReceived -> Success |
//! NonSuccessResponse` and never leaves a terminal phase. Every transition
//! is a check-and-set on `&mut self`; a transition attempted from the wrong
//! phase returns `false`/`None` and changes nothing, which is how late
//! transport events get discarded.

use serde::Serialize;

/// Two-way split used for exit routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NonSuccess,
}

/// `[200, 300)` is success; every other code, including ones outside
/// `[100, 600)`, is a non-success response.
pub fn classify_status(status: u16) -> StatusClass {
    if (200..300).contains(&status) {
        StatusClass::Success
    } else {
        StatusClass::NonSuccess
    }
}

/// Fine-grained reading of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusCategory {
    Success,
    Redirect,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    OtherClientError,
    ServerError,
    /// Below 200 or above 599.
    Other,
}

impl StatusCategory {
    pub fn exit_name(&self) -> &'static str {
        match self {
            StatusCategory::Success => "success",
            StatusCategory::Redirect => "redirect",
            StatusCategory::BadRequest => "badRequest",
            StatusCategory::Unauthorized => "unauthorized",
            StatusCategory::Forbidden => "forbidden",
            StatusCategory::NotFound => "notFound",
            StatusCategory::OtherClientError => "otherClientError",
            StatusCategory::ServerError => "serverError",
            StatusCategory::Other => "other",
        }
    }
}

pub fn negotiate_status(status: u16) -> StatusCategory {
    match status {
        200..=299 => StatusCategory::Success,
        300..=399 => StatusCategory::Redirect,
        400 => StatusCategory::BadRequest,
        401 => StatusCategory::Unauthorized,
        403 => StatusCategory::Forbidden,
        404 => StatusCategory::NotFound,
        402..=499 => StatusCategory::OtherClientError,
        500..=599 => StatusCategory::ServerError,
        _ => StatusCategory::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    ResponseReceived(u16),
    TransportFailed,
    Success,
    NonSuccessResponse,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::TransportFailed | Phase::Success | Phase::NonSuccessResponse
        )
    }
}

#[derive(Debug)]
pub struct Classifier {
    phase: Phase,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            phase: Phase::Pending,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// `Pending -> TransportFailed`.
    pub fn fail(&mut self) -> bool {
        if self.phase != Phase::Pending {
            return false;
        }
        self.phase = Phase::TransportFailed;
        true
    }

    /// `Pending -> ResponseReceived`.
    pub fn receive(&mut self, status: u16) -> bool {
        if self.phase != Phase::Pending {
            return false;
        }
        self.phase = Phase::ResponseReceived(status);
        true
    }

    /// `ResponseReceived -> Success | NonSuccessResponse`.
    pub fn resolve(&mut self) -> Option<StatusClass> {
        let Phase::ResponseReceived(status) = self.phase else {
            return None;
        };
        let class = classify_status(status);
        self.phase = match class {
            StatusClass::Success => Phase::Success,
            StatusClass::NonSuccess => Phase::NonSuccessResponse,
        };
        tracing::debug!(status, ?class, "response classified");
        Some(class)
    }
}
