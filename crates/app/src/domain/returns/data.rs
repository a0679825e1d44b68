//! Return Request Data

use crate::domain::orders::records::LineItemUuid;

/// Reason recorded when the customer gives none.
pub const DEFAULT_RETURN_REASON: &str = "Customer has chosen to return item";

/// One line of a return request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnLine {
    pub line_item: LineItemUuid,
    pub quantity: u32,
    pub reason: Option<String>,
}

impl ReturnLine {
    #[must_use]
    pub fn new(line_item: LineItemUuid, quantity: u32) -> Self {
        Self {
            line_item,
            quantity,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The stated reason, or [`DEFAULT_RETURN_REASON`] when blank.
    #[must_use]
    pub fn reason_or_default(&self) -> &str {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(DEFAULT_RETURN_REASON)
    }
}
