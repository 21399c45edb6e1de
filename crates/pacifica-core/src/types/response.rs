//! Response envelope and venue error codes.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Every venue response: `{success, data, error, code}`, with pagination
/// fields on list endpoints that page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl<T> ApiResponse<T> {
    /// Fail with [`Error::Api`] if the venue reported `success: false`.
    pub fn ensure_success(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(Error::Api {
            message: self
                .error
                .clone()
                .unwrap_or_else(|| "request was not successful".to_string()),
            code: self.code,
        })
    }

    /// Unwrap the data of a successful response.
    pub fn into_data(self) -> Result<T> {
        self.ensure_success()?;
        self.data.ok_or_else(|| Error::Api {
            message: "successful response carried no data".to_string(),
            code: None,
        })
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Unwrap a successful list response with its pagination fields.
    pub fn into_page(self) -> Result<Page<T>> {
        self.ensure_success()?;
        Ok(Page {
            data: self.data.unwrap_or_default(),
            next_cursor: self.next_cursor,
            has_more: self.has_more.unwrap_or(false),
        })
    }
}

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Venue error codes carried in the `code` field of a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    Unknown,
    AccountNotFound,
    BookNotFound,
    InvalidTickLevel,
    InsufficientBalance,
    OrderNotFound,
    OverWithdrawal,
    InvalidLeverage,
    CannotUpdateMargin,
    PositionNotFound,
    PositionTpslLimitExceeded,
}

impl ApiErrorCode {
    /// Codes outside the known range map to `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ApiErrorCode::AccountNotFound,
            2 => ApiErrorCode::BookNotFound,
            3 => ApiErrorCode::InvalidTickLevel,
            4 => ApiErrorCode::InsufficientBalance,
            5 => ApiErrorCode::OrderNotFound,
            6 => ApiErrorCode::OverWithdrawal,
            7 => ApiErrorCode::InvalidLeverage,
            8 => ApiErrorCode::CannotUpdateMargin,
            9 => ApiErrorCode::PositionNotFound,
            10 => ApiErrorCode::PositionTpslLimitExceeded,
            _ => ApiErrorCode::Unknown,
        }
    }
}
