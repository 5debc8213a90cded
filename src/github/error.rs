use chrono::Duration;
use reqwest::{StatusCode, Url};

use super::models;

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
#[derive(Debug)]
pub enum Error {
    RateLimited {
        /// The client error returned by GitHub
        client_error: models::ClientError,

        /// The duration to wait until trying again
        wait: Option<Duration>,
    },
    /// A non-success response other than rate limiting
    ApiError {
        status: StatusCode,
        client_error: Option<models::ClientError>,
    },
    UrlSlashError(String),
    UrlBaseError(Url),
    ReqwestError(reqwest::Error),
    InvalidTokenEnvVar(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::RateLimited{client_error, ..} => write!(f, "request was rate-limited: {}", client_error.message),
            Error::ApiError{status, client_error: Some(e)} => {
                write!(f, "request failed with {status}: {}", e.message)?;
                for detail in e.errors.iter().flatten() {
                    write!(f, "; {detail}")?;
                }
                Ok(())
            }
            Error::ApiError{status, client_error: None} => write!(f, "request failed with {status}"),
            Error::UrlSlashError(p) => write!(f, "error building URL: component {p:?} contains a slash"),
            Error::UrlBaseError(u) => write!(f, "error building URL: {u} cannot be a base"),
            Error::ReqwestError(e) => write!(f, "error making request: {e}"),
            Error::InvalidTokenEnvVar(v) => write!(f, "error loading token: ill-formed value of {v} environment variable"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::RateLimited{..} => None,
            Error::ApiError{..} => None,
            Error::UrlSlashError(_) => None,
            Error::UrlBaseError(_) => None,
            Error::ReqwestError(e) => Some(e),
            Error::InvalidTokenEnvVar(_) => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ReqwestError(e)
    }
}
