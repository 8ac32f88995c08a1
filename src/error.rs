use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use log::{debug, error};
use mongodb::{bson::ser::Error as BsonSerError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{
    db::candidate::CandidateId,
    mongodb::{is_unavailable_error, Id},
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("User not found")]
    VoterNotFound(Id),
    #[error("Candidate not found")]
    CandidateNotFound(CandidateId),
    #[error("User has already voted")]
    AlreadyVoted,
    /// The vote was recorded but the voter's status could not be updated, so the vote was
    /// removed again. Needs operator attention.
    #[error("Failed to update user voting status")]
    VoteRollback { voter: Id, vote: Id },
    #[error("Database unavailable: {0}")]
    PersistenceUnavailable(DbError),
    #[error(transparent)]
    Db(DbError),
    #[error(transparent)]
    BsonSer(#[from] BsonSerError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::VoterNotFound(_) | Self::CandidateNotFound(_) => Status::NotFound,
            Self::AlreadyVoted => Status::Conflict,
            Self::VoteRollback { .. } => Status::InternalServerError,
            Self::PersistenceUnavailable(_) => Status::ServiceUnavailable,
            Self::Db(_) | Self::BsonSer(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Status(status, _) => *status,
        }
    }

    /// The message shown to clients. Internal failures are not described in detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::PersistenceUnavailable(_) => {
                "The election database is unavailable, please try again later".to_string()
            }
            Self::Db(_) | Self::BsonSer(_) | Self::Argon2(_) => {
                "Internal server error".to_string()
            }
            Self::Jwt(_) => "Invalid or expired session".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<DbError> for Error {
    /// Database errors are split by whether the store could be reached at all.
    fn from(err: DbError) -> Self {
        if is_unavailable_error(&err) {
            Self::PersistenceUnavailable(err)
        } else {
            Self::Db(err)
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let id = req.local_cache(RequestId::next);
        let status = self.status();
        match self {
            // Rollbacks have already been raised on the alert channel.
            Self::VoteRollback { .. } => {}
            _ if status.class() == StatusClass::ServerError => error!("req{id} failed: {self:?}"),
            _ => debug!("req{id} rejected: {self}"),
        }
        (status, Json(ErrorBody::new(self.public_message()))).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_statuses() {
        assert_eq!(Error::VoterNotFound(Id::new()).status(), Status::NotFound);
        assert_eq!(
            Error::CandidateNotFound("9".to_string()).status(),
            Status::NotFound
        );
        assert_eq!(Error::AlreadyVoted.status(), Status::Conflict);
        let rollback = Error::VoteRollback {
            voter: Id::new(),
            vote: Id::new(),
        };
        assert_eq!(rollback.status(), Status::InternalServerError);
        assert_eq!(
            Error::bad_request("nope").status(),
            Status::BadRequest
        );
    }

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            Error::VoterNotFound(Id::new()).public_message(),
            "User not found"
        );
        assert_eq!(
            Error::CandidateNotFound("9".to_string()).public_message(),
            "Candidate not found"
        );
        assert_eq!(Error::AlreadyVoted.public_message(), "User has already voted");
        assert_eq!(
            Error::bad_request("Email already in use").public_message(),
            "Email already in use"
        );
    }
}
