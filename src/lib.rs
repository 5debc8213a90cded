pub mod armor;
pub mod config;
pub mod error;
pub mod github;
pub mod identity;
pub mod object_id;
pub mod payload;
pub mod publish;
pub mod signing;

pub use error::{Error, Result};
pub use identity::{CommitIdentity, TzOffset};
pub use object_id::ObjectId;
pub use payload::CommitPayload;
pub use signing::{DetachedSignature, KeyId, Scheme, SigningKey, VerifyingKey};
