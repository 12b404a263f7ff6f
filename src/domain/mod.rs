//! Domain layer
//!
//! Pure types shared by the crypto engine, the lifecycle manager and the API.
//! Nothing here touches the store or the network.
//!
//! - `marker`: encryption-status marker and its codec
//! - `secret`: secret identifiers and operation results
//! - `sensitive`: redacting wrapper for plaintexts and passwords

pub mod marker;
pub mod secret;
pub mod sensitive;

pub use marker::{EncryptionMarker, MarkerStatus, MetadataCodec};
pub use secret::{CreatedSecret, SecretId, SecretStatus};
pub use sensitive::SecretString;
