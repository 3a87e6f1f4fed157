//! Production-shaped remote signer.
//!
//! Forwards the connect/sign/disconnect lifecycle to an external signing
//! service over a [`SignerTransport`]: a hardware security module daemon,
//! a networked signing service, or anything else that keeps the private key
//! on its side. Only signing bytes go out and signature bytes come back;
//! the key never materializes in this process.

use super::traits::{SignerBackend, SignerError, SignerResult};
use crate::tx::{PublicIdentity, SignedTransaction, Transaction};
use async_trait::async_trait;
use thiserror::Error;

/// Transport-level errors, mapped onto [`SignerError`] by [`RemoteSigner`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Service unreachable.
    #[error("signing service unreachable: {0}")]
    Unreachable(String),

    /// Session authentication failed.
    #[error("session authentication failed: {0}")]
    AuthFailed(String),

    /// Service refused the request (policy).
    #[error("request refused: {0}")]
    Refused(String),

    /// Service did not answer in time.
    #[error("request timed out: {0}")]
    TimedOut(String),
}

/// Raw session interface a signing service exposes.
///
/// Implementations wrap the actual wire protocol (PKCS#11 daemon, vendored
/// HSM client, remote signer RPC). The contract mirrors the backend
/// lifecycle one level down.
#[async_trait]
pub trait SignerTransport: Send + Sync {
    /// Open a session; returns the identity signatures will verify under.
    async fn open_session(&self) -> Result<PublicIdentity, TransportError>;

    /// Sign the given bytes inside the open session.
    async fn sign_bytes(&self, signing_bytes: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Close the session. Best-effort; must tolerate an already-closed
    /// session.
    async fn close_session(&self);
}

/// Signer backend that delegates to an external signing service.
pub struct RemoteSigner<T: SignerTransport> {
    transport: T,
    session: Option<PublicIdentity>,
}

impl<T: SignerTransport> RemoteSigner<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            session: None,
        }
    }
}

fn connect_error(err: TransportError) -> SignerError {
    SignerError::ConnectFailed(err.to_string())
}

fn sign_error(err: TransportError) -> SignerError {
    match err {
        TransportError::TimedOut(reason) => SignerError::Timeout(reason),
        other => SignerError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl<T: SignerTransport> SignerBackend for RemoteSigner<T> {
    async fn connect(&mut self) -> SignerResult<PublicIdentity> {
        if self.session.is_some() {
            return Err(SignerError::AlreadyConnected);
        }
        let identity = self.transport.open_session().await.map_err(connect_error)?;
        tracing::debug!(%identity, "remote signer session opened");
        self.session = Some(identity.clone());
        Ok(identity)
    }

    async fn sign(&mut self, tx: &Transaction) -> SignerResult<SignedTransaction> {
        let identity = self.session.as_ref().ok_or(SignerError::NotConnected)?;
        let bytes = tx
            .signing_bytes()
            .map_err(|e| SignerError::Encoding(e.to_string()))?;
        let signature = self.transport.sign_bytes(&bytes).await.map_err(sign_error)?;
        Ok(SignedTransaction {
            transaction: tx.clone(),
            signer: identity.clone(),
            signature,
        })
    }

    async fn disconnect(&mut self) {
        if self.session.take().is_some() {
            self.transport.close_session().await;
            tracing::debug!("remote signer session closed");
        }
    }
}
