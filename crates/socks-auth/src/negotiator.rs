use async_trait::async_trait;

use crate::{AuthError, AuthMethod, AuthStream, Credential, CredentialStore, UserPassRequest, UserPassResponse};

/// Client side of the authentication negotiation.
#[async_trait]
pub trait ClientAuthenticator: Send + Sync {
    /// Method codes advertised to the server, most preferred first.
    fn methods(&self) -> &[u8];

    /// Carries out the client half of the method announced by the server.
    ///
    /// On success the stream is ready for the SOCKS request.
    async fn on_request(&self, method: u8, stream: &mut dyn AuthStream) -> Result<(), AuthError>;
}

/// Server side of the authentication negotiation.
#[async_trait]
pub trait ServerAuthenticator: Send + Sync {
    /// Picks the method to announce among the ones offered by the client.
    fn select(&self, offered: &[u8]) -> u8;

    /// Carries out the server half of the selected method.
    ///
    /// On success the stream is ready for reading the SOCKS request.
    async fn on_response(&self, method: u8, stream: &mut dyn AuthStream) -> Result<(), AuthError>;
}

/// Runs the client continuation for `method` and hands the stream back.
pub async fn client_subnegotiate<A, S>(auth: &A, method: u8, mut stream: S) -> Result<S, AuthError>
where
    A: ClientAuthenticator + ?Sized,
    S: AuthStream,
{
    auth.on_request(method, &mut stream).await?;
    Ok(stream)
}

/// Runs the server continuation for `method` and hands the stream back.
pub async fn server_subnegotiate<A, S>(auth: &A, method: u8, mut stream: S) -> Result<S, AuthError>
where
    A: ServerAuthenticator + ?Sized,
    S: AuthStream,
{
    auth.on_response(method, &mut stream).await?;
    Ok(stream)
}

/// Supports "no authentication" and username/password, in both roles.
///
/// Holds no per-connection state: a single instance (or cheap clones of it) can serve every
/// connection concurrently.
#[derive(Clone, Debug, Default)]
pub struct Authenticator {
    credentials: CredentialStore,
}

impl Authenticator {
    const METHODS: [u8; 2] = [AuthMethod::NO_AUTH, AuthMethod::USER_PASS];

    pub fn new(credentials: impl Into<CredentialStore>) -> Self {
        Self {
            credentials: credentials.into(),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    async fn client_user_pass(&self, stream: &mut dyn AuthStream) -> Result<(), AuthError> {
        let req = match self.credentials.preferred_identity() {
            Some(Credential { username, password }) => UserPassRequest::new(username.as_str(), password.as_str()),
            None => UserPassRequest::new("", ""),
        };

        req.write(stream).await?;

        let rsp = UserPassResponse::read(stream).await?;

        if !rsp.is_success() {
            debug!(status = rsp.status, username = %req.username, "Server rejected credentials");
            return Err(AuthError::AuthFailure);
        }

        Ok(())
    }

    async fn server_user_pass(&self, stream: &mut dyn AuthStream) -> Result<(), AuthError> {
        let req = UserPassRequest::read(stream).await?;

        if self.credentials.is_empty() {
            trace!(covmark = "userpass_not_enforced");
        } else {
            let presented = Credential {
                username: req.username,
                password: req.password,
            };

            if !self.credentials.validate(&presented) {
                warn!(username = %presented.username, "Invalid credentials");
                trace!(covmark = "userpass_rejected");
                UserPassResponse::failure().write(stream).await?;
                return Err(AuthError::AuthFailure);
            }

            trace!(covmark = "userpass_accepted");
        }

        UserPassResponse::succeeded().write(stream).await?;

        Ok(())
    }
}

#[async_trait]
impl ClientAuthenticator for Authenticator {
    fn methods(&self) -> &[u8] {
        &Self::METHODS
    }

    async fn on_request(&self, method: u8, stream: &mut dyn AuthStream) -> Result<(), AuthError> {
        let method = AuthMethod::try_from(method)
            .inspect_err(|error| debug!(%error, "Server announced unusable method"))?;

        match method {
            AuthMethod::NoAuth => Ok(()),
            AuthMethod::UserPass => self.client_user_pass(stream).await,
        }
    }
}

#[async_trait]
impl ServerAuthenticator for Authenticator {
    fn select(&self, offered: &[u8]) -> u8 {
        let method = self.credentials.select(offered);
        debug!(?offered, %method, "Selected authentication method");
        method.code()
    }

    async fn on_response(&self, method: u8, stream: &mut dyn AuthStream) -> Result<(), AuthError> {
        let method = AuthMethod::try_from(method)
            .inspect_err(|error| debug!(%error, "No usable method to carry out"))?;

        match method {
            AuthMethod::NoAuth => Ok(()),
            AuthMethod::UserPass => self.server_user_pass(stream).await,
        }
    }
}
