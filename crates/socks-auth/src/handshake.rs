use std::io;

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

use crate::{AuthError, AuthMethod, AuthStream, ClientAuthenticator, ServerAuthenticator};

const SOCKS_VERSION: u8 = 0x05;

/// Greets the server, then carries out the method it picked.
///
/// Returns the stream ready for the SOCKS request.
pub async fn client_handshake<A, S>(auth: &A, mut stream: S) -> Result<S, AuthError>
where
    A: ClientAuthenticator + ?Sized,
    S: AuthStream,
{
    let offered = auth.methods();

    NegotiationRequest {
        methods: offered.to_vec(),
    }
    .write(&mut stream)
    .await?;

    let NegotiationResponse { method } = NegotiationResponse::read(&mut stream).await?;

    if method != AuthMethod::NO_ACCEPTABLE && !offered.contains(&method) {
        // Some servers ignore the offered list instead of answering NO_ACCEPTABLE.
        debug!(method, "Server picked a method that was not offered");
        return Err(AuthError::BadMethod(method));
    }

    auth.on_request(method, &mut stream).await?;

    Ok(stream)
}

/// Reads the client greeting, announces the selected method and carries it out.
///
/// Returns the stream ready for reading the SOCKS request.
pub async fn server_handshake<A, S>(auth: &A, mut stream: S) -> Result<S, AuthError>
where
    A: ServerAuthenticator + ?Sized,
    S: AuthStream,
{
    let NegotiationRequest { methods } = NegotiationRequest::read(&mut stream).await?;

    // Not checked against `methods`: a client unable to follow the selection fails during
    // the subnegotiation.
    let method = auth.select(&methods);

    NegotiationResponse { method }.write(&mut stream).await?;

    auth.on_response(method, &mut stream).await?;

    Ok(stream)
}

// Negotiation request (client greeting)
// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+
struct NegotiationRequest {
    methods: Vec<u8>,
}

impl NegotiationRequest {
    async fn write(&self, stream: &mut dyn AuthStream) -> io::Result<()> {
        let nmethods = u8::try_from(self.methods.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many methods"))?;
        let mut packet = vec![SOCKS_VERSION, nmethods];
        packet.extend_from_slice(&self.methods);
        stream.write_all(&packet).await?;
        Ok(())
    }

    async fn read(stream: &mut dyn AuthStream) -> io::Result<Self> {
        let mut fixed_part = [0; 2];
        stream.read_exact(&mut fixed_part).await?;
        let [version, nmethods] = fixed_part;

        if version != SOCKS_VERSION {
            NegotiationResponse {
                method: AuthMethod::NO_ACCEPTABLE,
            }
            .write(stream)
            .await?;

            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid request version"));
        }

        let mut methods = vec![0; usize::from(nmethods)];
        stream.read_exact(&mut methods).await?;

        Ok(Self { methods })
    }
}

// Negotiation response (server choice)
// +----+--------+
// |VER | METHOD |
// +----+--------+
// | 1  |   1    |
// +----+--------+
struct NegotiationResponse {
    method: u8,
}

impl NegotiationResponse {
    async fn write(&self, stream: &mut dyn AuthStream) -> io::Result<()> {
        stream.write_all(&[SOCKS_VERSION, self.method]).await?;
        Ok(())
    }

    async fn read(stream: &mut dyn AuthStream) -> io::Result<Self> {
        let mut buffer = [0; 2];
        stream.read_exact(&mut buffer).await?;
        let [version, method] = buffer;

        if version != SOCKS_VERSION {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid response version"));
        }

        Ok(Self { method })
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::{Authenticator, Credential};

    #[tokio::test]
    async fn client_no_auth() {
        let stream = Builder::new().write(&[5, 2, 0x00, 0x02]).read(&[5, 0x00]).build();
        client_handshake(&Authenticator::default(), stream).await.unwrap();
    }

    #[tokio::test]
    async fn client_user_pass() {
        let auth = Authenticator::new(vec![Credential::new("u", "p")]);
        let stream = Builder::new()
            .write(&[5, 2, 0x00, 0x02])
            .read(&[5, 0x02])
            .write(&[1, 1, b'u', 1, b'p'])
            .read(&[1, 0])
            .build();
        client_handshake(&auth, stream).await.unwrap();
    }

    #[tokio::test]
    async fn client_no_acceptable() {
        let stream = Builder::new().write(&[5, 2, 0x00, 0x02]).read(&[5, 0xFF]).build();
        let err = client_handshake(&Authenticator::default(), stream).await.unwrap_err();
        assert!(matches!(err, AuthError::BadMethod(0xFF)));
    }

    #[tokio::test]
    async fn client_method_not_offered() {
        // GSSAPI
        let stream = Builder::new().write(&[5, 2, 0x00, 0x02]).read(&[5, 0x01]).build();
        let err = client_handshake(&Authenticator::default(), stream).await.unwrap_err();
        assert!(matches!(err, AuthError::BadMethod(0x01)));
    }

    #[tokio::test]
    async fn client_bad_response_version() {
        let stream = Builder::new().write(&[5, 2, 0x00, 0x02]).read(&[4, 0x00]).build();
        let err = client_handshake(&Authenticator::default(), stream).await.unwrap_err();
        assert!(matches!(err, AuthError::Io(e) if e.kind() == io::ErrorKind::InvalidData));
    }

    #[tokio::test]
    async fn server_no_auth() {
        let stream = Builder::new().read(&[5, 1, 0x00]).write(&[5, 0x00]).build();
        server_handshake(&Authenticator::default(), stream).await.unwrap();
    }

    #[tokio::test]
    async fn server_mandates_user_pass_even_if_not_offered() {
        let auth = Authenticator::new(vec![Credential::new("u", "p")]);
        let stream = Builder::new()
            .read(&[5, 1, 0x00])
            .write(&[5, 0x02])
            .read(&[1, 1, b'u', 1, b'p'])
            .write(&[1, 0])
            .build();
        server_handshake(&auth, stream).await.unwrap();
    }

    #[tokio::test]
    async fn server_bad_greeting_version() {
        let stream = Builder::new().read(&[4, 1]).write(&[5, 0xFF]).build();
        let err = server_handshake(&Authenticator::default(), stream).await.unwrap_err();
        assert!(matches!(err, AuthError::Io(e) if e.kind() == io::ErrorKind::InvalidData));
    }
}
