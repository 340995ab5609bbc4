use std::io::{self, Write as _};

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

use crate::AuthStream;

/// Version of the username/password subnegotiation.
pub const USER_PASS_VERSION: u8 = 0x01;

/// Status byte of a [`UserPassResponse`].
pub struct UserPassStatus;

impl UserPassStatus {
    pub const SUCCEEDED: u8 = 0x00;
    /// Any value other than `SUCCEEDED` is a failure; this is the one we send.
    pub const FAILURE: u8 = 0x01;
}

// https://datatracker.ietf.org/doc/html/rfc1929
// +----+------+----------+------+----------+
// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
// +----+------+----------+------+----------+
// | 1  |  1   | 0 to 255 |  1   | 0 to 255 |
// +----+------+----------+------+----------+
//
// The RFC requires at least one byte per field. We also accept empty ones: a client without
// configured identity presents empty strings.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassRequest {
    pub version: u8,
    pub username: String,
    pub password: String,
}

impl UserPassRequest {
    const STR_MAX_LEN: usize = u8::MAX as usize;
    const FIXED_PART_LEN: usize = 3;
    const MAX_LEN: usize = Self::FIXED_PART_LEN + Self::STR_MAX_LEN * 2;

    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            version: USER_PASS_VERSION,
            username: username.into(),
            password: password.into(),
        }
    }

    pub async fn write(&self, stream: &mut dyn AuthStream) -> io::Result<()> {
        let username_len = u8::try_from(self.username.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "username too long"))?;

        let password_len = u8::try_from(self.password.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "password too long"))?;

        let packet_size = Self::FIXED_PART_LEN + self.username.len() + self.password.len();

        let mut packet = [0; Self::MAX_LEN];
        let mut buf: &mut [u8] = &mut packet;
        buf.write_all(&[self.version, username_len])?;
        buf.write_all(self.username.as_bytes())?;
        buf.write_all(&[password_len])?;
        buf.write_all(self.password.as_bytes())?;

        stream.write_all(&packet[..packet_size]).await?;

        Ok(())
    }

    pub async fn read(stream: &mut dyn AuthStream) -> io::Result<Self> {
        let version = stream.read_u8().await?;

        if version != USER_PASS_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid username/password version",
            ));
        }

        let username = read_field(stream, "username").await?;
        let password = read_field(stream, "password").await?;

        Ok(Self {
            version,
            username,
            password,
        })
    }
}

impl core::fmt::Debug for UserPassRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserPassRequest")
            .field("version", &self.version)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

async fn read_field(stream: &mut dyn AuthStream, name: &'static str) -> io::Result<String> {
    let len = usize::from(stream.read_u8().await?);
    let mut field = vec![0; len];
    stream.read_exact(&mut field).await?;
    String::from_utf8(field).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, format!("bad utf8 for {name}")))
}

/// https://datatracker.ietf.org/doc/html/rfc1929
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserPassResponse {
    pub version: u8,
    pub status: u8,
}

impl UserPassResponse {
    pub fn new(status: u8) -> Self {
        Self {
            version: USER_PASS_VERSION,
            status,
        }
    }

    pub fn succeeded() -> Self {
        Self::new(UserPassStatus::SUCCEEDED)
    }

    pub fn failure() -> Self {
        Self::new(UserPassStatus::FAILURE)
    }

    pub fn is_success(&self) -> bool {
        self.status == UserPassStatus::SUCCEEDED
    }

    pub async fn write(&self, stream: &mut dyn AuthStream) -> io::Result<()> {
        stream.write_all(&[self.version, self.status]).await?;
        Ok(())
    }

    pub async fn read(stream: &mut dyn AuthStream) -> io::Result<Self> {
        let mut buffer = [0; 2];
        stream.read_exact(&mut buffer).await?;
        let [version, status] = buffer;

        if version != USER_PASS_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid username/password version",
            ));
        }

        Ok(Self { version, status })
    }
}
