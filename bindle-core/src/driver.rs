use crate::{ConnectOptions, Connection, Context, Result, Session};
use std::sync::Arc;

/// Entry point of a backend.
///
/// A driver turns a connection url into a [`Session`]. Everything that talks
/// to the database afterwards goes through its [`Connection`] and the
/// [`crate::Prepared`] handles that connection creates.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection;

    /// Name of the driver, also the scheme of its connection urls.
    const NAME: &'static str;

    /// Open the driver side of a session.
    fn connect(&self, options: &ConnectOptions) -> Result<Self::Connection>;

    /// Parse `url`, connect and wrap the connection into a session handle.
    fn get_handle(self, url: &str) -> Result<Arc<Session<Self>>> {
        let options = ConnectOptions::parse(url, Self::NAME)?;
        let connection = self
            .connect(&options)
            .with_context(|| format!("While connecting to `{}`", options.url()))?;
        log::debug!("Connected to {}", options.url());
        Ok(Session::new(self, connection, options))
    }
}
