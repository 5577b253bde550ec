//! The operations this crate needs from an LDAP protocol client.
//!
//! [`LdapConnector`] implements them on top of [`ldap3`]. Other
//! implementations can be handed to
//! [`Directory::with_connector`](crate::ldap::Directory::with_connector), for
//! example to run against an in-memory directory in tests.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapError, Scope, SearchEntry};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ConnectionConfig;

/// Opens connections to a directory server.
#[async_trait]
pub trait Connector: Send + Sync {
	/// The connection type produced by [`Connector::open`].
	type Connection: Connection;

	/// Open a new, unbound connection to the server at `url`.
	async fn open(
		&self,
		url: &str,
		settings: &ConnectionConfig,
	) -> Result<Self::Connection, LdapError>;
}

/// An open connection to a directory server.
#[async_trait]
pub trait Connection: Send {
	/// Perform a simple bind, failing if the server rejects the credentials.
	async fn bind(&mut self, dn: &str, password: &str) -> Result<(), LdapError>;

	/// Search the subtree below `base` with `filter`. Only distinguished names
	/// are needed from the returned entries.
	async fn search(&mut self, base: &str, filter: &str) -> Result<Vec<SearchEntry>, LdapError>;

	/// Unbind and close the connection.
	async fn close(&mut self) -> Result<(), LdapError>;

	/// Tear the connection down without waiting on the server. Called instead
	/// of [`Connection::close`] when an operation is dropped before finishing.
	fn abort(&mut self);
}

/// [`Connector`] backed by [`ldap3::LdapConnAsync`]. Must be used from within
/// a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapConnector;

#[async_trait]
impl Connector for LdapConnector {
	type Connection = LdapConnection;

	async fn open(
		&self,
		url: &str,
		settings: &ConnectionConfig,
	) -> Result<LdapConnection, LdapError> {
		let (conn, ldap) = LdapConnAsync::with_settings(settings.to_settings(), url).await?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});
		Ok(LdapConnection { ldap, driver })
	}
}

/// A connection opened by [`LdapConnector`].
#[derive(Debug)]
pub struct LdapConnection {
	/// Handle used to issue operations.
	ldap: ldap3::Ldap,
	/// Background task driving the connection.
	driver: JoinHandle<()>,
}

#[async_trait]
impl Connection for LdapConnection {
	async fn bind(&mut self, dn: &str, password: &str) -> Result<(), LdapError> {
		self.ldap.simple_bind(dn, password).await?.success()?;
		Ok(())
	}

	async fn search(&mut self, base: &str, filter: &str) -> Result<Vec<SearchEntry>, LdapError> {
		// "1.1" requests no attributes, the DN is always returned
		let (entries, _res) =
			self.ldap.search(base, Scope::Subtree, filter, vec!["1.1"]).await?.success()?;
		Ok(entries.into_iter().map(SearchEntry::construct).collect())
	}

	async fn close(&mut self) -> Result<(), LdapError> {
		if let Err(err) = self.ldap.unbind().await {
			self.driver.abort();
			return Err(err);
		}
		if let Err(err) = (&mut self.driver).await {
			warn!("Failed to join background task: {err}");
		}
		Ok(())
	}

	fn abort(&mut self) {
		self.driver.abort();
	}
}

/// Owns a connection for the duration of one operation.
///
/// [`Session::close`] must be called on every path that finishes normally. If
/// the session is dropped without it, the connection is aborted instead.
#[derive(Debug)]
pub(crate) struct Session<C: Connection> {
	/// The wrapped connection.
	conn: C,
	/// Set once close has been attempted.
	closed: bool,
}

impl<C: Connection> Session<C> {
	/// Wrap a freshly opened connection.
	pub(crate) fn new(conn: C) -> Self {
		Self { conn, closed: false }
	}

	/// The underlying connection.
	pub(crate) fn conn(&mut self) -> &mut C {
		&mut self.conn
	}

	/// Close the connection. A failure is logged; the outcome of the operation
	/// that used the connection takes precedence.
	pub(crate) async fn close(mut self) {
		let res = self.conn.close().await;
		self.closed = true;
		match res {
			Ok(()) => debug!("Connection closed"),
			Err(err) => warn!("Closing connection failed: {err}"),
		}
	}
}

impl<C: Connection> Drop for Session<C> {
	fn drop(&mut self) {
		if !self.closed {
			warn!("Operation dropped before completion, aborting connection");
			self.conn.abort();
		}
	}
}
