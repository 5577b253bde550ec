//! Client for checking connectivity to LDAP and authenticating users

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
	config::Config,
	entry::SearchEntryExt,
	error::{AuthFailure, Error, ValidationError, Validator},
	protocol::{Connection, Connector, LdapConnector, Session},
};

/// Placeholder in [`UserSearch::search_filter`] replaced by the username.
pub const USERNAME_PLACEHOLDER: &str = "{{username}}";

/// Separates the domain from the user name in down-level logon names
/// (`DOMAIN\user`).
pub const DOMAIN_SEPARATOR: char = '\\';

/// Holds the configuration of and provides an interface for interactions with
/// an LDAP server.
///
/// No connection is held between calls: every operation opens its own
/// connection and closes it before returning, so a single [`Directory`] can be
/// shared between tasks.
#[derive(Debug, Clone)]
pub struct Directory<C = LdapConnector> {
	/// The configuration of the LDAP client.
	config: Config,
	/// Opens a connection for each operation.
	connector: C,
}

/// Credentials to authenticate, and optionally how to find the user's entry.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthRequest {
	/// The name to authenticate as. Used directly as the bind DN unless
	/// [`AuthRequest::search`] is set.
	#[serde(default)]
	pub username: String,
	/// The password to bind with.
	#[serde(default)]
	pub password: String,
	/// If set, the user's entry is looked up with the administrative user and
	/// its DN is bound as, instead of binding as `username` directly.
	#[serde(default)]
	pub search: Option<UserSearch>,
}

/// Where and how to search for a user's entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSearch {
	/// The search base
	#[serde(default)]
	pub search_base: String,
	/// The search filter, containing [`USERNAME_PLACEHOLDER`], e.g.
	/// `(uid={{username}})`
	#[serde(default)]
	pub search_filter: String,
}

impl AuthRequest {
	/// A request binding directly as `username`.
	#[must_use]
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into(), search: None }
	}

	/// Look the user up below `search_base` with `search_filter` first.
	#[must_use]
	pub fn with_search(
		mut self,
		search_base: impl Into<String>,
		search_filter: impl Into<String>,
	) -> Self {
		self.search = Some(UserSearch {
			search_base: search_base.into(),
			search_filter: search_filter.into(),
		});
		self
	}

	/// Check that every required field is present.
	pub fn validate(&self) -> Result<(), ValidationError> {
		let mut validator = Validator::new("authentication request")
			.required("username", &self.username)
			.required("password", &self.password);
		if let Some(search) = &self.search {
			validator = validator
				.required("search_base", &search.search_base)
				.required("search_filter", &search.search_filter);
		}
		validator.finish()
	}
}

impl fmt::Debug for AuthRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthRequest")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("search", &self.search)
			.finish()
	}
}

impl UserSearch {
	/// The search filter with the placeholder replaced by `username`, escaped
	/// for use in a filter.
	#[must_use]
	pub fn filter_for(&self, username: &str) -> String {
		self.search_filter.replacen(USERNAME_PLACEHOLDER, &ldap3::ldap_escape(username), 1)
	}
}

impl Directory {
	/// Create a new [`Directory`] connecting through [`ldap3`].
	pub fn new(config: Config) -> Result<Self, Error> {
		Self::with_connector(config, LdapConnector)
	}
}

impl<C> Directory<C> {
	/// Create a new [`Directory`] opening connections with `connector`.
	pub fn with_connector(config: Config, connector: C) -> Result<Self, Error> {
		config.validate()?;
		Ok(Self { config, connector })
	}

	/// The configuration this client was created with.
	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The URL of the directory server.
	#[must_use]
	pub fn url(&self) -> &str {
		&self.config.url
	}

	/// The base DN.
	#[must_use]
	pub fn base_dn(&self) -> &str {
		&self.config.base_dn
	}

	/// The administrative username.
	#[must_use]
	pub fn admin_user(&self) -> &str {
		&self.config.admin_user
	}

	/// The administrative password.
	#[must_use]
	pub fn admin_password(&self) -> &str {
		&self.config.admin_password
	}
}

impl<C: Connector> Directory<C> {
	/// Open a connection to the configured server.
	async fn connect(&self) -> Result<Session<C::Connection>, ldap3::LdapError> {
		debug!(url = %self.config.url, "Opening connection");
		let conn = self.connector.open(&self.config.url, &self.config.connection).await?;
		Ok(Session::new(conn))
	}

	/// Check that the server is reachable and accepts the administrative
	/// credentials.
	pub async fn test_connection(&self) -> Result<bool, Error> {
		let mut session = self.connect().await.map_err(Error::Connection)?;
		let res = session
			.conn()
			.bind(&self.config.admin_user, &self.config.admin_password)
			.await
			.map_err(Error::Connection);
		session.close().await;

		if let Err(err) = &res {
			warn!("Connection test failed: {err}");
		}
		res.map(|()| true)
	}

	/// Authenticate a user, either by binding as them directly or, if the
	/// request has a [`UserSearch`], by looking up their entry and binding as
	/// its DN.
	///
	/// Returns `Ok(true)` on success. Every kind of rejection is reported as
	/// [`Error::Authentication`].
	pub async fn authenticate(&self, request: &AuthRequest) -> Result<bool, Error> {
		request.validate()?;

		let mut session = self.connect().await.map_err(AuthFailure::Connect)?;
		let res = match &request.search {
			Some(search) => self.search_and_bind(session.conn(), request, search).await,
			None => bind_user(session.conn(), &request.username, &request.password).await,
		};
		session.close().await;

		match res {
			Ok(()) => {
				debug!(username = %request.username, "Authenticated");
				Ok(true)
			}
			Err(err) => {
				warn!(username = %request.username, "Authentication failed: {err}");
				Err(err.into())
			}
		}
	}

	/// Bind as the administrative user, find the user's entry and bind as it.
	async fn search_and_bind(
		&self,
		conn: &mut C::Connection,
		request: &AuthRequest,
		search: &UserSearch,
	) -> Result<(), AuthFailure> {
		conn.bind(&self.config.admin_user, &self.config.admin_password)
			.await
			.map_err(AuthFailure::ServiceBind)?;

		let filter = search.filter_for(&request.username);
		debug!(base = %search.search_base, %filter, "Searching for user");
		let entries =
			conn.search(&search.search_base, &filter).await.map_err(AuthFailure::Search)?;

		let entry = entries.first().ok_or(AuthFailure::UserNotFound)?;
		let dn = entry.distinguished_name().ok_or(AuthFailure::MissingIdentity)?;
		bind_user(conn, dn, &request.password).await
	}
}

/// Bind as a user on an open connection.
async fn bind_user<T: Connection>(
	conn: &mut T,
	dn: &str,
	password: &str,
) -> Result<(), AuthFailure> {
	debug!(%dn, "Binding");
	conn.bind(dn, password).await.map_err(AuthFailure::Bind)
}

/// Prefix `username` with `domain` unless it already names one.
///
/// ```
/// use ldap_authenticator::format_domain_user;
///
/// assert_eq!(format_domain_user("bob", "CORP"), r"CORP\bob");
/// assert_eq!(format_domain_user(r"OTHER\bob", "CORP"), r"OTHER\bob");
/// ```
#[must_use]
pub fn format_domain_user(username: &str, domain: &str) -> String {
	if username.contains(DOMAIN_SEPARATOR) {
		username.to_owned()
	} else {
		format!("{domain}{DOMAIN_SEPARATOR}{username}")
	}
}
