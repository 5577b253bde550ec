//! Config for the LDAP client.
use std::{fmt, time::Duration};

use ldap3::LdapConnSettings;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Validator};

/// LDAP configuration.
///
/// Fields missing from a serialized configuration deserialize to empty strings
/// and are reported by [`Config::validate`], which
/// [`Directory::new`](crate::ldap::Directory::new) calls.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct Config {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes
	#[serde(default)]
	pub url: String,
	/// Base container all directory queries originate from, e.g.
	/// `dc=example,dc=com`
	#[serde(default)]
	pub base_dn: String,
	/// The username or DN of the administrative user, used for connectivity
	/// checks and for looking up users before binding as them
	#[serde(default)]
	pub admin_user: String,
	/// The password for the administrative user
	#[serde(default)]
	pub admin_password: String,
	/// Connection settings.
	#[serde(default)]
	pub connection: ConnectionConfig,
}

impl Config {
	/// Check that every required field is present.
	pub fn validate(&self) -> Result<(), ValidationError> {
		Validator::new("configuration")
			.required("url", &self.url)
			.required("base_dn", &self.base_dn)
			.required("admin_user", &self.admin_user)
			.required("admin_password", &self.admin_password)
			.finish()
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("url", &self.url)
			.field("base_dn", &self.base_dn)
			.field("admin_user", &self.admin_user)
			.field("admin_password", &"<redacted>")
			.field("connection", &self.connection)
			.finish()
	}
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self { timeout: 5, starttls: false }
	}
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	#[must_use]
	pub fn to_settings(&self) -> LdapConnSettings {
		LdapConnSettings::new()
			.set_conn_timeout(Duration::from_secs(self.timeout))
			.set_starttls(self.starttls)
	}
}
