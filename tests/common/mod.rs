#![allow(dead_code)]

use std::{
	collections::HashMap,
	error::Error,
	io,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
};

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapError, LdapResult, SearchEntry};
use ldap_authenticator::{Config, Connection, ConnectionConfig, Connector};

pub const ADMIN_DN: &str = "cn=admin,dc=example,dc=org";
pub const ADMIN_PASSWORD: &str = "adminpassword";
pub const USERS_BASE: &str = "ou=users,dc=example,dc=org";
pub const UID_FILTER: &str = "(uid={{username}})";

pub fn config(url: &str, admin_password: &str) -> Config {
	Config {
		url: url.to_owned(),
		base_dn: "dc=example,dc=org".to_owned(),
		admin_user: ADMIN_DN.to_owned(),
		admin_password: admin_password.to_owned(),
		connection: ConnectionConfig::default(),
	}
}

pub fn user_dn(uid: &str) -> String {
	format!("uid={uid},{USERS_BASE}")
}

/// An in-memory directory standing in for a server.
#[derive(Debug, Default)]
pub struct MockState {
	/// Bind DN to password
	pub credentials: HashMap<String, String>,
	/// Entries returned by searches, matched on their `uid` attribute
	pub entries: Vec<SearchEntry>,
	pub unreachable: bool,
	pub fail_close: bool,
	pub stall_search: bool,
	pub opens: AtomicUsize,
	pub closes: AtomicUsize,
	pub aborts: AtomicUsize,
	/// Every filter searched with
	pub filters: Mutex<Vec<String>>,
}

impl MockState {
	/// A directory with the admin user and `john.doe`.
	pub fn example() -> Self {
		let mut state = Self::default();
		state.add_credentials(ADMIN_DN, ADMIN_PASSWORD);
		state.add_user("john.doe", "correct horse");
		state
	}

	pub fn add_credentials(&mut self, dn: &str, password: &str) {
		self.credentials.insert(dn.to_owned(), password.to_owned());
	}

	pub fn add_user(&mut self, uid: &str, password: &str) {
		let dn = user_dn(uid);
		self.add_credentials(&dn, password);
		self.entries.push(SearchEntry {
			dn,
			attrs: HashMap::from([("uid".to_owned(), vec![uid.to_owned()])]),
			bin_attrs: HashMap::new(),
		});
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	pub fn closes(&self) -> usize {
		self.closes.load(Ordering::SeqCst)
	}

	pub fn aborts(&self) -> usize {
		self.aborts.load(Ordering::SeqCst)
	}

	pub fn filters(&self) -> Vec<String> {
		self.filters.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
	}
}

#[derive(Debug, Clone)]
pub struct MockConnector(pub Arc<MockState>);

#[derive(Debug)]
pub struct MockConnection(Arc<MockState>);

pub fn invalid_credentials() -> LdapError {
	LdapError::LdapResult {
		result: LdapResult {
			rc: 49,
			matched: String::new(),
			text: "Invalid credentials".to_owned(),
			refs: vec![],
			ctrls: vec![],
		},
	}
}

#[async_trait]
impl Connector for MockConnector {
	type Connection = MockConnection;

	async fn open(
		&self,
		_url: &str,
		_settings: &ConnectionConfig,
	) -> Result<MockConnection, LdapError> {
		if self.0.unreachable {
			return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into());
		}
		self.0.opens.fetch_add(1, Ordering::SeqCst);
		Ok(MockConnection(Arc::clone(&self.0)))
	}
}

#[async_trait]
impl Connection for MockConnection {
	async fn bind(&mut self, dn: &str, password: &str) -> Result<(), LdapError> {
		match self.0.credentials.get(dn) {
			Some(expected) if expected == password => Ok(()),
			_ => Err(invalid_credentials()),
		}
	}

	async fn search(&mut self, base: &str, filter: &str) -> Result<Vec<SearchEntry>, LdapError> {
		self.0
			.filters
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.push(filter.to_owned());
		if self.0.stall_search {
			std::future::pending::<()>().await;
		}
		Ok(self
			.0
			.entries
			.iter()
			.filter(|entry| entry.dn.is_empty() || entry.dn.ends_with(base))
			.filter(|entry| {
				entry
					.attrs
					.get("uid")
					.and_then(|values| values.first())
					.is_some_and(|uid| filter == format!("(uid={uid})"))
			})
			.cloned()
			.collect())
	}

	async fn close(&mut self) -> Result<(), LdapError> {
		self.0.closes.fetch_add(1, Ordering::SeqCst);
		if self.0.fail_close {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
		}
		Ok(())
	}

	fn abort(&mut self) {
		self.0.aborts.fetch_add(1, Ordering::SeqCst);
	}
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(
		&format!("ou={},dc=example,dc=org", ou),
		vec![("objectClass", ["organizationalUnit"].into())],
	)
	.await?
	.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.delete(&format!("ou={},dc=example,dc=org", ou)).await?.success()?;
	Ok(())
}

pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn Error>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind(ADMIN_DN, ADMIN_PASSWORD).await?.success()?;
	Ok(ldap)
}

pub async fn ldap_delete_user(ldap: &mut ldap3::Ldap, uid: &str) -> Result<(), Box<dyn Error>> {
	ldap.delete(&user_dn(uid)).await?.success()?;
	Ok(())
}

pub async fn ldap_add_user(
	ldap: &mut ldap3::Ldap,
	uid: &str,
	password: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(
		&user_dn(uid),
		vec![
			("objectClass", ["inetOrgPerson"].into()),
			("cn", [uid].into()),
			("sn", [uid].into()),
			("uid", [uid].into()),
			("userPassword", [password].into()),
		],
	)
	.await?
	.success()?;
	Ok(())
}
