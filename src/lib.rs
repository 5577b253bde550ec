//! Authenticate users against an LDAP directory server.
//!
//! A [`Directory`] holds the address of a directory server, a base DN, and the
//! credentials of an administrative user. It offers a connectivity check and
//! two ways of authenticating a user:
//!
//! * **Direct bind**: the supplied username is used as the bind DN (or, with
//!   Active Directory, as a `DOMAIN\user` logon name, see
//!   [`format_domain_user`]).
//! * **Search then bind**: the administrative user searches for the user's
//!   entry with a configured filter, and the DN of the first result is bound
//!   as with the supplied password.
//!
//! Every operation opens its own connection and closes it again before
//! returning, whether it succeeded or not. There is no pooling, caching or
//! retrying.
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate which
//! is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use ldap_authenticator::{AuthRequest, Config, ConnectionConfig, Directory};
//!
//! // Configuration can also be deserialized with serde. It's hand-constructed
//! // here for demonstration purposes.
//! let config = Config {
//!     url: "ldap://localhost:1389".to_owned(),
//!     base_dn: "dc=example,dc=org".to_owned(),
//!     admin_user: "cn=admin,dc=example,dc=org".to_owned(),
//!     admin_password: "verysecret".to_owned(),
//!     connection: ConnectionConfig::default(),
//! };
//! let directory = Directory::new(config)?;
//! directory.test_connection().await?;
//!
//! let request = AuthRequest::new("john.doe", "password")
//!     .with_search("ou=users,dc=example,dc=org", "(uid={{username}})");
//! match directory.authenticate(&request).await {
//!     Ok(_) => println!("Welcome!"),
//!     Err(err) => println!("{err}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * A rejected administrative bind during search-then-bind is reported as an
//!   authentication failure, like a rejected user bind. Inspect the
//!   [`AuthFailure`] to tell them apart.
//! * [secrecy](https://docs.rs/secrecy) is not used for storing passwords,
//!   they are only kept out of `Debug` output.

pub mod config;
pub mod entry;
pub mod error;
pub mod ldap;
pub mod protocol;

pub use ldap3::{self, SearchEntry};

pub use crate::{
	config::{Config, ConnectionConfig},
	entry::SearchEntryExt,
	error::{AuthFailure, Error, ValidationError},
	ldap::{format_domain_user, AuthRequest, Directory, UserSearch},
	protocol::{Connection, Connector, LdapConnector},
};
