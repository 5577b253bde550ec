//! Error codes

use std::fmt;

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The configuration or an authentication request was missing required
	/// fields. Raised before any connection is opened.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Binding as the administrative user during a connectivity check failed.
	#[error("LDAP bind failed: {0}")]
	Connection(#[source] ldap3::LdapError),
	/// A bind or search step on the authentication path failed.
	#[error("Authentication failed: {0}")]
	Authentication(#[from] AuthFailure),
}

/// The step of an authentication attempt that failed.
#[derive(thiserror::Error, Debug)]
pub enum AuthFailure {
	/// The connection to the directory server could not be established.
	#[error("could not connect: {0}")]
	Connect(#[source] ldap3::LdapError),
	/// The directory rejected the administrative credentials used to search
	/// for the user.
	#[error("service bind rejected: {0}")]
	ServiceBind(#[source] ldap3::LdapError),
	/// The user search could not be performed.
	#[error("search failed: {0}")]
	Search(#[source] ldap3::LdapError),
	/// The user search returned no entries.
	#[error("user not found")]
	UserNotFound,
	/// The first search result had no distinguished name to bind as.
	#[error("missing identity")]
	MissingIdentity,
	/// The directory rejected the user's credentials.
	#[error("{0}")]
	Bind(#[source] ldap3::LdapError),
}

/// One or more required fields were missing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {subject}: {}", list(.fields))]
pub struct ValidationError {
	/// What was being validated, e.g. `configuration`.
	pub subject: &'static str,
	/// Every field that failed validation, in declaration order.
	pub fields: Vec<FieldError>,
}

impl ValidationError {
	/// Whether the given field is among the failures.
	#[must_use]
	pub fn contains(&self, field: &str) -> bool {
		self.fields.iter().any(|f| f.field == field)
	}
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
	/// Name of the field as it appears in serialized form.
	pub field: &'static str,
	/// What is wrong with it.
	pub problem: Problem,
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
	/// The field was absent or empty.
	Required,
}

impl fmt::Display for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.problem {
			Problem::Required => write!(f, "`{}` is required", self.field),
		}
	}
}

/// Join field errors for display.
fn list(fields: &[FieldError]) -> String {
	fields.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Collects required-field failures for one value.
#[derive(Debug)]
pub(crate) struct Validator {
	/// See [`ValidationError::subject`].
	subject: &'static str,
	/// Failures collected so far.
	fields: Vec<FieldError>,
}

impl Validator {
	/// Start validating `subject`.
	pub(crate) fn new(subject: &'static str) -> Self {
		Self { subject, fields: Vec::new() }
	}

	/// Record `field` as missing if `value` is empty.
	pub(crate) fn required(mut self, field: &'static str, value: &str) -> Self {
		if value.is_empty() {
			self.fields.push(FieldError { field, problem: Problem::Required });
		}
		self
	}

	/// Finish, failing if any field was rejected.
	pub(crate) fn finish(self) -> Result<(), ValidationError> {
		if self.fields.is_empty() {
			Ok(())
		} else {
			Err(ValidationError { subject: self.subject, fields: self.fields })
		}
	}
}
