//! Helper methods for extracting data from search results.
use ldap3::SearchEntry;

/// An extension trait for [`SearchEntry`] that provides convenience methods for
/// extracting data.
pub trait SearchEntryExt {
	/// The distinguished name of the entry, or `None` if the server returned
	/// an empty one.
	fn distinguished_name(&self) -> Option<&str>;
}

impl SearchEntryExt for SearchEntry {
	fn distinguished_name(&self) -> Option<&str> {
		let dn = self.dn.trim();
		(!dn.is_empty()).then_some(dn)
	}
}
