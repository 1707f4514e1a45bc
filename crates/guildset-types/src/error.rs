//! Error type shared by the store, the adapters and the synchronization engine.

pub type GsResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// Backend unreachable, timed out, or failed in a way the caller cannot fix
	StorageUnavailable,
	/// A column with this name already exists (concurrent column creation)
	SchemaConflict(Box<str>),
	/// Key cannot be used as a storage column identifier
	InvalidKey(Box<str>),
	/// Tenant id collides with the global sentinel or is malformed
	InvalidTenant(Box<str>),
	/// Two first-writers inserted a row for the same tenant
	DuplicateRowRace,
	/// Operation needs a host but `init()` has not been called
	NotInitialized,
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::StorageUnavailable => write!(f, "settings storage unavailable"),
			Error::SchemaConflict(col) => write!(f, "column '{}' already exists", col),
			Error::InvalidKey(key) => write!(f, "invalid setting key '{}'", key),
			Error::InvalidTenant(id) => write!(f, "invalid tenant id '{}'", id),
			Error::DuplicateRowRace => write!(f, "settings row was inserted concurrently"),
			Error::NotInitialized => write!(f, "settings provider is not initialized"),
		}
	}
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		assert_eq!(Error::InvalidKey("a b".into()).to_string(), "invalid setting key 'a b'");
		assert_eq!(Error::SchemaConflict("prefix".into()).to_string(), "column 'prefix' already exists");
		assert_eq!(Error::InvalidTenant("0".into()).to_string(), "invalid tenant id '0'");
		assert_eq!(Error::NotInitialized.to_string(), "settings provider is not initialized");
	}
}

// vim: ts=4
