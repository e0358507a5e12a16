/// Field holding the document identity.
pub const DOC_ID: &str = "_id";

/// Fields managed by the store; a schema may not declare them.
pub const RESERVED_FIELDS: [&str; 1] = [DOC_ID];

/// Separator for embedded field paths, e.g. `embed.key`.
pub const FIELD_SEPARATOR: &str = ".";

/// Version assigned to a schema created without an explicit version.
pub const INITIAL_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_THREAD_NAME: &str = "strata-worker";
