//! Fixed sizes imposed by the remote protocol.

/// Longest server identifier the connector will store.
pub const URI_MAX_LENGTH: usize = 256;

/// Longest request URL the connector will build.
pub const URL_MAX_LENGTH: usize = 2048;

/// Longest link name accepted in a path segment.
pub const LINK_NAME_MAX_LENGTH: usize = 2048;

/// Width of one `<collection>/<id>` slot in a server-side reference buffer.
pub const OBJECT_REF_STRING_LEN: usize = 48;

/// Maximum number of soft/external link hops followed by one resolution.
pub const MAX_LINK_TRAVERSALS: usize = 16;
