//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The path of the root directory of every tree.
pub const ROOT_PATH: &str = "/";

/// The separator between path segments.
pub const DIR_SEPARATOR: char = '/';

/// The prefix for whiteout files.
pub const WHITEOUT_PREFIX: &str = ".wh.";

/// The marker for opaque directories.
pub const OPAQUE_WHITEOUT: &str = ".wh..wh..opq";
