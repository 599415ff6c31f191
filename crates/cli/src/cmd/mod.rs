mod format;
mod generate;
mod info;

pub use format::cmd_format;
pub use generate::cmd_gen;
pub use info::cmd_info;

/// Target used when `--target` is not given.
pub const DEFAULT_TARGET: &str = "//:all";
