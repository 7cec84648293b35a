/// Filesystem helpers: delimited table reads, atomic writes, directory discovery.
pub mod fs;
