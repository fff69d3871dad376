pub mod config;
pub mod directory;
pub mod name;
pub mod output;
pub mod parse;
pub mod runner;

pub use directory::{DirectoryError, GroupDirectory};
pub use name::{MemberName, NameError, NamePolicy, ValidName};
pub use parse::{GroupRecord, MalformedOutput, parse_detail, parse_names};
