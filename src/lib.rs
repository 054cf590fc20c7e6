// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! untouch ~ rewrite the creation, last-write, and last-access
//! timestamps of a file, either copied from a source file or set from a
//! free-form date/time string.

pub mod datetime;
pub mod error;
pub mod plan;
pub mod store;

pub use error::UntouchError;
pub use plan::{FieldSelector, OperationPlan};
pub use store::{FsStore, TimestampStore, TimestampTriple};

static USAGE: &str = "\
Assign new timestamps to a file or directory.

(1) Copy all three timestamps from a source file to a destination file:
    Usage: untouch SOURCE DEST
           SOURCE - file to copy timestamps from
           DEST   - file to copy timestamps to

(2) Set a specific time on selected timestamp fields:
    Usage: untouch [-t FIELD...] DATETIME DEST
           -t FIELD... - which fields to update; keywords are Created,
              Modified, Accessed (abbreviations like C, M, A, LW, LA and
              LastWriteTime, LastAccessTime, CreateTime also work).
              If omitted or empty, all three fields are updated.
           DATETIME - the year part must be 4 digits:
              yyyy-mm-dd [hh:mm[:ss[.fff]] [am|pm]]
              yyyy-mm-dd[Thh:mm[:ss[.fff]][am|pm]]   (formatted w/o spaces)
              mm/dd/yyyy ...
              If it contains spaces, it must be quoted. Without am/pm a
              24-hour clock is assumed; 'am' and 'pm' may be abbreviated
              to 'a' and 'p'.
           DEST - file to update. If it contains spaces, it must be quoted.

    Arguments may appear in any order.
    Everything is case insensitive.";

/// The usage text printed after every failure.
pub fn usage() -> &'static str {
    USAGE
}

/// Runs one invocation against the real filesystem and returns the
/// process exit code.
pub fn uumain(args: impl Iterator<Item = String>) -> i32 {
    let tokens: Vec<String> = args.skip(1).collect();
    let store = FsStore;

    let result = plan::resolve(&tokens, |p| store.exists(p)).and_then(|plan| plan.execute(&store));

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("untouch: {err}");
            println!("{USAGE}");
            1
        }
    }
}
