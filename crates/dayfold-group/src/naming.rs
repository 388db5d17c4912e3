//! Archive naming.

use compact_str::{CompactString, format_compact};

/// Name an archive covering `days` of `year`/`month`.
///
/// Produces `YYYY.MM.DD.zip` for one day and `YYYY.MM.DD-DD.zip` for several,
/// taking the first and last day in the order given. Days are not checked for
/// contiguity. Returns `None` when `days` is empty.
pub fn archive_name<S: AsRef<str>>(year: &str, month: &str, days: &[S]) -> Option<CompactString> {
    let body = match days {
        [] => return None,
        [only] => format_compact!("{:0>2}", only.as_ref()),
        [first, .., last] => format_compact!("{:0>2}-{:0>2}", first.as_ref(), last.as_ref()),
    };
    Some(format_compact!("{year:0>4}.{month:0>2}.{body}.zip"))
}
