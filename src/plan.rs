// This file is part of the untouch package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (keywords) lastwritetime lastaccesstime createtime

//! Argument resolution and execution of a single timestamp operation.
//!
//! Tokens may appear in any order; nothing here is a positional grammar.
//! A token is classified by shape and by whether it names an existing
//! path, and the scan produces exactly one [`OperationPlan`].

use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::datetime::{self, CalendarDateTime};
use crate::error::UntouchError;
use crate::store::TimestampStore;

/// One of the three timestamp attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Created,
    Written,
    Accessed,
}

/// The subset of timestamp fields an operation targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldSelector {
    pub created: bool,
    pub written: bool,
    pub accessed: bool,
}

impl FieldSelector {
    pub const ALL: Self = Self {
        created: true,
        written: true,
        accessed: true,
    };

    fn is_empty(self) -> bool {
        !(self.created || self.written || self.accessed)
    }

    fn insert(&mut self, field: Field) {
        match field {
            Field::Created => self.created = true,
            Field::Written => self.written = true,
            Field::Accessed => self.accessed = true,
        }
    }
}

/// Keyword synonyms for `-t`, matched as case-insensitive prefixes of a
/// closed table. `lastaccesstime` is listed before `lastwritetime` so
/// that the bare `la` abbreviation selects the access time.
const FIELD_KEYWORDS: &[(&str, Field)] = &[
    ("created", Field::Created),
    ("createtime", Field::Created),
    ("modified", Field::Written),
    ("lw", Field::Written),
    ("lastaccesstime", Field::Accessed),
    ("lastwritetime", Field::Written),
    ("accessed", Field::Accessed),
];

fn match_field(token: &str) -> Option<Field> {
    if token.is_empty() {
        return None;
    }
    let token = token.to_ascii_lowercase();
    FIELD_KEYWORDS
        .iter()
        .find(|(keyword, _)| keyword.starts_with(token.as_str()))
        .map(|&(_, field)| field)
}

/// A fully resolved invocation. Exactly one variant is active per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationPlan {
    /// Copy all three timestamps from `source` onto `dest`.
    Copy { source: PathBuf, dest: PathBuf },
    /// Write `value` to the selected fields of `dest`.
    Set {
        dest: PathBuf,
        value: FileTime,
        fields: FieldSelector,
    },
}

/// Resolves raw command-line tokens into a single [`OperationPlan`].
///
/// Path candidates are checked through `exists`, so a date-looking token
/// that names an existing file is still treated as a file once a
/// datetime value has been accepted.
pub fn resolve(
    tokens: &[String],
    exists: impl Fn(&Path) -> bool,
) -> Result<OperationPlan, UntouchError> {
    if tokens.is_empty() {
        return Err(UntouchError::MissingArguments);
    }

    let mut fields = FieldSelector::ALL;
    let mut value: Option<FileTime> = None;
    let mut source: Option<PathBuf> = None;
    let mut dest: Option<PathBuf> = None;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token.is_empty() {
            return Err(UntouchError::EmptyArgument);
        }

        if let Some(switch) = token.strip_prefix(['-', '/']) {
            if switch.eq_ignore_ascii_case("t") {
                let mut picked = FieldSelector::default();
                i += 1;
                while let Some(field) = tokens.get(i).and_then(|t| match_field(t)) {
                    picked.insert(field);
                    i += 1;
                }
                // No recognized keywords after the directive means all
                // three fields.
                fields = if picked.is_empty() {
                    FieldSelector::ALL
                } else {
                    picked
                };
                continue;
            }
            // Unknown `-x` switches are skipped. A `/`-prefixed token
            // that is not the directive may be an absolute path, so it
            // falls through to the checks below.
            if token.starts_with('-') {
                i += 1;
                continue;
            }
        }

        // Only the first successfully parsed datetime is retained.
        if value.is_none() && token.starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(v) = datetime::parse(token).and_then(CalendarDateTime::to_filetime) {
                value = Some(v);
                i += 1;
                continue;
            }
        }

        let path = Path::new(token);
        if exists(path) {
            if source.is_none() {
                source = Some(path.to_path_buf());
            } else if dest.is_none() {
                dest = Some(path.to_path_buf());
            }
        }
        i += 1;
    }

    // Single-file form: the only path named is the one to update.
    if dest.is_none() {
        dest = source.take();
    }

    match (source, value, dest) {
        (None, None, _) => Err(UntouchError::MissingTimeSource),
        (_, _, None) => Err(UntouchError::MissingDestination),
        (Some(_), Some(_), _) => Err(UntouchError::AmbiguousTimeSource),
        (Some(source), None, Some(dest)) => Ok(OperationPlan::Copy { source, dest }),
        (None, Some(value), Some(dest)) => Ok(OperationPlan::Set {
            dest,
            value,
            fields,
        }),
    }
}

impl OperationPlan {
    /// Performs the single read and/or write against the store.
    pub fn execute(&self, store: &dyn TimestampStore) -> Result<(), UntouchError> {
        match self {
            Self::Copy { source, dest } => {
                let times = store.get(source).map_err(|error| UntouchError::GetTimestamps {
                    path: source.clone(),
                    error,
                })?;
                // Copy mode always transfers all three fields.
                store
                    .set(
                        dest,
                        Some(times.created),
                        Some(times.written),
                        Some(times.accessed),
                    )
                    .map_err(|error| UntouchError::SetTimestamps {
                        path: dest.clone(),
                        error,
                    })
            }
            Self::Set {
                dest,
                value,
                fields,
            } => store
                .set(
                    dest,
                    fields.created.then_some(*value),
                    fields.written.then_some(*value),
                    fields.accessed.then_some(*value),
                )
                .map_err(|error| UntouchError::SetTimestamps {
                    path: dest.clone(),
                    error,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TimestampTriple;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn known(paths: &'static [&'static str]) -> impl Fn(&Path) -> bool {
        move |p: &Path| paths.iter().any(|k| Path::new(k) == p)
    }

    fn parsed(text: &str) -> FileTime {
        datetime::parse(text).unwrap().to_filetime().unwrap()
    }

    #[test]
    fn keyword_table_prefixes() {
        assert_eq!(match_field("C"), Some(Field::Created));
        assert_eq!(match_field("cr"), Some(Field::Created));
        assert_eq!(match_field("CREATED"), Some(Field::Created));
        assert_eq!(match_field("CreateTime"), Some(Field::Created));
        assert_eq!(match_field("m"), Some(Field::Written));
        assert_eq!(match_field("Modified"), Some(Field::Written));
        assert_eq!(match_field("LW"), Some(Field::Written));
        assert_eq!(match_field("LastWriteTime"), Some(Field::Written));
        assert_eq!(match_field("a"), Some(Field::Accessed));
        assert_eq!(match_field("Accessed"), Some(Field::Accessed));
        assert_eq!(match_field("LA"), Some(Field::Accessed));
        assert_eq!(match_field("LastAccessTime"), Some(Field::Accessed));
        assert_eq!(match_field(""), None);
        assert_eq!(match_field("x"), None);
        assert_eq!(match_field("creation"), None);
        assert_eq!(match_field("file.txt"), None);
    }

    #[test]
    fn copy_plan_from_two_existing_paths() {
        let plan = resolve(&tokens(&["a.txt", "b.txt"]), known(&["a.txt", "b.txt"])).unwrap();
        assert_eq!(
            plan,
            OperationPlan::Copy {
                source: PathBuf::from("a.txt"),
                dest: PathBuf::from("b.txt"),
            }
        );
    }

    #[test]
    fn set_plan_defaults_to_all_fields() {
        let plan = resolve(&tokens(&["2024-03-15", "a.txt"]), known(&["a.txt"])).unwrap();
        assert_eq!(
            plan,
            OperationPlan::Set {
                dest: PathBuf::from("a.txt"),
                value: parsed("2024-03-15"),
                fields: FieldSelector::ALL,
            }
        );
    }

    #[test]
    fn arguments_resolve_in_any_order() {
        let forward = resolve(&tokens(&["2024-03-15", "a.txt"]), known(&["a.txt"])).unwrap();
        let backward = resolve(&tokens(&["a.txt", "2024-03-15"]), known(&["a.txt"])).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn selector_directive_accumulates_keywords() {
        let plan = resolve(
            &tokens(&["-t", "c", "lw", "2024-03-15", "a.txt"]),
            known(&["a.txt"]),
        )
        .unwrap();
        let OperationPlan::Set { fields, .. } = plan else {
            panic!("expected a set plan");
        };
        assert_eq!(
            fields,
            FieldSelector {
                created: true,
                written: true,
                accessed: false,
            }
        );
    }

    #[test]
    fn slash_directive_and_case_insensitivity() {
        let plan = resolve(
            &tokens(&["/T", "Accessed", "2024-03-15", "a.txt"]),
            known(&["a.txt"]),
        )
        .unwrap();
        let OperationPlan::Set { fields, .. } = plan else {
            panic!("expected a set plan");
        };
        assert_eq!(
            fields,
            FieldSelector {
                created: false,
                written: false,
                accessed: true,
            }
        );
    }

    #[test]
    fn empty_selector_directive_means_all_fields() {
        let plan = resolve(&tokens(&["-t", "2024-03-15", "a.txt"]), known(&["a.txt"])).unwrap();
        let OperationPlan::Set { fields, .. } = plan else {
            panic!("expected a set plan");
        };
        assert_eq!(fields, FieldSelector::ALL);
    }

    #[test]
    fn unknown_switches_are_skipped() {
        let plan = resolve(
            &tokens(&["-v", "2024-03-15", "a.txt"]),
            known(&["a.txt"]),
        );
        assert!(plan.is_ok());
    }

    #[test]
    fn digit_leading_file_name_still_resolves_as_a_path() {
        // "2024report.txt" starts with a digit but is not a datetime.
        let plan = resolve(&tokens(&["2024-03-15", "2024report.txt"]), known(&["2024report.txt"]))
            .unwrap();
        let OperationPlan::Set { dest, .. } = plan else {
            panic!("expected a set plan");
        };
        assert_eq!(dest, PathBuf::from("2024report.txt"));
    }

    #[test]
    fn first_parsed_datetime_wins() {
        let plan = resolve(
            &tokens(&["2024-03-15", "2025-01-01", "a.txt"]),
            known(&["a.txt"]),
        )
        .unwrap();
        let OperationPlan::Set { value, .. } = plan else {
            panic!("expected a set plan");
        };
        assert_eq!(value, parsed("2024-03-15"));
    }

    #[test]
    fn source_and_datetime_together_are_rejected() {
        let err = resolve(
            &tokens(&["a.txt", "2024-03-15", "b.txt"]),
            known(&["a.txt", "b.txt"]),
        )
        .unwrap_err();
        assert!(matches!(err, UntouchError::AmbiguousTimeSource));
    }

    #[test]
    fn datetime_without_a_destination_is_rejected() {
        let err = resolve(&tokens(&["-t", "created", "2024-03-15"]), known(&[])).unwrap_err();
        assert!(matches!(err, UntouchError::MissingDestination));
    }

    #[test]
    fn invalid_datetime_with_one_file_is_missing_a_time_source() {
        // 2023 is not a leap year, so the token is not a datetime, and
        // the only path named becomes the destination.
        let err = resolve(&tokens(&["2023-02-29", "a.txt"]), known(&["a.txt"])).unwrap_err();
        assert!(matches!(err, UntouchError::MissingTimeSource));
    }

    #[test]
    fn no_tokens_and_empty_tokens_are_rejected() {
        assert!(matches!(
            resolve(&[], known(&[])),
            Err(UntouchError::MissingArguments)
        ));
        assert!(matches!(
            resolve(&tokens(&["", "a.txt"]), known(&["a.txt"])),
            Err(UntouchError::EmptyArgument)
        ));
    }

    /// In-memory stand-in for the filesystem collaborator.
    struct MemStore {
        files: RefCell<HashMap<PathBuf, TimestampTriple>>,
    }

    impl MemStore {
        fn with(entries: &[(&str, TimestampTriple)]) -> Self {
            Self {
                files: RefCell::new(
                    entries
                        .iter()
                        .map(|(name, t)| (PathBuf::from(name), *t))
                        .collect(),
                ),
            }
        }

        fn times(&self, name: &str) -> TimestampTriple {
            self.files.borrow()[Path::new(name)]
        }
    }

    impl TimestampStore for MemStore {
        fn exists(&self, path: &Path) -> bool {
            self.files.borrow().contains_key(path)
        }

        fn get(&self, path: &Path) -> io::Result<TimestampTriple> {
            self.files
                .borrow()
                .get(path)
                .copied()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn set(
            &self,
            path: &Path,
            created: Option<FileTime>,
            written: Option<FileTime>,
            accessed: Option<FileTime>,
        ) -> io::Result<()> {
            let mut files = self.files.borrow_mut();
            let entry = files
                .get_mut(path)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            if let Some(t) = created {
                entry.created = t;
            }
            if let Some(t) = written {
                entry.written = t;
            }
            if let Some(t) = accessed {
                entry.accessed = t;
            }
            Ok(())
        }
    }

    fn triple(created: i64, written: i64, accessed: i64) -> TimestampTriple {
        TimestampTriple {
            created: FileTime::from_unix_time(created, 0),
            written: FileTime::from_unix_time(written, 0),
            accessed: FileTime::from_unix_time(accessed, 0),
        }
    }

    #[test]
    fn copy_transfers_all_three_fields() {
        let store = MemStore::with(&[
            ("src", triple(1, 2, 3)),
            ("dst", triple(7, 8, 9)),
        ]);
        let plan = OperationPlan::Copy {
            source: PathBuf::from("src"),
            dest: PathBuf::from("dst"),
        };

        plan.execute(&store).unwrap();

        assert_eq!(store.times("dst"), triple(1, 2, 3));
        // Round-trip: the source is untouched.
        assert_eq!(store.times("src"), triple(1, 2, 3));
    }

    #[test]
    fn set_touches_only_selected_fields() {
        let store = MemStore::with(&[("dst", triple(7, 8, 9))]);
        let value = FileTime::from_unix_time(100, 0);
        let plan = OperationPlan::Set {
            dest: PathBuf::from("dst"),
            value,
            fields: FieldSelector {
                created: true,
                written: false,
                accessed: false,
            },
        };

        plan.execute(&store).unwrap();

        let after = store.times("dst");
        assert_eq!(after.created, value);
        assert_eq!(after.written, FileTime::from_unix_time(8, 0));
        assert_eq!(after.accessed, FileTime::from_unix_time(9, 0));
    }

    #[test]
    fn copy_from_an_unreadable_source_fails() {
        let store = MemStore::with(&[("dst", triple(7, 8, 9))]);
        let plan = OperationPlan::Copy {
            source: PathBuf::from("gone"),
            dest: PathBuf::from("dst"),
        };

        let err = plan.execute(&store).unwrap_err();
        assert!(matches!(err, UntouchError::GetTimestamps { .. }));
        // No partial state: the destination is unchanged.
        assert_eq!(store.times("dst"), triple(7, 8, 9));
    }
}
