use crate::error::{Error, Result};

/// Outcome of one filter callback for one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Keep the entry and consult the next filter.
    Include,
    /// Drop the entry; later filters are not consulted.
    Exclude,
    /// Abort the whole listing call.
    Error(String),
}

/// A caller-supplied predicate applied to every entry of a directory
/// listing.
pub trait DirectoryFilter: Send + Sync {
    /// Judges one entry. `name` is the bare entry name, `identifier` the
    /// entry's absolute identifier and `parent_identifier` the absolute
    /// identifier of its containing folder.
    fn accept(&self, name: &str, identifier: &str, parent_identifier: &str) -> FilterDecision;
}

impl<F> DirectoryFilter for F
where
    F: Fn(&str, &str, &str) -> FilterDecision + Send + Sync,
{
    fn accept(&self, name: &str, identifier: &str, parent_identifier: &str) -> FilterDecision {
        self(name, identifier, parent_identifier)
    }
}

/// Runs an ordered filter chain over one entry. The first `Exclude` wins;
/// an `Error` fails the listing call.
pub(crate) fn evaluate_filters(
    filters: &[Box<dyn DirectoryFilter>],
    name: &str,
    identifier: &str,
    parent_identifier: &str,
) -> Result<bool> {
    for filter in filters {
        match filter.accept(name, identifier, parent_identifier) {
            FilterDecision::Include => {}
            FilterDecision::Exclude => return Ok(false),
            FilterDecision::Error(message) => return Err(Error::FilterFailed(message)),
        }
    }
    Ok(true)
}
