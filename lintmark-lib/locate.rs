//! Jumping to the next annotation line.

use crate::search::{
  SearchDirection,
  SearchFacility,
  SearchParams,
};

/// Pattern matching a line whose content, after leading whitespace, starts
/// with `marker`.
pub fn annotation_pattern(marker: &str) -> String {
  format!(r"^\s*{}", regex_syntax::escape(marker))
}

/// Restores the saved search parameters when dropped.
struct RestoreParams<'a, S: SearchFacility + ?Sized> {
  search: &'a mut S,
  saved:  Option<SearchParams>,
}

impl<S: SearchFacility + ?Sized> Drop for RestoreParams<'_, S> {
  fn drop(&mut self) {
    if let Some(saved) = self.saved.take() {
      self.search.set_params(saved);
    }
  }
}

/// Move the search facility to the next annotation line.
///
/// The facility's parameters are replaced for the duration of the search and
/// restored afterwards, whatever the outcome. Search errors are logged and
/// reported as no match.
pub fn find_next_annotation<S>(search: &mut S, marker: &str, wrap: bool) -> bool
where
  S: SearchFacility + ?Sized,
{
  let saved = search.params();
  let guard = RestoreParams {
    search,
    saved: Some(saved),
  };
  guard.search.set_params(SearchParams {
    pattern: annotation_pattern(marker),
    regex: true,
    case_sensitive: true,
    whole_word: false,
    wrap,
    direction: SearchDirection::Forward,
  });

  match guard.search.find_next() {
    Ok(found) => found,
    Err(err) => {
      tracing::warn!(%err, "searching for annotations failed");
      false
    },
  }
}
