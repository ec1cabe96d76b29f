//! Selection and highlight coordination between the list, map and detail
//! views.
//!
//! [`SelectionCoordinator`] is the only writer of [`SelectionState`]. Each
//! operation replaces the whole state value at once and then notifies
//! subscribers, so an observer never sees a half-applied composite update.
//! Ids are checked against the store when they are set; ids whose issue has
//! since disappeared are cleared on the next [`SelectionCoordinator::current`]
//! read.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, issue::IssueId, store::IssueLookup};

/// Which issue is open in the detail view and which is cross-highlighted in
/// the list and map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
  pub open_issue_id:        Option<IssueId>,
  pub highlighted_issue_id: Option<IssueId>,
}

/// A user interaction reported by one of the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
  /// A list row was clicked: open it and highlight its map marker.
  ListClicked(IssueId),
  /// A map marker was clicked: open it and highlight its list row.
  MarkerClicked(IssueId),
  /// The pointer entered a list row or marker.
  ListHovered(IssueId),
  /// The pointer left the hovered row or marker.
  HoverEnded,
  DetailClosed,
}

type Subscriber = Box<dyn FnMut(&SelectionState) + Send>;

#[derive(Default)]
pub struct SelectionCoordinator {
  state:       SelectionState,
  subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for SelectionCoordinator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SelectionCoordinator")
      .field("state", &self.state)
      .field("subscribers", &self.subscribers.len())
      .finish()
  }
}

impl SelectionCoordinator {
  pub fn new() -> Self { Self::default() }

  /// Register a callback run after every state change.
  pub fn subscribe(&mut self, f: impl FnMut(&SelectionState) + Send + 'static) {
    self.subscribers.push(Box::new(f));
  }

  /// The state as of the last write, without reconciling against the store.
  #[cfg(test)]
  pub(crate) fn peek(&self) -> SelectionState { self.state }

  /// The current state, after clearing any field whose issue no longer
  /// exists.
  pub fn current(&mut self, store: &impl IssueLookup) -> SelectionState {
    let stale = |id: Option<IssueId>| id.is_some_and(|id| !store.contains(id));
    let mut next = self.state;
    if stale(next.open_issue_id) {
      tracing::warn!(issue = ?next.open_issue_id, "clearing dangling detail selection");
      next.open_issue_id = None;
    }
    if stale(next.highlighted_issue_id) {
      tracing::warn!(issue = ?next.highlighted_issue_id, "clearing dangling highlight");
      next.highlighted_issue_id = None;
    }
    self.replace(next)
  }

  pub fn select_for_detail(
    &mut self,
    store: &impl IssueLookup,
    id: IssueId,
  ) -> Result<SelectionState> {
    ensure_exists(store, id)?;
    Ok(self.replace(SelectionState { open_issue_id: Some(id), ..self.state }))
  }

  pub fn close_detail(&mut self) -> SelectionState {
    self.replace(SelectionState { open_issue_id: None, ..self.state })
  }

  pub fn highlight(
    &mut self,
    store: &impl IssueLookup,
    id: IssueId,
  ) -> Result<SelectionState> {
    ensure_exists(store, id)?;
    Ok(self.replace(SelectionState { highlighted_issue_id: Some(id), ..self.state }))
  }

  pub fn clear_highlight(&mut self) -> SelectionState {
    self.replace(SelectionState { highlighted_issue_id: None, ..self.state })
  }

  /// Open `id` in the detail view and highlight it, as one state change.
  pub fn select_and_highlight(
    &mut self,
    store: &impl IssueLookup,
    id: IssueId,
  ) -> Result<SelectionState> {
    ensure_exists(store, id)?;
    Ok(self.replace(SelectionState {
      open_issue_id:        Some(id),
      highlighted_issue_id: Some(id),
    }))
  }

  /// Translate a view interaction into a coordinator transition.
  pub fn dispatch(
    &mut self,
    store: &impl IssueLookup,
    event: ViewEvent,
  ) -> Result<SelectionState> {
    match event {
      ViewEvent::ListClicked(id) | ViewEvent::MarkerClicked(id) => {
        self.select_and_highlight(store, id)
      }
      ViewEvent::ListHovered(id) => self.highlight(store, id),
      ViewEvent::HoverEnded => Ok(self.clear_highlight()),
      ViewEvent::DetailClosed => Ok(self.close_detail()),
    }
  }

  /// Drop every reference to `id`, e.g. right after it was removed.
  pub fn forget(&mut self, id: IssueId) -> SelectionState {
    let keep = |field: Option<IssueId>| field.filter(|f| *f != id);
    self.replace(SelectionState {
      open_issue_id:        keep(self.state.open_issue_id),
      highlighted_issue_id: keep(self.state.highlighted_issue_id),
    })
  }

  /// Back to the startup state; used when the dashboard unmounts or the
  /// issue set is replaced.
  pub fn reset(&mut self) -> SelectionState {
    self.replace(SelectionState::default())
  }

  fn replace(&mut self, next: SelectionState) -> SelectionState {
    if next != self.state {
      self.state = next;
      for subscriber in &mut self.subscribers {
        subscriber(&self.state);
      }
    }
    self.state
  }
}

fn ensure_exists(store: &impl IssueLookup, id: IssueId) -> Result<()> {
  if store.contains(id) { Ok(()) } else { Err(Error::NotFound(id)) }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
  };

  use uuid::Uuid;

  use super::*;
  use crate::ErrorKind;

  #[derive(Default)]
  struct Ids(HashSet<IssueId>);

  impl Ids {
    fn with(n: usize) -> (Self, Vec<IssueId>) {
      let ids: Vec<_> = (0..n).map(|_| IssueId::from(Uuid::new_v4())).collect();
      (Self(ids.iter().copied().collect()), ids)
    }
  }

  impl IssueLookup for Ids {
    fn contains(&self, id: IssueId) -> bool { self.0.contains(&id) }
  }

  #[test]
  fn starts_empty() {
    let c = SelectionCoordinator::new();
    assert_eq!(c.peek(), SelectionState::default());
  }

  #[test]
  fn detail_and_highlight_are_independent() {
    let (store, ids) = Ids::with(2);
    let mut c = SelectionCoordinator::new();

    c.highlight(&store, ids[0]).unwrap();
    let s = c.select_for_detail(&store, ids[1]).unwrap();
    assert_eq!(s.open_issue_id, Some(ids[1]));
    assert_eq!(s.highlighted_issue_id, Some(ids[0]));

    let s = c.close_detail();
    assert_eq!(s.open_issue_id, None);
    assert_eq!(s.highlighted_issue_id, Some(ids[0]));

    let s = c.clear_highlight();
    assert_eq!(s, SelectionState::default());
  }

  #[test]
  fn unknown_ids_are_refused() {
    let (store, _) = Ids::with(1);
    let mut c = SelectionCoordinator::new();
    let stranger = IssueId::from(Uuid::new_v4());

    for result in [
      c.select_for_detail(&store, stranger),
      c.highlight(&store, stranger),
      c.select_and_highlight(&store, stranger),
    ] {
      assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }
    assert_eq!(c.peek(), SelectionState::default());
  }

  #[test]
  fn composite_selection_is_observed_whole() {
    let (store, ids) = Ids::with(2);
    let mut c = SelectionCoordinator::new();
    c.select_and_highlight(&store, ids[0]).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    c.subscribe(move |s| sink.lock().unwrap().push(*s));

    let s = c.select_and_highlight(&store, ids[1]).unwrap();
    assert_eq!(s.open_issue_id, Some(ids[1]));
    assert_eq!(s.highlighted_issue_id, Some(ids[1]));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], s);
  }

  #[test]
  fn unchanged_state_is_not_rebroadcast() {
    let (store, ids) = Ids::with(1);
    let mut c = SelectionCoordinator::new();
    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    c.subscribe(move |_| *sink.lock().unwrap() += 1);

    c.highlight(&store, ids[0]).unwrap();
    c.highlight(&store, ids[0]).unwrap();
    c.close_detail();
    assert_eq!(*count.lock().unwrap(), 1);
  }

  #[test]
  fn dangling_ids_clear_on_read() {
    let (mut store, ids) = Ids::with(2);
    let mut c = SelectionCoordinator::new();
    c.select_for_detail(&store, ids[0]).unwrap();
    c.highlight(&store, ids[1]).unwrap();

    store.0.remove(&ids[1]);
    let s = c.current(&store);
    assert_eq!(s.open_issue_id, Some(ids[0]));
    assert_eq!(s.highlighted_issue_id, None);
  }

  #[test]
  fn forget_clears_matching_fields_only() {
    let (store, ids) = Ids::with(2);
    let mut c = SelectionCoordinator::new();
    c.select_and_highlight(&store, ids[0]).unwrap();
    assert_eq!(c.forget(ids[1]).open_issue_id, Some(ids[0]));
    assert_eq!(c.forget(ids[0]), SelectionState::default());
  }

  #[test]
  fn view_events() {
    let (store, ids) = Ids::with(2);
    let mut c = SelectionCoordinator::new();

    let s = c.dispatch(&store, ViewEvent::ListHovered(ids[0])).unwrap();
    assert_eq!(s.highlighted_issue_id, Some(ids[0]));
    assert_eq!(s.open_issue_id, None);

    let s = c.dispatch(&store, ViewEvent::MarkerClicked(ids[1])).unwrap();
    assert_eq!(s.open_issue_id, Some(ids[1]));
    assert_eq!(s.highlighted_issue_id, Some(ids[1]));

    let s = c.dispatch(&store, ViewEvent::DetailClosed).unwrap();
    assert_eq!(s.open_issue_id, None);

    let s = c.dispatch(&store, ViewEvent::HoverEnded).unwrap();
    assert_eq!(s, SelectionState::default());
  }
}
