//! [`Dashboard`]: the context object a host passes to its views.
//!
//! Owns the record store and the selection coordinator for one dashboard
//! session and routes every write through them, so the list, map and detail
//! views stay thin callers.

use crate::{
  Result,
  filter::{self, FilterCriteria},
  issue::{Issue, IssueDraft, IssueId},
  selection::{SelectionCoordinator, SelectionState, ViewEvent},
  stats::IssueStats,
  store::IssueStore,
};

#[derive(Debug)]
pub struct Dashboard {
  store:     IssueStore,
  selection: SelectionCoordinator,
}

impl Dashboard {
  pub fn new(store: IssueStore) -> Self {
    Self { store, selection: SelectionCoordinator::new() }
  }

  pub fn store(&self) -> &IssueStore { &self.store }

  /// Mutable access for creates, updates and status changes.
  pub fn store_mut(&mut self) -> &mut IssueStore { &mut self.store }

  pub fn selection_mut(&mut self) -> &mut SelectionCoordinator {
    &mut self.selection
  }

  /// Current selection, healed against the store.
  pub fn selection(&mut self) -> SelectionState {
    self.selection.current(&self.store)
  }

  pub fn dispatch(&mut self, event: ViewEvent) -> Result<SelectionState> {
    self.selection.dispatch(&self.store, event)
  }

  /// Issues matching `criteria`, most urgent first.
  pub fn visible(&self, criteria: &FilterCriteria) -> Vec<&Issue> {
    let mut issues = filter::apply(self.store.list(), criteria, self.store.now());
    filter::rank(&mut issues);
    issues
  }

  /// The open issue, if any, for the detail view.
  pub fn open_issue(&mut self) -> Option<&Issue> {
    let id = self.selection().open_issue_id?;
    self.store.get(id).ok()
  }

  pub fn stats(&self) -> IssueStats {
    IssueStats::compute(self.store.list(), self.store.now())
  }

  /// Remove an issue and drop any selection that pointed at it.
  pub fn remove(&mut self, id: IssueId) -> Result<Issue> {
    let removed = self.store.remove(id)?;
    self.selection.forget(id);
    Ok(removed)
  }

  /// Swap in a new issue set. Selection is reset only if the swap succeeds.
  pub fn replace_issues(
    &mut self,
    drafts: impl IntoIterator<Item = IssueDraft>,
  ) -> Result<Vec<IssueId>> {
    let ids = self.store.replace_all(drafts)?;
    self.selection.reset();
    Ok(ids)
  }

  /// Tear down view state when the dashboard unmounts.
  pub fn unmount(&mut self) { self.selection.reset(); }
}
