// Listener registry and two-phase dispatch
//
// Idle -> Authorizing -> (Committing | aborted) -> Idle
//
// Vetoable listeners are asked first and may reject the change; change
// listeners are told once the edit is committed and cannot refuse it.
// Dispatch always happens in registration order on the calling thread.

use crate::error::{LeadsheetError, Result};
use crate::events::change::{Change, ChangeEvent};
use crate::leadsheet::request::EditRequest;
use std::sync::Arc;

/// Pre-commit listener, may reject a change before anything is mutated
pub trait VetoableListener: Send + Sync {
    /// Return `Err(reason)` to veto; the reason is shown to the user verbatim
    fn authorize_change(&self, change: &Change) -> std::result::Result<(), String>;
}

/// Committed-phase listener
pub trait ChangeListener: Send + Sync {
    /// Called after the change is applied, also for undo and redo.
    ///
    /// Further edits cannot be made from inside the callback; queue them on
    /// `follow_ups` instead and they run once the broadcast is over.
    fn leadsheet_changed(&self, event: &ChangeEvent, follow_ups: &mut FollowUps);

    /// Opens the bracket around a compound change (see [`Change::is_compound`]).
    ///
    /// Every listener gets `change_started` before any `leadsheet_changed` call
    /// for the event, and `change_completed` after all of them.
    fn change_started(&self, _event: &ChangeEvent) {}

    /// Closes the bracket opened by `change_started`
    fn change_completed(&self, _event: &ChangeEvent) {}
}

/// Registration token used to remove a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Edits queued by change listeners during a broadcast
#[derive(Debug, Default)]
pub struct FollowUps {
    requests: Vec<EditRequest>,
}

impl FollowUps {
    pub fn push(&mut self, request: EditRequest) {
        self.requests.push(request);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub(crate) fn into_requests(self) -> Vec<EditRequest> {
        self.requests
    }
}

/// State of the change protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolPhase {
    #[default]
    Idle,
    Authorizing,
    Committing,
}

/// Owns the listeners of a leadsheet and drives the protocol phases
#[derive(Default)]
pub struct ChangeDispatcher {
    vetoable: Vec<(ListenerId, Arc<dyn VetoableListener>)>,
    listeners: Vec<(ListenerId, Arc<dyn ChangeListener>)>,
    next_id: u64,
    phase: ProtocolPhase,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub fn add_vetoable_listener(&mut self, listener: Arc<dyn VetoableListener>) -> ListenerId {
        let id = self.allocate_id();
        self.vetoable.push((id, listener));
        id
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ChangeListener>) -> ListenerId {
        let id = self.allocate_id();
        self.listeners.push((id, listener));
        id
    }

    /// Returns false when the id is unknown
    pub fn remove_vetoable_listener(&mut self, id: ListenerId) -> bool {
        let before = self.vetoable.len();
        self.vetoable.retain(|(other, _)| *other != id);
        self.vetoable.len() != before
    }

    /// Returns false when the id is unknown
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn vetoable_listener_count(&self) -> usize {
        self.vetoable.len()
    }

    pub fn phase(&self) -> ProtocolPhase {
        self.phase
    }

    /// Ask every vetoable listener, stopping at the first rejection.
    ///
    /// On success the dispatcher is left in `Committing`: the caller must
    /// follow with [`ChangeDispatcher::commit`] or [`ChangeDispatcher::abort`].
    pub fn authorize(&mut self, change: &Change) -> Result<()> {
        assert_eq!(
            self.phase,
            ProtocolPhase::Idle,
            "change protocol re-entered while {:?}",
            self.phase
        );
        self.phase = ProtocolPhase::Authorizing;

        for (id, listener) in &self.vetoable {
            if let Err(reason) = listener.authorize_change(change) {
                tracing::warn!(listener = ?id, change = %change, %reason, "change vetoed");
                self.phase = ProtocolPhase::Idle;
                return Err(LeadsheetError::Vetoed(reason));
            }
        }

        self.phase = ProtocolPhase::Committing;
        Ok(())
    }

    /// Leave `Committing` without broadcasting (dry runs)
    pub fn abort(&mut self) {
        self.phase = ProtocolPhase::Idle;
    }

    /// Broadcast a committed change, collecting the follow-up edits listeners queued
    pub fn commit(&mut self, event: &ChangeEvent) -> FollowUps {
        assert_eq!(
            self.phase,
            ProtocolPhase::Committing,
            "commit without a successful authorization"
        );
        let follow_ups = self.broadcast(event);
        self.phase = ProtocolPhase::Idle;
        follow_ups
    }

    /// Broadcast an undo/redo replay; history is not subject to veto
    pub fn replay(&mut self, event: &ChangeEvent) -> FollowUps {
        assert_eq!(
            self.phase,
            ProtocolPhase::Idle,
            "replay started while {:?}",
            self.phase
        );
        self.phase = ProtocolPhase::Committing;
        let follow_ups = self.broadcast(event);
        self.phase = ProtocolPhase::Idle;
        follow_ups
    }

    fn broadcast(&self, event: &ChangeEvent) -> FollowUps {
        let compound = event.change.is_compound();
        if compound {
            for (_, listener) in &self.listeners {
                listener.change_started(event);
            }
        }
        let mut follow_ups = FollowUps::default();
        for (_, listener) in &self.listeners {
            listener.leadsheet_changed(event, &mut follow_ups);
        }
        if compound {
            for (_, listener) in &self.listeners {
                listener.change_completed(event);
            }
        }
        follow_ups
    }
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("vetoable", &self.vetoable.len())
            .field("listeners", &self.listeners.len())
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::change::{ChangeOrigin, LayoutChange};
    use crate::leadsheet::store::ItemStore;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        veto: Option<&'static str>,
    }

    impl VetoableListener for Recorder {
        fn authorize_change(&self, _change: &Change) -> std::result::Result<(), String> {
            self.log.lock().unwrap().push(format!("authorize {}", self.name));
            match self.veto {
                Some(reason) => Err(reason.to_string()),
                None => Ok(()),
            }
        }
    }

    impl ChangeListener for Recorder {
        fn leadsheet_changed(&self, event: &ChangeEvent, follow_ups: &mut FollowUps) {
            self.log
                .lock()
                .unwrap()
                .push(format!("changed {} {:?}", self.name, event.origin));
            follow_ups.push(EditRequest::InsertBars { at_bar: 0, count: 1 });
        }

        fn change_started(&self, event: &ChangeEvent) {
            self.log
                .lock()
                .unwrap()
                .push(format!("started {} {:?}", self.name, event.origin));
        }

        fn change_completed(&self, event: &ChangeEvent) {
            self.log
                .lock()
                .unwrap()
                .push(format!("completed {} {:?}", self.name, event.origin));
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, veto: Option<&'static str>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: Arc::clone(log),
            veto,
        })
    }

    fn change() -> Change {
        Change::SizeChanged {
            old_size: 4,
            new_size: 8,
            removed: Vec::new(),
            adjustments: Vec::new(),
            layout: LayoutChange::default(),
        }
    }

    #[test]
    fn test_veto_stops_at_first_rejection() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ChangeDispatcher::new();
        dispatcher.add_vetoable_listener(recorder("a", &log, None));
        dispatcher.add_vetoable_listener(recorder("b", &log, Some("segment still used")));
        dispatcher.add_vetoable_listener(recorder("c", &log, None));

        let result = dispatcher.authorize(&change());
        assert_eq!(result, Err(LeadsheetError::Vetoed("segment still used".into())));
        assert_eq!(dispatcher.phase(), ProtocolPhase::Idle);
        assert_eq!(*log.lock().unwrap(), vec!["authorize a", "authorize b"]);
    }

    #[test]
    fn test_commit_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ChangeDispatcher::new();
        dispatcher.add_listener(recorder("first", &log, None));
        dispatcher.add_listener(recorder("second", &log, None));

        dispatcher.authorize(&change()).unwrap();
        assert_eq!(dispatcher.phase(), ProtocolPhase::Committing);
        let follow_ups = dispatcher.commit(&ChangeEvent::new(change(), ChangeOrigin::Edit));

        assert_eq!(dispatcher.phase(), ProtocolPhase::Idle);
        assert_eq!(follow_ups.len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["changed first Edit", "changed second Edit"]
        );
    }

    #[test]
    fn test_compound_change_is_bracketed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ChangeDispatcher::new();
        dispatcher.add_listener(recorder("first", &log, None));
        dispatcher.add_listener(recorder("second", &log, None));
        let compound = Change::BarsInserted {
            at_bar: 0,
            count: 2,
            new_initial_section: Some(ItemStore::new().next_handle()),
            layout: LayoutChange::default(),
        };
        assert!(compound.is_compound());

        dispatcher.authorize(&compound).unwrap();
        dispatcher.commit(&ChangeEvent::new(compound.clone(), ChangeOrigin::Edit));
        dispatcher.replay(&ChangeEvent::new(compound, ChangeOrigin::Undo));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "started first Edit",
                "started second Edit",
                "changed first Edit",
                "changed second Edit",
                "completed first Edit",
                "completed second Edit",
                "started first Undo",
                "started second Undo",
                "changed first Undo",
                "changed second Undo",
                "completed first Undo",
                "completed second Undo",
            ]
        );
    }

    #[test]
    fn test_remove_listener() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ChangeDispatcher::new();
        let id = dispatcher.add_listener(recorder("gone", &log, None));
        let veto_id = dispatcher.add_vetoable_listener(recorder("gone", &log, Some("no")));

        assert!(dispatcher.remove_listener(id));
        assert!(!dispatcher.remove_listener(id));
        assert!(dispatcher.remove_vetoable_listener(veto_id));
        assert_ne!(id, veto_id);

        dispatcher.authorize(&change()).unwrap();
        let follow_ups = dispatcher.commit(&ChangeEvent::new(change(), ChangeOrigin::Edit));
        assert!(follow_ups.is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_replay_skips_authorization() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = ChangeDispatcher::new();
        dispatcher.add_vetoable_listener(recorder("veto", &log, Some("no")));
        dispatcher.add_listener(recorder("l", &log, None));

        dispatcher.replay(&ChangeEvent::new(change(), ChangeOrigin::Undo));
        assert_eq!(*log.lock().unwrap(), vec!["changed l Undo"]);
    }

    #[test]
    #[should_panic(expected = "re-entered")]
    fn test_reentry_is_rejected() {
        let mut dispatcher = ChangeDispatcher::new();
        dispatcher.authorize(&change()).unwrap();
        let _ = dispatcher.authorize(&change());
    }
}
