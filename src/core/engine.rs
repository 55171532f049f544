use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{info, warn};

use super::data::BuddyData;
use super::error::{BuddyError, Result};
use super::feedback::{Feedback, FeedbackForm, Performance};
use super::invitation::{Invitation, InvitationDecision, InvitationStatus};
use super::message::Message;
use super::profile::UserProfile;
use super::scorer::{compatibility, MatchBadge};
use super::session::{SessionPlan, SessionStatus, StudySession};
use super::store::{load_or_seed, BlobStore};

/// Most candidates a match search returns
pub const MAX_CANDIDATES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub profile: UserProfile,
    pub score: f64,
}

impl Candidate {
    pub fn badge(&self) -> MatchBadge {
        MatchBadge::classify(self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSummary {
    pub buddy: String,
    pub unread: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerSummary {
    pub username: String,
    pub completed_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub invitations_sent: usize,
    pub invitations_received: usize,
    /// Sent invitations that were accepted
    pub connections: usize,
    pub sessions_completed: usize,
    pub performance: Performance,
    pub partners: Vec<PartnerSummary>,
}

/// Answers every query the presentation layer makes and applies every
/// mutation, persisting the whole aggregate after each successful change.
///
/// Mutations hold the write lock from validation through the save, so id
/// assignment never races. Reads share the lock and see one snapshot.
pub struct RelationshipEngine<S: BlobStore> {
    data: RwLock<BuddyData>,
    store: S,
}

impl<S: BlobStore> RelationshipEngine<S> {
    /// Load from `store`, falling back to the seed dataset
    pub fn open(store: S) -> Self {
        let data = load_or_seed(&store);
        info!(
            profiles = data.profiles.len(),
            invitations = data.invitations.len(),
            sessions = data.sessions.len(),
            "engine ready"
        );
        Self::with_data(data, store)
    }

    pub fn with_data(data: BuddyData, store: S) -> Self {
        Self {
            data: RwLock::new(data),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Copy of the current aggregate
    pub fn snapshot(&self) -> BuddyData {
        self.data.read().clone()
    }

    fn read<T>(&self, user: &str, f: impl FnOnce(&BuddyData) -> T) -> Result<T> {
        let data = self.data.read();
        require_profile(&data, user)?;
        Ok(f(&*data))
    }

    /// Run `op` under the write lock and save on success.
    ///
    /// `op` must validate before touching anything. A failed save leaves the
    /// in-memory change in place and reports `StoreUnavailable`.
    fn commit<T>(&self, op: impl FnOnce(&mut BuddyData) -> Result<T>) -> Result<T> {
        let mut data = self.data.write();
        let value = op(&mut *data)?;
        if let Err(e) = self.store.save(&data) {
            warn!(error = %e, "save failed, in-memory state kept");
            return Err(e);
        }
        Ok(value)
    }

    pub fn profile(&self, user: &str) -> Result<UserProfile> {
        let data = self.data.read();
        require_profile(&data, user).cloned()
    }

    /// Up to five other users, best score first.
    ///
    /// Equal scores keep the profile store's insertion order.
    pub fn rank_candidates(&self, user: &str) -> Result<Vec<Candidate>> {
        let data = self.data.read();
        let me = require_profile(&data, user)?;

        let mut candidates: Vec<Candidate> = data
            .profiles
            .iter()
            .filter(|other| other.username != me.username)
            .map(|other| Candidate {
                profile: other.clone(),
                score: compatibility(me, other),
            })
            .collect();

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        candidates.truncate(MAX_CANDIDATES);
        Ok(candidates)
    }

    // --- invitations ---

    pub fn invite(&self, from: &str, to: &str) -> Result<Invitation> {
        let invitation = self.commit(|data| {
            let sender = require_profile(data, from)?;
            let recipient = require_profile(data, to)?;
            let score = compatibility(sender, recipient);
            data.invitations.create(from, to, score)
        })?;

        info!(id = invitation.id, from, to, score = invitation.match_score, "invitation sent");
        Ok(invitation)
    }

    /// Accept or decline an invitation addressed to `user`
    pub fn respond_invitation(
        &self,
        user: &str,
        id: u64,
        decision: InvitationDecision,
    ) -> Result<Invitation> {
        let invitation = self.commit(|data| {
            require_profile(data, user)?;
            let invitation = data
                .invitations
                .get(id)
                .ok_or_else(|| BuddyError::NotFound(format!("invitation {}", id)))?;
            if invitation.to_username != user {
                return Err(BuddyError::NotParticipant {
                    username: user.to_string(),
                    what: format!("invitation {} as its recipient", id),
                });
            }
            data.invitations.respond(id, decision)
        })?;

        info!(id, user, status = %invitation.status, "invitation answered");
        Ok(invitation)
    }

    pub fn invitations_received(&self, user: &str) -> Result<Vec<Invitation>> {
        self.read(user, |data| {
            data.invitations.received_by(user).into_iter().cloned().collect()
        })
    }

    pub fn invitations_sent(&self, user: &str) -> Result<Vec<Invitation>> {
        self.read(user, |data| {
            data.invitations.sent_by(user).into_iter().cloned().collect()
        })
    }

    /// Accepted buddies, sorted by username
    pub fn buddies_of(&self, user: &str) -> Result<Vec<String>> {
        self.read(user, |data| {
            data.invitations.accepted_buddies_of(user).into_iter().collect()
        })
    }

    // --- messages ---

    pub fn send_message(&self, from: &str, to: &str, body: &str) -> Result<Message> {
        let message = self.commit(|data| {
            require_buddies(data, from, to)?;
            data.messages.send(from, to, body)
        })?;

        info!(id = message.id, from, to, "message sent");
        Ok(message)
    }

    /// Conversation with `buddy` as `user` sees it; marks `buddy`'s messages read
    pub fn open_conversation(&self, user: &str, buddy: &str) -> Result<Vec<Message>> {
        let mut data = self.data.write();
        require_buddies(&data, user, buddy)?;

        let flipped = data.messages.mark_read(user, buddy);
        let conversation: Vec<Message> = data
            .messages
            .conversation(user, buddy)
            .into_iter()
            .cloned()
            .collect();

        if flipped > 0 {
            info!(user, buddy, flipped, "messages marked read");
            if let Err(e) = self.store.save(&data) {
                warn!(error = %e, "save failed, in-memory state kept");
                return Err(e);
            }
        }
        Ok(conversation)
    }

    /// Read-only conversation view; leaves read flags alone
    pub fn conversation(&self, user: &str, other: &str) -> Result<Vec<Message>> {
        let data = self.data.read();
        require_profile(&data, user)?;
        require_profile(&data, other)?;
        Ok(data
            .messages
            .conversation(user, other)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn mark_read(&self, recipient: &str, sender: &str) -> Result<usize> {
        let flipped = self.commit(|data| {
            require_profile(data, recipient)?;
            require_profile(data, sender)?;
            Ok(data.messages.mark_read(recipient, sender))
        })?;
        Ok(flipped)
    }

    pub fn unread_count(&self, recipient: &str, sender: &str) -> Result<usize> {
        let data = self.data.read();
        require_profile(&data, recipient)?;
        require_profile(&data, sender)?;
        Ok(data.messages.unread_count(recipient, sender))
    }

    /// Each buddy with the number of unread messages from them
    pub fn chat_overview(&self, user: &str) -> Result<Vec<ChatSummary>> {
        self.read(user, |data| {
            data.invitations
                .accepted_buddies_of(user)
                .into_iter()
                .map(|buddy| ChatSummary {
                    unread: data.messages.unread_count(user, &buddy),
                    buddy,
                })
                .collect()
        })
    }

    // --- sessions ---

    pub fn schedule_session(&self, user: &str, buddy: &str, plan: SessionPlan) -> Result<StudySession> {
        let session = self.commit(|data| {
            if user == buddy {
                return Err(BuddyError::SamePerson(user.to_string()));
            }
            require_buddies(data, user, buddy)?;
            data.sessions.schedule(user, buddy, plan)
        })?;

        info!(id = session.id, user, buddy, date = %session.date, "session scheduled");
        Ok(session)
    }

    /// Complete or cancel a session `user` takes part in
    pub fn transition_session(&self, user: &str, id: u64, to: SessionStatus) -> Result<StudySession> {
        let session = self.commit(|data| {
            require_profile(data, user)?;
            let session = data
                .sessions
                .get(id)
                .ok_or_else(|| BuddyError::NotFound(format!("session {}", id)))?;
            if !session.has_participant(user) {
                return Err(BuddyError::NotParticipant {
                    username: user.to_string(),
                    what: format!("session {}", id),
                });
            }
            data.sessions.transition(id, to)
        })?;

        info!(id, user, status = %session.status, "session updated");
        Ok(session)
    }

    pub fn complete_session(&self, user: &str, id: u64) -> Result<StudySession> {
        self.transition_session(user, id, SessionStatus::Completed)
    }

    pub fn cancel_session(&self, user: &str, id: u64) -> Result<StudySession> {
        self.transition_session(user, id, SessionStatus::Cancelled)
    }

    pub fn upcoming_sessions(&self, user: &str) -> Result<Vec<StudySession>> {
        self.read(user, |data| {
            data.sessions.upcoming_for(user).into_iter().cloned().collect()
        })
    }

    pub fn completed_sessions(&self, user: &str) -> Result<Vec<StudySession>> {
        self.read(user, |data| {
            data.sessions.completed_for(user).into_iter().cloned().collect()
        })
    }

    // --- feedback ---

    pub fn submit_feedback(&self, user: &str, session_id: u64, form: FeedbackForm) -> Result<Feedback> {
        let feedback = self.commit(|data| {
            require_profile(data, user)?;
            let BuddyData { sessions, feedback, .. } = data;
            feedback.submit(sessions, session_id, user, form)
        })?;

        info!(
            session_id,
            user,
            rating = feedback.rating,
            productivity = feedback.productivity,
            "feedback submitted"
        );
        Ok(feedback)
    }

    pub fn pending_feedback(&self, user: &str) -> Result<Vec<StudySession>> {
        self.read(user, |data| {
            data.feedback
                .pending_feedback_for(&data.sessions, user)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn feedback_history(&self, user: &str) -> Result<Vec<Feedback>> {
        self.read(user, |data| {
            data.feedback.history_for(user).into_iter().cloned().collect()
        })
    }

    // --- dashboard ---

    pub fn dashboard(&self, user: &str) -> Result<DashboardMetrics> {
        self.read(user, |data| {
            let sent = data.invitations.sent_by(user);
            let connections = sent
                .iter()
                .filter(|inv| inv.status == InvitationStatus::Accepted)
                .count();
            let completed = data.sessions.completed_for(user);

            let partners = data
                .invitations
                .accepted_buddies_of(user)
                .into_iter()
                .map(|buddy| PartnerSummary {
                    completed_sessions: completed
                        .iter()
                        .filter(|s| s.has_participant(&buddy))
                        .count(),
                    username: buddy,
                })
                .collect();

            DashboardMetrics {
                invitations_sent: sent.len(),
                invitations_received: data.invitations.received_by(user).len(),
                connections,
                sessions_completed: completed.len(),
                performance: data.feedback.performance_of(user),
                partners,
            }
        })
    }
}

fn require_profile<'a>(data: &'a BuddyData, username: &str) -> Result<&'a UserProfile> {
    data.profiles
        .get(username)
        .ok_or_else(|| BuddyError::NotFound(format!("user {}", username)))
}

fn require_buddies(data: &BuddyData, user: &str, other: &str) -> Result<()> {
    require_profile(data, user)?;
    require_profile(data, other)?;
    if !data.invitations.are_buddies(user, other) {
        return Err(BuddyError::NotBuddy {
            user: user.to_string(),
            other: other.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feedback::WouldStudyAgain;
    use crate::core::profile::ProfileStore;
    use crate::core::seed::seed_data;
    use crate::core::session::{SessionDuration, SessionLocation};
    use crate::core::store::MemoryBlobStore;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn engine() -> RelationshipEngine<MemoryBlobStore> {
        RelationshipEngine::with_data(seed_data(), MemoryBlobStore::new())
    }

    fn buddies(engine: &RelationshipEngine<MemoryBlobStore>, a: &str, b: &str) {
        let inv = engine.invite(a, b).unwrap();
        engine.respond_invitation(b, inv.id, InvitationDecision::Accept).unwrap();
    }

    fn plan(date: (i32, u32, u32)) -> SessionPlan {
        SessionPlan {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            duration: SessionDuration::OneHour,
            location: SessionLocation::StudyRoom,
            subject: "Linear algebra".to_string(),
            notes: "bring problem set 3".to_string(),
        }
    }

    fn form(rating: u8, again: WouldStudyAgain) -> FeedbackForm {
        FeedbackForm {
            rating,
            productivity: 4,
            would_study_again: again,
            comments: "good pace".to_string(),
        }
    }

    #[test]
    fn test_open_falls_back_to_seed() {
        let engine = RelationshipEngine::open(MemoryBlobStore::new());
        assert_eq!(engine.snapshot().profiles.len(), 5);
        // loading alone does not write anything back
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_rank_candidates_excludes_self_and_caps() {
        let mut data = seed_data();
        for i in 0..6 {
            data.profiles.insert(UserProfile::new(&format!("extra{}", i), "Extra", "Visual"));
        }
        let engine = RelationshipEngine::with_data(data, MemoryBlobStore::new());

        let ranked = engine.rank_candidates("alice").unwrap();
        assert_eq!(ranked.len(), MAX_CANDIDATES);
        assert!(ranked.iter().all(|c| c.profile.username != "alice"));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_candidates_seed_order() {
        let engine = engine();
        let ranked = engine.rank_candidates("alice").unwrap();
        let names: Vec<_> = ranked.iter().map(|c| c.profile.username.as_str()).collect();
        // david shares both subjects and the study style with alice
        assert_eq!(names, vec!["david", "bob", "emma", "carol"]);
        assert_eq!(ranked[0].badge(), MatchBadge::Good);
        assert_eq!(ranked[3].badge(), MatchBadge::Fair);
    }

    #[test]
    fn test_rank_ties_keep_store_order() {
        let profiles: ProfileStore = [
            UserProfile::new("me", "Me", "Visual").with_subjects(&["Math"]),
            UserProfile::new("zed", "Zed", "Visual").with_subjects(&["Math"]),
            UserProfile::new("amy", "Amy", "Visual").with_subjects(&["Math"]),
        ]
        .into_iter()
        .collect();
        let data = BuddyData {
            profiles,
            ..BuddyData::default()
        };
        let engine = RelationshipEngine::with_data(data, MemoryBlobStore::new());

        let names: Vec<_> = engine
            .rank_candidates("me")
            .unwrap()
            .into_iter()
            .map(|c| c.profile.username)
            .collect();
        assert_eq!(names, vec!["zed", "amy"]);
    }

    #[test]
    fn test_unknown_user_not_found() {
        let engine = engine();
        assert_matches!(engine.rank_candidates("mallory"), Err(BuddyError::NotFound(_)));
        assert_matches!(engine.invite("alice", "mallory"), Err(BuddyError::NotFound(_)));
        assert_matches!(engine.dashboard("admin"), Err(BuddyError::NotFound(_)));
    }

    #[test]
    fn test_invite_snapshots_score_and_persists() {
        let engine = engine();
        let inv = engine.invite("alice", "bob").unwrap();
        let expected = compatibility(
            &engine.profile("alice").unwrap(),
            &engine.profile("bob").unwrap(),
        );
        assert_eq!(inv.match_score, expected);

        let saved = engine.store().load().unwrap();
        assert_eq!(saved.invitations.len(), 1);
    }

    #[test]
    fn test_only_recipient_may_respond() {
        let engine = engine();
        let inv = engine.invite("alice", "bob").unwrap();

        assert_matches!(
            engine.respond_invitation("alice", inv.id, InvitationDecision::Accept),
            Err(BuddyError::NotParticipant { .. })
        );
        engine.respond_invitation("bob", inv.id, InvitationDecision::Accept).unwrap();
        assert_eq!(engine.buddies_of("alice").unwrap(), vec!["bob"]);
        assert_eq!(engine.buddies_of("bob").unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_messaging_requires_buddies() {
        let engine = engine();
        assert_matches!(
            engine.send_message("alice", "bob", "hi"),
            Err(BuddyError::NotBuddy { .. })
        );

        buddies(&engine, "alice", "bob");
        engine.send_message("alice", "bob", "hi").unwrap();
        engine.send_message("alice", "bob", "are you free?").unwrap();
        assert_matches!(engine.send_message("alice", "bob", "  "), Err(BuddyError::EmptyBody));

        assert_eq!(
            engine.chat_overview("bob").unwrap(),
            vec![ChatSummary { buddy: "alice".to_string(), unread: 2 }]
        );

        let conversation = engine.open_conversation("bob", "alice").unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(engine.unread_count("bob", "alice").unwrap(), 0);

        // second open changes nothing
        engine.open_conversation("bob", "alice").unwrap();
        assert_eq!(engine.unread_count("bob", "alice").unwrap(), 0);
        assert_eq!(engine.mark_read("bob", "alice").unwrap(), 0);
    }

    #[test]
    fn test_conversation_view_leaves_unread() {
        let engine = engine();
        buddies(&engine, "carol", "emma");
        engine.send_message("emma", "carol", "notes are up").unwrap();
        engine.send_message("carol", "emma", "thanks").unwrap();

        let view = engine.conversation("carol", "emma").unwrap();
        let bodies: Vec<_> = view.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["notes are up", "thanks"]);
        assert_eq!(engine.unread_count("carol", "emma").unwrap(), 1);
        assert!(view.iter().all(|m| !m.read));

        assert_matches!(engine.conversation("carol", "mallory"), Err(BuddyError::NotFound(_)));
    }

    #[test]
    fn test_unread_count_checks_both_users() {
        let engine = engine();
        assert_matches!(engine.unread_count("alice", "mallory"), Err(BuddyError::NotFound(_)));
        assert_matches!(engine.unread_count("mallory", "alice"), Err(BuddyError::NotFound(_)));
        assert_eq!(engine.unread_count("alice", "bob").unwrap(), 0);
    }

    #[test]
    fn test_concurrent_sends_get_unique_ids() {
        let engine = Arc::new(engine());
        buddies(&engine, "alice", "bob");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let (from, to) = if t % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
                    (0..50)
                        .map(|i| engine.send_message(from, to, &format!("{}-{}", t, i)).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(ids.iter().max(), Some(&400));
        assert_eq!(engine.conversation("alice", "bob").unwrap().len(), 400);

        let saved = engine.store().load().unwrap();
        assert_eq!(saved.messages.len(), 400);
    }

    #[test]
    fn test_session_lifecycle_through_engine() {
        let engine = engine();
        assert_matches!(
            engine.schedule_session("alice", "david", plan((2026, 11, 3))),
            Err(BuddyError::NotBuddy { .. })
        );

        buddies(&engine, "alice", "david");
        let later = engine.schedule_session("alice", "david", plan((2026, 11, 10))).unwrap();
        let sooner = engine.schedule_session("david", "alice", plan((2026, 11, 3))).unwrap();

        let upcoming: Vec<_> = engine
            .upcoming_sessions("alice")
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(upcoming, vec![sooner.id, later.id]);

        assert_matches!(
            engine.complete_session("carol", sooner.id),
            Err(BuddyError::NotParticipant { .. })
        );
        engine.complete_session("david", sooner.id).unwrap();
        assert_matches!(
            engine.cancel_session("alice", sooner.id),
            Err(BuddyError::InvalidTransition(_))
        );
        engine.cancel_session("alice", later.id).unwrap();

        assert!(engine.upcoming_sessions("alice").unwrap().is_empty());
        assert_eq!(engine.completed_sessions("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_feedback_and_dashboard() {
        let engine = engine();
        buddies(&engine, "alice", "bob");
        buddies(&engine, "david", "alice");
        engine.invite("alice", "emma").unwrap();

        let session = engine.schedule_session("alice", "bob", plan((2026, 11, 3))).unwrap();
        assert_matches!(
            engine.submit_feedback("alice", session.id, form(5, WouldStudyAgain::Yes)),
            Err(BuddyError::SessionNotCompleted(_))
        );

        engine.complete_session("bob", session.id).unwrap();
        assert_eq!(engine.pending_feedback("alice").unwrap().len(), 1);

        engine
            .submit_feedback("alice", session.id, form(5, WouldStudyAgain::Yes))
            .unwrap();
        assert_matches!(
            engine.submit_feedback("alice", session.id, form(1, WouldStudyAgain::No)),
            Err(BuddyError::AlreadySubmitted { .. })
        );
        assert!(engine.pending_feedback("alice").unwrap().is_empty());
        assert_eq!(engine.feedback_history("alice").unwrap().len(), 1);

        let metrics = engine.dashboard("alice").unwrap();
        assert_eq!(metrics.invitations_sent, 2);
        assert_eq!(metrics.invitations_received, 1);
        assert_eq!(metrics.connections, 1);
        assert_eq!(metrics.sessions_completed, 1);
        assert_eq!(metrics.performance.average_rating, Some(5.0));
        assert_eq!(metrics.performance.would_study_again_pct, Some(100.0));
        assert_eq!(
            metrics.partners,
            vec![
                PartnerSummary { username: "bob".to_string(), completed_sessions: 1 },
                PartnerSummary { username: "david".to_string(), completed_sessions: 0 },
            ]
        );

        let bob = engine.dashboard("bob").unwrap();
        assert_eq!(bob.performance.average_rating, None);
    }

    #[test]
    fn test_failed_save_keeps_mutation() {
        let engine = RelationshipEngine::with_data(seed_data(), MemoryBlobStore::failing());

        assert_matches!(engine.invite("alice", "bob"), Err(BuddyError::StoreUnavailable(_)));
        let received = engine.invitations_received("bob").unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].status, InvitationStatus::Pending);
    }

    #[test]
    fn test_validation_failure_leaves_state_untouched() {
        let engine = engine();
        engine.invite("alice", "bob").unwrap();
        assert_matches!(
            engine.invite("alice", "bob"),
            Err(BuddyError::DuplicateInvitation { .. })
        );
        assert_eq!(engine.snapshot().invitations.len(), 1);
    }
}
