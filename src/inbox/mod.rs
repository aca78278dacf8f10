//! Client-side reconciliation: merges optimistic local sends, server
//! confirmations, and pushed counterpart messages into one de-duplicated,
//! chronologically ordered timeline per conversation, plus a recency-ordered
//! conversation stack with unread counts.
//!
//! The container is transport-free and single-threaded by design: the caller
//! feeds it whichever input arrives first (HTTP response, socket frame, page
//! fetch) and each call runs to completion, so interleavings that race on the
//! wire are harmless here.

use std::collections::HashMap;

use uuid::Uuid;

use crate::event::model::Notification;
use crate::message::model::MessageDto;
use crate::user::Sub;

pub mod model;

use model::{Conversation, Entry, EntryStatus};

pub struct Inbox {
    me: Sub,
    open: Option<Sub>,
    timelines: HashMap<Sub, Vec<Entry>>,
    conversations: Vec<Conversation>,
}

impl Inbox {
    pub fn new(me: Sub) -> Self {
        Self {
            me,
            open: None,
            timelines: HashMap::new(),
            conversations: Vec::new(),
        }
    }

    pub fn me(&self) -> &Sub {
        &self.me
    }

    pub fn open(&self) -> Option<&Sub> {
        self.open.as_ref()
    }

    /// Conversation stack, most recently active first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Timeline of one conversation, chronologically ascending.
    pub fn timeline(&self, counterpart: &Sub) -> &[Entry] {
        self.timelines.get(counterpart).map_or(&[], Vec::as_slice)
    }
}

impl Inbox {
    /// Opens a conversation and clears its unread count.
    pub fn open_conversation(&mut self, counterpart: &Sub) {
        self.open = Some(counterpart.to_owned());
        self.timelines.entry(counterpart.to_owned()).or_default();

        if let Some(c) = self.conversation_mut(counterpart) {
            c.unread = 0;
        }
    }

    /// Synthesizes a zero-message conversation entry, as the user-search flow
    /// does before the first message is sent.
    pub fn start_conversation(&mut self, counterpart: &Sub, now: i64) {
        self.timelines.entry(counterpart.to_owned()).or_default();

        if self.conversation_mut(counterpart).is_none() {
            self.conversations.push(Conversation {
                counterpart: counterpart.to_owned(),
                last_message: None,
                last_activity: now,
                unread: 0,
            });
            self.resort_conversations();
        }
    }

    /// Appends a pending placeholder for an outgoing message and returns the
    /// correlation token that later matches it against the confirmation.
    pub fn begin_send(&mut self, recipient: &Sub, text: &str, now: i64) -> String {
        let correlation = Uuid::new_v4().to_string();

        let entry = Entry::pending(
            correlation.clone(),
            self.me.clone(),
            recipient.to_owned(),
            text,
            now,
        );
        self.timelines
            .entry(recipient.to_owned())
            .or_default()
            .push(entry);

        self.bump_conversation(recipient, Some(text), now, false);

        correlation
    }

    /// Replaces the placeholder matched by token with the canonical record.
    /// Runs the same path whether the HTTP response or the socket "sent" push
    /// gets here first; whichever comes second is de-duplicated by id.
    pub fn confirm_send(&mut self, correlation: &str, dto: MessageDto) {
        let counterpart = self.counterpart_of(&dto);
        let timeline = self.timelines.entry(counterpart.clone()).or_default();

        let already_confirmed = timeline.iter().any(|e| e.id.as_ref() == Some(&dto.id));
        if already_confirmed {
            // the other leg of the race won; drop the placeholder if it is
            // still around
            timeline.retain(|e| {
                e.status != EntryStatus::Pending || e.correlation.as_deref() != Some(correlation)
            });
        } else if let Some(entry) = timeline
            .iter_mut()
            .find(|e| e.id.is_none() && e.correlation.as_deref() == Some(correlation))
        {
            *entry = Entry::confirmed(dto.clone(), Some(correlation.to_owned()));
        } else {
            // placeholder was never created (page reload between send and
            // confirm); treat as a fresh confirmed entry
            timeline.push(Entry::confirmed(dto.clone(), Some(correlation.to_owned())));
        }

        resort_timeline(timeline);
        self.bump_conversation(&counterpart, Some(&dto.text), dto.timestamp, false);
    }

    /// Marks the placeholder failed. The entry stays visible and
    /// distinguishable; a manual resend creates a new, distinct message.
    pub fn fail_send(&mut self, correlation: &str) {
        for timeline in self.timelines.values_mut() {
            for entry in timeline.iter_mut() {
                if entry.status == EntryStatus::Pending
                    && entry.correlation.as_deref() == Some(correlation)
                {
                    entry.status = EntryStatus::Failed;
                    return;
                }
            }
        }
    }

    /// Handles a counterpart's pushed message: merges it into the timeline if
    /// that conversation is loaded, and bumps the conversation entry, counting
    /// it unread unless the conversation is the open one.
    pub fn apply_delivered(&mut self, dto: MessageDto) {
        let counterpart = self.counterpart_of(&dto);

        if dto.sender == self.me {
            // own echo; merge without touching unread
            self.merge_confirmed(dto);
            return;
        }

        if let Some(timeline) = self.timelines.get_mut(&counterpart) {
            if !timeline.iter().any(|e| e.id.as_ref() == Some(&dto.id)) {
                timeline.push(Entry::confirmed(dto.clone(), None));
                resort_timeline(timeline);
            }
        }

        let count_unread = self.open.as_ref() != Some(&counterpart);
        self.bump_conversation(&counterpart, Some(&dto.text), dto.timestamp, count_unread);
    }

    /// Merges a fetched server page into the timeline rather than overwriting
    /// it: persisted entries de-duplicate by id, and local pending or failed
    /// placeholders survive the merge.
    pub fn merge_fetch(&mut self, counterpart: &Sub, page: Vec<MessageDto>) {
        let timeline = self.timelines.entry(counterpart.to_owned()).or_default();

        let mut newest: Option<(String, i64)> = None;
        for dto in page {
            if let Some((_, ts)) = &newest {
                if dto.timestamp > *ts {
                    newest = Some((dto.text.clone(), dto.timestamp));
                }
            } else {
                newest = Some((dto.text.clone(), dto.timestamp));
            }

            if !timeline.iter().any(|e| e.id.as_ref() == Some(&dto.id)) {
                timeline.push(Entry::confirmed(dto, None));
            }
        }
        resort_timeline(timeline);

        if let Some((text, ts)) = newest {
            self.bump_conversation(counterpart, Some(&text), ts, false);
        }
    }

    /// Routes a socket frame into the container.
    pub fn apply(&mut self, notification: Notification) {
        match notification {
            Notification::MessageDelivered { message } => self.apply_delivered(message),
            Notification::MessageSent {
                message,
                correlation,
            } => match correlation {
                Some(token) => self.confirm_send(&token, message),
                None => self.merge_confirmed(message),
            },
            // presence is rendered straight off the conversation list; nothing
            // to reconcile here
            Notification::OnlineStatusChange(_) => {}
        }
    }
}

impl Inbox {
    fn counterpart_of(&self, dto: &MessageDto) -> Sub {
        if dto.sender == self.me {
            dto.recipient.clone()
        } else {
            dto.sender.clone()
        }
    }

    fn merge_confirmed(&mut self, dto: MessageDto) {
        let counterpart = self.counterpart_of(&dto);
        let timeline = self.timelines.entry(counterpart.clone()).or_default();

        if !timeline.iter().any(|e| e.id.as_ref() == Some(&dto.id)) {
            timeline.push(Entry::confirmed(dto.clone(), None));
            resort_timeline(timeline);
        }

        self.bump_conversation(&counterpart, Some(&dto.text), dto.timestamp, false);
    }

    fn conversation_mut(&mut self, counterpart: &Sub) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| &c.counterpart == counterpart)
    }

    /// Creates or refreshes the conversation entry, then restores the
    /// recency order. Older timestamps never roll `last_activity` back.
    fn bump_conversation(&mut self, counterpart: &Sub, text: Option<&str>, at: i64, unread: bool) {
        match self.conversation_mut(counterpart) {
            Some(c) => {
                if at >= c.last_activity {
                    c.last_activity = at;
                    if let Some(text) = text {
                        c.last_message = Some(text.to_owned());
                    }
                }
                if unread {
                    c.unread += 1;
                }
            }
            None => self.conversations.push(Conversation {
                counterpart: counterpart.to_owned(),
                last_message: text.map(str::to_owned),
                last_activity: at,
                unread: u32::from(unread),
            }),
        }

        self.resort_conversations();
    }

    fn resort_conversations(&mut self) {
        // stable: equal timestamps retain their relative order
        self.conversations
            .sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    }
}

fn resort_timeline(timeline: &mut [Entry]) {
    // stable: arrival order breaks timestamp ties
    timeline.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

#[cfg(test)]
mod tests {
    use crate::message;
    use crate::message::model::Kind;

    use super::*;

    fn sub(s: &str) -> Sub {
        Sub(s.to_owned())
    }

    fn dto(from: &str, to: &str, text: &str, at: i64) -> MessageDto {
        MessageDto {
            id: message::Id::random(),
            sender: sub(from),
            recipient: sub(to),
            text: text.to_owned(),
            kind: Kind::Text,
            timestamp: at,
            seen: false,
        }
    }

    fn inbox() -> Inbox {
        Inbox::new(sub("me"))
    }

    #[test]
    fn begin_send_appends_pending_placeholder() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));

        let token = inbox.begin_send(&sub("ada"), "hi", 100);

        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].status, EntryStatus::Pending);
        assert_eq!(timeline[0].correlation.as_deref(), Some(token.as_str()));
        assert!(timeline[0].id.is_none());
        assert_eq!(inbox.conversations()[0].last_message.as_deref(), Some("hi"));
    }

    #[test]
    fn confirmation_replaces_placeholder_without_duplicates() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));
        let token = inbox.begin_send(&sub("ada"), "hi", 100);

        inbox.confirm_send(&token, dto("me", "ada", "hi", 103));

        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].status, EntryStatus::Confirmed);
        assert!(timeline[0].id.is_some());
        assert_eq!(timeline[0].timestamp, 103);
    }

    #[test]
    fn sent_push_and_http_response_race_yields_one_entry() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));
        let token = inbox.begin_send(&sub("ada"), "hi", 100);

        let canonical = dto("me", "ada", "hi", 103);

        // socket confirmation wins the race...
        inbox.apply(Notification::MessageSent {
            message: canonical.clone(),
            correlation: Some(token.clone()),
        });
        // ...then the HTTP response lands with the same canonical record
        inbox.confirm_send(&token, canonical);

        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].status, EntryStatus::Confirmed);
    }

    #[test]
    fn failed_send_is_retained_and_distinguishable() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));
        let token = inbox.begin_send(&sub("ada"), "hi", 100);

        inbox.fail_send(&token);

        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].status, EntryStatus::Failed);

        // manual resend is a new, distinct message
        let token2 = inbox.begin_send(&sub("ada"), "hi", 110);
        assert_ne!(token, token2);
        assert_eq!(inbox.timeline(&sub("ada")).len(), 2);
    }

    #[test]
    fn delivered_to_closed_conversation_counts_unread() {
        let mut inbox = inbox();

        inbox.apply_delivered(dto("ada", "me", "one", 100));
        inbox.apply_delivered(dto("ada", "me", "two", 105));

        let conversations = inbox.conversations();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread, 2);
        assert_eq!(conversations[0].last_message.as_deref(), Some("two"));

        inbox.open_conversation(&sub("ada"));
        assert_eq!(inbox.conversations()[0].unread, 0);
    }

    #[test]
    fn delivered_to_open_conversation_stays_read_and_lands_in_timeline() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));

        inbox.apply_delivered(dto("ada", "me", "hello", 100));

        assert_eq!(inbox.conversations()[0].unread, 0);
        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].text, "hello");
    }

    #[test]
    fn conversation_stack_resorts_on_new_activity() {
        let mut inbox = inbox();
        inbox.apply_delivered(dto("a", "me", "t1", 1));
        inbox.apply_delivered(dto("b", "me", "t2", 2));
        inbox.apply_delivered(dto("c", "me", "t3", 3));

        // bump the oldest conversation past the newest
        inbox.apply_delivered(dto("a", "me", "t4", 4));

        let order: Vec<_> = inbox
            .conversations()
            .iter()
            .map(|c| c.counterpart.as_str())
            .collect();
        assert_eq!(order, ["a", "c", "b"]);
    }

    #[test]
    fn equal_timestamps_keep_relative_order() {
        let mut inbox = inbox();
        inbox.apply_delivered(dto("a", "me", "x", 5));
        inbox.apply_delivered(dto("b", "me", "y", 5));

        let order: Vec<_> = inbox
            .conversations()
            .iter()
            .map(|c| c.counterpart.as_str())
            .collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn fetch_then_delivered_does_not_duplicate() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));

        let pushed = dto("ada", "me", "hello", 100);
        inbox.merge_fetch(&sub("ada"), vec![pushed.clone()]);
        inbox.apply_delivered(pushed);

        assert_eq!(inbox.timeline(&sub("ada")).len(), 1);
    }

    #[test]
    fn delivered_then_fetch_does_not_duplicate() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));

        let pushed = dto("ada", "me", "hello", 100);
        inbox.apply_delivered(pushed.clone());
        inbox.merge_fetch(&sub("ada"), vec![pushed]);

        assert_eq!(inbox.timeline(&sub("ada")).len(), 1);
    }

    #[test]
    fn fetch_merges_around_local_placeholders() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));
        let token = inbox.begin_send(&sub("ada"), "pending one", 200);
        inbox.fail_send(&token);
        let _pending = inbox.begin_send(&sub("ada"), "pending two", 210);

        inbox.merge_fetch(
            &sub("ada"),
            vec![
                dto("ada", "me", "from server", 100),
                dto("me", "ada", "mine persisted", 150),
            ],
        );

        let timeline = inbox.timeline(&sub("ada"));
        assert_eq!(timeline.len(), 4);
        let texts: Vec<_> = timeline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            ["from server", "mine persisted", "pending one", "pending two"]
        );
        assert_eq!(timeline[2].status, EntryStatus::Failed);
        assert_eq!(timeline[3].status, EntryStatus::Pending);
    }

    #[test]
    fn timeline_orders_by_timestamp_not_arrival() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("ada"));

        inbox.apply_delivered(dto("ada", "me", "second", 200));
        inbox.apply_delivered(dto("ada", "me", "first", 100));

        let texts: Vec<_> = inbox
            .timeline(&sub("ada"))
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[test]
    fn start_conversation_synthesizes_empty_entry() {
        let mut inbox = inbox();

        inbox.start_conversation(&sub("new-seller"), 500);

        let conversations = inbox.conversations();
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].last_message.is_none());
        assert_eq!(conversations[0].unread, 0);
        assert!(inbox.timeline(&sub("new-seller")).is_empty());

        // starting it again is a no-op
        inbox.start_conversation(&sub("new-seller"), 600);
        assert_eq!(inbox.conversations().len(), 1);
    }

    #[test]
    fn example_scenario_hello_then_hi_back() {
        let mut inbox = inbox();
        inbox.open_conversation(&sub("b"));

        let token = inbox.begin_send(&sub("b"), "Hello", 99);
        inbox.confirm_send(&token, dto("me", "b", "Hello", 100));
        inbox.apply_delivered(dto("b", "me", "Hi back", 105));

        let texts: Vec<_> = inbox
            .timeline(&sub("b"))
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(texts, ["Hello", "Hi back"]);
        assert_eq!(
            inbox.conversations()[0].last_message.as_deref(),
            Some("Hi back")
        );
        assert_eq!(inbox.conversations()[0].last_activity, 105);
    }
}
