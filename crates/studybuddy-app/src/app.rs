//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the session
//! state completely decoupled from sockets and HTTP.
//!
//! This is a pure state machine: it consumes [`crate::Command`]s and
//! [`crate::AppEvent`]s and produces [`crate::AppAction`] instructions for
//! the runtime to execute.
//!
//! # Responsibilities
//!
//! - Tracks the viewer's groups, their threads, unread counters and the
//!   selected group.
//! - Normalizes sender labels before messages reach the store.
//! - Re-joins and back-fills the selected group every time the connection
//!   opens.
//! - Tracks course progress with local marks and server snapshots.
//! - Tracks high-level connection status for UI feedback.

use chrono::{DateTime, FixedOffset, Utc};
use studybuddy_core::clock;
use studybuddy_proto::{
    CourseId, GroupId, HistoricalMessage, LessonId, LessonProgressUpdate, MembershipChange,
    WireMessage,
};

use crate::{
    AppAction, AppEvent, ChatConfig, Command,
    chat::{ChatState, NewMessage},
    progress::ProgressTracker,
    selection::SelectionChange,
    sender::{OWN_SENDER_LABEL, Viewer},
    state::{ChatMessage, ConnectionStatus, Group},
};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Signed-in user.
    viewer: Viewer,
    /// Session tuning.
    config: ChatConfig,
    /// Offset for display timestamps, derived from `config`.
    offset: FixedOffset,
    /// Connection status.
    status: ConnectionStatus,
    /// Groups the viewer belongs to, in server order.
    groups: Vec<Group>,
    /// Messages, unread counters and selection.
    chat: ChatState,
    /// Course progress.
    progress: ProgressTracker,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App for `viewer`.
    pub fn new(viewer: Viewer, config: ChatConfig) -> Self {
        let offset = config.display_offset();
        Self {
            viewer,
            config,
            offset,
            status: ConnectionStatus::Offline,
            groups: Vec::new(),
            chat: ChatState::new(offset),
            progress: ProgressTracker::new(),
            status_message: None,
        }
    }

    /// Signed-in user.
    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Session tuning.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Connection status.
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Groups the viewer belongs to.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Group with `group_id`, if the viewer belongs to it.
    pub fn group(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == group_id)
    }

    /// Whether the viewer belongs to `group_id`.
    pub fn is_member(&self, group_id: &GroupId) -> bool {
        self.group(group_id).is_some()
    }

    /// Messages, unread counters and selection.
    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    /// Selected group.
    pub fn selected_group(&self) -> Option<&GroupId> {
        self.chat.selected()
    }

    /// Messages of the selected group.
    pub fn selected_messages(&self) -> &[ChatMessage] {
        self.chat.selected().map_or(&[], |g| self.chat.messages().messages(g))
    }

    /// Unread count for `group_id`.
    pub fn unread(&self, group_id: &GroupId) -> u32 {
        self.chat.unread().get(group_id)
    }

    /// Course progress.
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Current status message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Process a user intent. `now_millis` is the wall clock in Unix
    /// milliseconds.
    pub fn apply(&mut self, command: Command, now_millis: i64) -> Vec<AppAction> {
        match command {
            Command::Connect { token } => self.connect(token),
            Command::Disconnect => vec![AppAction::Disconnect, AppAction::Render],
            Command::RefreshGroups => vec![AppAction::FetchGroups],
            Command::SelectGroup(group_id) => self.select_group(group_id),
            Command::SendMessage { group_id, content } => {
                self.send_message(group_id, content, now_millis)
            },
            Command::MarkGroupAsRead(group_id) => self.mark_group_as_read(&group_id),
            Command::LoadProgress(course_id) => vec![AppAction::FetchProgress { course_id }],
            Command::MarkLessonComplete { course_id, lesson_id } => {
                self.mark_lesson_complete(course_id, lesson_id, now_millis)
            },
            Command::MarkLessonIncomplete { course_id, lesson_id } => {
                self.mark_lesson_incomplete(course_id, lesson_id)
            },
            Command::Quit => vec![AppAction::Quit],
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Connecting => {
                self.status = ConnectionStatus::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                self.status = ConnectionStatus::Online;
                self.status_message = None;

                // Rooms die with the socket; re-subscribe and back-fill.
                let mut actions = match self.chat.selected() {
                    Some(group_id) => vec![
                        AppAction::JoinGroup { group_id: group_id.clone() },
                        AppAction::FetchHistory { group_id: group_id.clone() },
                    ],
                    None => vec![],
                };
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::Reconnecting { attempt, delay } => {
                self.status = ConnectionStatus::Reconnecting { attempt, delay };
                vec![AppAction::Render]
            },
            AppEvent::Disconnected { exhausted, reason } => {
                self.status =
                    if exhausted { ConnectionStatus::GaveUp } else { ConnectionStatus::Offline };
                self.status_message = Some(reason);
                vec![AppAction::Render]
            },
            AppEvent::MessageReceived { message, received_at } => {
                self.ingest_push(message, received_at)
            },
            AppEvent::MemberJoined(change) => self.member_joined(change),
            AppEvent::MemberLeft(change) => self.member_left(change),
            AppEvent::GroupsLoaded { groups } => {
                self.groups = groups.into_iter().filter(|g| g.is_member).map(Group::from).collect();
                tracing::debug!(count = self.groups.len(), "groups loaded");
                let change = self.chat.reconcile(&self.groups);
                Self::selection_actions(change)
            },
            AppEvent::HistoryLoaded { group_id, messages, received_at } => {
                let page: Vec<ChatMessage> = messages
                    .into_iter()
                    .map(|message| self.history_entry(&group_id, message, received_at))
                    .collect();
                self.chat.load_messages(&group_id, page);
                vec![AppAction::Render]
            },
            AppEvent::ProgressLoaded { course_id, response } => {
                self.progress.apply_course_progress(course_id, response);
                vec![AppAction::Render]
            },
            AppEvent::LessonProgressSaved { course_id, record } => {
                if self.progress.apply_lesson_update(&course_id, record) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
            AppEvent::RequestFailed { request, message } => {
                tracing::warn!(?request, %message, "request failed");
                vec![]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Open the real-time connection and fetch the viewer's groups.
    pub fn connect(&mut self, token: String) -> Vec<AppAction> {
        vec![AppAction::Connect { token }, AppAction::FetchGroups, AppAction::Render]
    }

    /// Open a group's thread.
    ///
    /// Leaves the previous group's room, joins the new one and fetches its
    /// history. Groups the viewer does not belong to are refused.
    pub fn select_group(&mut self, group_id: GroupId) -> Vec<AppAction> {
        if !self.is_member(&group_id) {
            tracing::warn!(group = %group_id, "refusing to select group without membership");
            self.status_message = Some(format!("Not a member of group {group_id}"));
            return vec![AppAction::Render];
        }

        let change = self.chat.select_group(group_id);
        Self::selection_actions(change)
    }

    /// Send a message to `group_id`.
    ///
    /// Blank messages are ignored. With optimistic sends enabled the message
    /// is inserted locally first; otherwise the server echo inserts it.
    pub fn send_message(
        &mut self,
        group_id: GroupId,
        content: String,
        now_millis: i64,
    ) -> Vec<AppAction> {
        if content.trim().is_empty() {
            return vec![];
        }
        if !self.is_member(&group_id) {
            self.status_message = Some(format!("Not a member of group {group_id}"));
            return vec![AppAction::Render];
        }

        if self.config.optimistic_send {
            let local = NewMessage {
                group_id: group_id.clone(),
                content: content.clone(),
                sender: OWN_SENDER_LABEL.to_string(),
                id: None,
            };
            self.chat.send_message(local, now_millis);
        }

        vec![AppAction::SendMessage { group_id, content }, AppAction::Render]
    }

    /// Zero a group's unread counter.
    pub fn mark_group_as_read(&mut self, group_id: &GroupId) -> Vec<AppAction> {
        self.chat.mark_group_as_read(group_id);
        vec![AppAction::Render]
    }

    /// Mark a lesson completed locally and persist it.
    pub fn mark_lesson_complete(
        &mut self,
        course_id: CourseId,
        lesson_id: LessonId,
        now_millis: i64,
    ) -> Vec<AppAction> {
        let now = DateTime::<Utc>::from_timestamp_millis(now_millis).unwrap_or_default();
        self.progress.mark_lesson_complete(&course_id, &lesson_id, now);
        vec![
            AppAction::SaveLessonProgress {
                course_id,
                lesson_id,
                update: LessonProgressUpdate::completion(true),
            },
            AppAction::Render,
        ]
    }

    /// Mark a lesson not completed locally and persist it.
    pub fn mark_lesson_incomplete(
        &mut self,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Vec<AppAction> {
        self.progress.mark_lesson_incomplete(&course_id, &lesson_id);
        vec![
            AppAction::SaveLessonProgress {
                course_id,
                lesson_id,
                update: LessonProgressUpdate::completion(false),
            },
            AppAction::Render,
        ]
    }

    fn ingest_push(&mut self, message: WireMessage, received_at: i64) -> Vec<AppAction> {
        let group_id = message.group_id;
        let incoming = NewMessage {
            group_id: group_id.clone(),
            content: message.content,
            sender: self.viewer.label_for_push(&message.sender),
            id: Some(message.id),
        };

        let inserted = self.chat.receive_message(incoming, received_at);

        // The selected thread is on screen, so whatever just arrived is read.
        if self.chat.selected() == Some(&group_id) {
            self.chat.mark_group_as_read(&group_id);
        }

        if inserted { vec![AppAction::Render] } else { vec![] }
    }

    fn history_entry(
        &self,
        group_id: &GroupId,
        message: HistoricalMessage,
        received_at: i64,
    ) -> ChatMessage {
        let sender = self.viewer.label_for_history(&message);
        let timestamp = clock::parse_display_time(&message.timestamp, self.offset)
            .unwrap_or_else(|| clock::display_time(received_at, self.offset));

        ChatMessage {
            id: message.id,
            group_id: group_id.clone(),
            sender,
            content: message.content,
            timestamp,
        }
    }

    fn member_joined(&mut self, change: MembershipChange) -> Vec<AppAction> {
        let MembershipChange { group_id, data } = change;

        if data.user.id == self.viewer.id && !self.is_member(&group_id) {
            // Joined elsewhere (another tab or device); pick up the new group.
            return vec![AppAction::FetchGroups];
        }

        self.set_member_count(&group_id, data.member_count);
        vec![AppAction::Render]
    }

    fn member_left(&mut self, change: MembershipChange) -> Vec<AppAction> {
        let MembershipChange { group_id, data } = change;

        if data.user.id != self.viewer.id {
            self.set_member_count(&group_id, data.member_count);
            return vec![AppAction::Render];
        }

        self.groups.retain(|g| g.id != group_id);
        let change = self.chat.reconcile(&self.groups);
        Self::selection_actions(change)
    }

    fn set_member_count(&mut self, group_id: &GroupId, member_count: u32) {
        if let Some(group) = self.groups.iter_mut().find(|g| &g.id == group_id) {
            group.member_count = member_count;
        }
    }

    fn selection_actions(change: SelectionChange) -> Vec<AppAction> {
        let mut actions = Vec::new();
        match change {
            SelectionChange::Unchanged => {},
            SelectionChange::Moved { from, to } => {
                if let Some(from) = from {
                    actions.push(AppAction::LeaveGroup { group_id: from });
                }
                actions.push(AppAction::JoinGroup { group_id: to.clone() });
                actions.push(AppAction::FetchHistory { group_id: to });
            },
            SelectionChange::Cleared { from } => {
                actions.push(AppAction::LeaveGroup { group_id: from });
            },
        }
        actions.push(AppAction::Render);
        actions
    }
}
