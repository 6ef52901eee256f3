//! Line-oriented terminal rendering of every engine surface.

use std::sync::{Mutex, PoisonError};

use salon_core::{MessageId, MessageTone, MessageView, RoomListView, RoomStateView};
use salon_sync::{
    AccessLost, DirectorySurface, MessageSurface, Navigator, RoomStateSurface, ScrollMetrics,
    TypingSurface,
};
use tokio::sync::Notify;

/// Prints to stdout. Polled views are only reprinted when they changed.
#[derive(Default)]
pub struct ConsoleView {
    newest_row: Mutex<Option<MessageId>>,
    typing: Mutex<Option<String>>,
    rooms: Mutex<Option<RoomListView>>,
    room_state: Mutex<Option<RoomStateView>>,
    left_room: Notify,
}

impl ConsoleView {
    /// Resolves once the navigator left the room.
    pub async fn left_room(&self) {
        self.left_room.notified().await;
    }

    fn print_row(prefix: &str, row: &MessageView) {
        let sent_at = row.sent_at.as_deref().unwrap_or("");
        let marker = if row.deletable { " *" } else { "" };
        match (&row.author, row.tone) {
            (_, MessageTone::System) => println!("{prefix}#{} -- {}", row.id, row.text),
            (Some(author), MessageTone::Own) => {
                println!("{prefix}#{} [{sent_at}] {author} (you): {}{marker}", row.id, row.text)
            }
            (Some(author), _) => {
                println!("{prefix}#{} [{sent_at}] {author}: {}{marker}", row.id, row.text)
            }
            (None, _) => println!("{prefix}#{} {}", row.id, row.text),
        }
    }

    /// Stores `next` and reports whether it differs from the previous value.
    fn changed<T: PartialEq + Clone>(slot: &Mutex<Option<T>>, next: &T) -> bool {
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref() == Some(next) {
            return false;
        }
        *current = Some(next.clone());
        true
    }
}

impl MessageSurface for ConsoleView {
    // Stdout cannot insert above printed lines; a row older than the newest one is marked.
    fn insert_message(&self, _after: Option<MessageId>, row: &MessageView) {
        let mut newest = self.newest_row.lock().unwrap_or_else(PoisonError::into_inner);
        let prefix = if newest.is_some_and(|newest| row.id < newest) {
            "^ "
        } else {
            ""
        };
        Self::print_row(prefix, row);
        *newest = (*newest).max(Some(row.id));
    }

    fn replace_message(&self, row: &MessageView) {
        Self::print_row("~ ", row);
    }

    // A terminal always shows its last line.
    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::default()
    }

    fn scroll_to_bottom(&self) {}

    fn clear_input(&self) {}
}

impl TypingSurface for ConsoleView {
    fn show_typing(&self, line: Option<&str>) {
        let line = line.map(str::to_string);
        let mut current = self.typing.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == line {
            return;
        }
        if let Some(text) = &line {
            println!("  ({text})");
        }
        *current = line;
    }
}

impl DirectorySurface for ConsoleView {
    fn show_rooms(&self, view: &RoomListView) {
        if !Self::changed(&self.rooms, view) {
            return;
        }

        match view {
            RoomListView::Empty { placeholder } => println!("{placeholder}"),
            RoomListView::Rooms(rooms) => {
                println!("rooms:");
                for room in rooms {
                    let lock = if room.locked { " [locked]" } else { "" };
                    println!(
                        "  {} {}{lock} by {} <{}>",
                        room.id, room.name, room.created_by, room.href
                    );
                    println!("      {}", room.preview.text());
                }
            }
        }
    }
}

impl RoomStateSurface for ConsoleView {
    fn show_room_state(&self, view: &RoomStateView) {
        if !Self::changed(&self.room_state, view) {
            return;
        }

        if let Some(name) = &view.room_name {
            println!("== {name} ==");
        }
        if let Some(role) = view.role_label {
            println!("your role: {role}");
        }
        for group in &view.groups {
            println!("{}:", group.title);
            for row in &group.members {
                let actions = row
                    .actions
                    .iter()
                    .map(|action| format!("/{} {}", command_name(*action), row.username))
                    .collect::<Vec<_>>()
                    .join(", ");
                let muted = if row.muted { " (banned)" } else { "" };
                if actions.is_empty() {
                    println!("  {}{muted}", row.username);
                } else {
                    println!("  {}{muted}  [{actions}]", row.username);
                }
            }
        }
    }
}

impl Navigator for ConsoleView {
    fn navigate_away(&self, event: &AccessLost) {
        println!(
            "you no longer have access to room {}; continue at {}",
            event.room, event.redirect_to
        );
        self.left_room.notify_one();
    }
}

fn command_name(action: salon_core::MemberAction) -> &'static str {
    use salon_core::MemberAction;

    match action {
        MemberAction::PromoteToMod => "promote",
        MemberAction::DemoteToMember => "demote",
        MemberAction::Ban => "ban",
        MemberAction::Unban => "unban",
    }
}
