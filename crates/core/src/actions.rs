use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Role;

/// Role change a viewer may request for another member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberAction {
    /// Promote a member to moderator.
    PromoteToMod,
    /// Demote a moderator back to member.
    DemoteToMember,
    Ban,
    Unban,
}

impl MemberAction {
    pub const ALL: [MemberAction; 4] = [
        MemberAction::PromoteToMod,
        MemberAction::DemoteToMember,
        MemberAction::Ban,
        MemberAction::Unban,
    ];

    /// Path segment of the backend endpoint serving this action.
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            Self::PromoteToMod => "mod",
            Self::DemoteToMember => "unmod",
            Self::Ban => "ban",
            Self::Unban => "unban",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PromoteToMod => "Make moderator",
            Self::DemoteToMember => "Remove moderator",
            Self::Ban => "Ban",
            Self::Unban => "Unban",
        }
    }
}

impl fmt::Display for MemberAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PromoteToMod => "promote-to-mod",
            Self::DemoteToMember => "demote-to-member",
            Self::Ban => "ban",
            Self::Unban => "unban",
        };
        formatter.write_str(name)
    }
}

struct MatrixRule {
    viewers: &'static [Role],
    targets: &'static [Role],
    actions: &'static [MemberAction],
    /// An exclusive rule replaces every other matching rule.
    exclusive: bool,
}

// Every matching rule contributes its actions, unless an exclusive one matches.
const ACTION_MATRIX: &[MatrixRule] = &[
    MatrixRule {
        viewers: &[Role::Owner],
        targets: &[Role::Mod],
        actions: &[MemberAction::DemoteToMember],
        exclusive: true,
    },
    MatrixRule {
        viewers: &[Role::Owner],
        targets: &[Role::Member],
        actions: &[MemberAction::PromoteToMod],
        exclusive: false,
    },
    MatrixRule {
        viewers: &[Role::Owner],
        targets: &[Role::Banned],
        actions: &[MemberAction::Unban],
        exclusive: false,
    },
    MatrixRule {
        viewers: &[Role::Owner, Role::Mod],
        targets: &[Role::Member, Role::Mod],
        actions: &[MemberAction::Ban],
        exclusive: false,
    },
    MatrixRule {
        viewers: &[Role::Owner, Role::Mod],
        targets: &[Role::Banned],
        actions: &[MemberAction::Unban],
        exclusive: false,
    },
];

/// Actions `viewer` may request against a member holding `target`, in matrix order.
///
/// The owner row and the viewer's own row never carry actions.
pub fn allowed_actions(viewer: Role, target: Role, is_self: bool) -> Vec<MemberAction> {
    if is_self || target == Role::Owner {
        return Vec::new();
    }

    let matching = ACTION_MATRIX
        .iter()
        .filter(|rule| rule.viewers.contains(&viewer) && rule.targets.contains(&target));
    if let Some(rule) = matching.clone().find(|rule| rule.exclusive) {
        return rule.actions.to_vec();
    }

    let mut actions = Vec::new();
    for action in matching.flat_map(|rule| rule.actions.iter().copied()) {
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    actions
}

pub fn is_allowed(viewer: Role, target: Role, is_self: bool, action: MemberAction) -> bool {
    allowed_actions(viewer, target, is_self).contains(&action)
}
