//! Writes against environments, rooms, members, sensors and devices.
//!
//! Nothing here touches cached pages. Once the API accepts a write the app
//! replaces its stores, so every list and lookup is served fresh.

use crate::api_client::{ApiClientError, RestClient};
use crate::nav::{EnvTab, Route, RoomTab};
use airsense_core::{EntityId, EnvironmentRole};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Managing environment {env} needs the owner or admin role")]
    NotManager { env: EntityId },
    #[error("Your role in environment {env} is not known yet; reload and retry")]
    UnknownRole { env: EntityId },
    #[error("The environment owner cannot be changed or removed")]
    OwnerProtected,
}

/// One write the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateEnvironment { name: String },
    CreateRoom { env: EntityId, name: String },
    RenameRoom { env: EntityId, room: EntityId, name: String },
    RemoveRoom { env: EntityId, room: EntityId },
    AddMember { env: EntityId, email: String },
    ChangeMemberRole { env: EntityId, member: EntityId, role: EnvironmentRole },
    RemoveMember { env: EntityId, member: EntityId },
    AddSensor { env: EntityId, room: EntityId, serial_number: String },
    RemoveSensor { env: EntityId, room: EntityId, sensor: EntityId },
    AddDevice { env: EntityId, room: EntityId, serial_number: String },
    RemoveDevice { env: EntityId, room: EntityId, device: EntityId },
}

impl Mutation {
    /// Environment whose role gates this write. Creating an environment is
    /// open to every signed-in user.
    pub fn environment(&self) -> Option<EntityId> {
        match *self {
            Mutation::CreateEnvironment { .. } => None,
            Mutation::CreateRoom { env, .. }
            | Mutation::RenameRoom { env, .. }
            | Mutation::RemoveRoom { env, .. }
            | Mutation::AddMember { env, .. }
            | Mutation::ChangeMemberRole { env, .. }
            | Mutation::RemoveMember { env, .. }
            | Mutation::AddSensor { env, .. }
            | Mutation::RemoveSensor { env, .. }
            | Mutation::AddDevice { env, .. }
            | Mutation::RemoveDevice { env, .. } => Some(env),
        }
    }

    /// Whether this write deletes something.
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Mutation::RemoveRoom { .. }
                | Mutation::RemoveMember { .. }
                | Mutation::RemoveSensor { .. }
                | Mutation::RemoveDevice { .. }
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Mutation::CreateEnvironment { name } => format!("Create environment \"{}\"", name),
            Mutation::CreateRoom { name, .. } => format!("Create room \"{}\"", name),
            Mutation::RenameRoom { room, name, .. } => format!("Rename room {} to \"{}\"", room, name),
            Mutation::RemoveRoom { room, .. } => format!("Remove room {}", room),
            Mutation::AddMember { email, .. } => format!("Invite {}", email),
            Mutation::ChangeMemberRole { member, role, .. } => {
                format!("Make member {} {}", member, role)
            }
            Mutation::RemoveMember { member, .. } => format!("Remove member {}", member),
            Mutation::AddSensor { serial_number, .. } => format!("Add sensor {}", serial_number),
            Mutation::RemoveSensor { sensor, .. } => format!("Remove sensor {}", sensor),
            Mutation::AddDevice { serial_number, .. } => format!("Add device {}", serial_number),
            Mutation::RemoveDevice { device, .. } => format!("Remove device {}", device),
        }
    }

    /// Where to continue once the write is accepted. Removing the entity on
    /// screen moves up to the list that held it.
    pub fn landing(&self, current: Route) -> Route {
        let params = current.params();
        match *self {
            Mutation::RemoveRoom { env, room } if params.room == Some(room) => Route::Environment {
                env,
                tab: Some(EnvTab::Rooms),
            },
            Mutation::RemoveSensor { env, room, sensor } if params.sensor == Some(sensor) => {
                Route::Room {
                    env,
                    room,
                    tab: Some(RoomTab::Sensors),
                }
            }
            Mutation::RemoveDevice { env, room, device } if params.device == Some(device) => {
                Route::Room {
                    env,
                    room,
                    tab: Some(RoomTab::Devices),
                }
            }
            _ => current,
        }
    }

    pub async fn send(&self, client: &RestClient) -> Result<(), ApiClientError> {
        info!(mutation = %self.describe(), "Sending write");
        match self {
            Mutation::CreateEnvironment { name } => client.create_environment(name).await.map(drop),
            Mutation::CreateRoom { env, name } => client.create_room(*env, name).await.map(drop),
            Mutation::RenameRoom { env, room, name } => client.rename_room(*env, *room, name).await,
            Mutation::RemoveRoom { env, room } => client.remove_room(*env, *room).await,
            Mutation::AddMember { env, email } => client.add_member(*env, email).await,
            Mutation::ChangeMemberRole { env, member, role } => {
                client.change_member_role(*env, *member, *role).await
            }
            Mutation::RemoveMember { env, member } => client.remove_member(*env, *member).await,
            Mutation::AddSensor {
                room,
                serial_number,
                ..
            } => client.add_sensor(*room, serial_number).await,
            Mutation::RemoveSensor { room, sensor, .. } => client.remove_sensor(*room, *sensor).await,
            Mutation::AddDevice {
                room,
                serial_number,
                ..
            } => client.add_device(*room, serial_number).await,
            Mutation::RemoveDevice { room, device, .. } => client.remove_device(*room, *device).await,
        }
    }
}

/// Check `mutation` against the user's role in its environment.
pub fn authorize(mutation: &Mutation, role: Option<EnvironmentRole>) -> Result<(), PermissionError> {
    match mutation.environment() {
        Some(env) => require_manager(env, role),
        None => Ok(()),
    }
}

/// Owners and admins manage an environment; nobody else does.
pub fn require_manager(env: EntityId, role: Option<EnvironmentRole>) -> Result<(), PermissionError> {
    match role {
        Some(role) if role.can_manage() => Ok(()),
        Some(_) => Err(PermissionError::NotManager { env }),
        None => Err(PermissionError::UnknownRole { env }),
    }
}

/// Role a member moves to on a role change. Owners keep theirs.
pub fn toggled_role(role: EnvironmentRole) -> Result<EnvironmentRole, PermissionError> {
    match role {
        EnvironmentRole::User => Ok(EnvironmentRole::Admin),
        EnvironmentRole::Admin => Ok(EnvironmentRole::User),
        EnvironmentRole::Owner => Err(PermissionError::OwnerProtected),
    }
}

// ============================================================================
// PROMPT
// ============================================================================

/// Write that still needs one line of text from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    NewEnvironment,
    NewRoom { env: EntityId },
    RenameRoom { env: EntityId, room: EntityId },
    InviteMember { env: EntityId },
    AddSensor { env: EntityId, room: EntityId },
    AddDevice { env: EntityId, room: EntityId },
}

impl PromptKind {
    pub fn environment(&self) -> Option<EntityId> {
        match *self {
            PromptKind::NewEnvironment => None,
            PromptKind::NewRoom { env }
            | PromptKind::RenameRoom { env, .. }
            | PromptKind::InviteMember { env }
            | PromptKind::AddSensor { env, .. }
            | PromptKind::AddDevice { env, .. } => Some(env),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::NewEnvironment => "New environment name",
            PromptKind::NewRoom { .. } => "New room name",
            PromptKind::RenameRoom { .. } => "Room name",
            PromptKind::InviteMember { .. } => "Email to invite",
            PromptKind::AddSensor { .. } => "Sensor serial number",
            PromptKind::AddDevice { .. } => "Device serial number",
        }
    }

    /// Validate `input` and turn it into a write.
    pub fn build(&self, input: &str) -> Result<Mutation, String> {
        let value = input.trim();
        if value.is_empty() {
            return Err(format!("{} must not be empty", self.title()));
        }
        let text = value.to_string();
        match *self {
            PromptKind::NewEnvironment => Ok(Mutation::CreateEnvironment { name: text }),
            PromptKind::NewRoom { env } => Ok(Mutation::CreateRoom { env, name: text }),
            PromptKind::RenameRoom { env, room } => Ok(Mutation::RenameRoom {
                env,
                room,
                name: text,
            }),
            PromptKind::InviteMember { env } => {
                validate_email(value)?;
                Ok(Mutation::AddMember { env, email: text })
            }
            PromptKind::AddSensor { env, room } => {
                validate_serial(value)?;
                Ok(Mutation::AddSensor {
                    env,
                    room,
                    serial_number: text,
                })
            }
            PromptKind::AddDevice { env, room } => {
                validate_serial(value)?;
                Ok(Mutation::AddDevice {
                    env,
                    room,
                    serial_number: text,
                })
            }
        }
    }
}

/// The address goes into a URL path segment, so reserved characters are out.
fn validate_email(email: &str) -> Result<(), String> {
    let reserved = |c: char| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%');
    match email.split_once('@') {
        Some((user, domain))
            if !user.is_empty() && domain.contains('.') && !email.contains(reserved) =>
        {
            Ok(())
        }
        _ => Err(format!("\"{}\" is not an email address", email)),
    }
}

fn validate_serial(serial: &str) -> Result<(), String> {
    if serial.contains(char::is_whitespace) {
        return Err("Serial numbers contain no spaces".to_string());
    }
    Ok(())
}

/// One-line text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }

    pub fn with_input(kind: PromptKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
        }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.input.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.input.pop();
    }

    pub fn submit(&self) -> Result<Mutation, String> {
        self.kind.build(&self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_rejected() {
        let prompt = Prompt::with_input(PromptKind::NewRoom { env: 2 }, "   ");
        assert!(prompt.submit().is_err());
    }

    #[test]
    fn test_input_is_trimmed() {
        let prompt = Prompt::with_input(PromptKind::NewRoom { env: 2 }, "  Kitchen ");
        assert_eq!(
            prompt.submit(),
            Ok(Mutation::CreateRoom {
                env: 2,
                name: "Kitchen".to_string()
            })
        );
    }

    #[test]
    fn test_email_validation() {
        let kind = PromptKind::InviteMember { env: 1 };
        assert!(kind.build("ann@example.org").is_ok());
        assert!(kind.build("ann.example.org").is_err());
        assert!(kind.build("@example.org").is_err());
        assert!(kind.build("ann@localhost").is_err());
        assert!(kind.build("ann/x@example.org").is_err());
    }

    #[test]
    fn test_serial_numbers_have_no_spaces() {
        let kind = PromptKind::AddSensor { env: 1, room: 4 };
        assert!(kind.build("SN-00042").is_ok());
        assert!(kind.build("SN 00042").is_err());
    }

    #[test]
    fn test_prompt_editing_ignores_control_chars() {
        let mut prompt = Prompt::new(PromptKind::NewEnvironment);
        for c in ['L', 'a', '\u{7}', 'b'] {
            prompt.push(c);
        }
        prompt.pop();
        assert_eq!(prompt.input, "La");
    }

    #[test]
    fn test_authorize_by_role() {
        let remove = Mutation::RemoveRoom { env: 3, room: 10 };
        assert_eq!(authorize(&remove, Some(EnvironmentRole::Owner)), Ok(()));
        assert_eq!(authorize(&remove, Some(EnvironmentRole::Admin)), Ok(()));
        assert_eq!(
            authorize(&remove, Some(EnvironmentRole::User)),
            Err(PermissionError::NotManager { env: 3 })
        );
        assert_eq!(
            authorize(&remove, None),
            Err(PermissionError::UnknownRole { env: 3 })
        );

        let create = Mutation::CreateEnvironment {
            name: "Lab".to_string(),
        };
        assert_eq!(authorize(&create, None), Ok(()));
    }

    #[test]
    fn test_role_toggle_protects_owner() {
        assert_eq!(toggled_role(EnvironmentRole::User), Ok(EnvironmentRole::Admin));
        assert_eq!(toggled_role(EnvironmentRole::Admin), Ok(EnvironmentRole::User));
        assert_eq!(
            toggled_role(EnvironmentRole::Owner),
            Err(PermissionError::OwnerProtected)
        );
    }

    #[test]
    fn test_removing_entity_on_screen_moves_up() {
        let on_sensor = Route::Sensor {
            env: 1,
            room: 4,
            sensor: 9,
        };
        let remove = Mutation::RemoveSensor {
            env: 1,
            room: 4,
            sensor: 9,
        };
        assert_eq!(
            remove.landing(on_sensor),
            Route::Room {
                env: 1,
                room: 4,
                tab: Some(RoomTab::Sensors)
            }
        );

        let other = Mutation::RemoveSensor {
            env: 1,
            room: 4,
            sensor: 8,
        };
        assert_eq!(other.landing(on_sensor), on_sensor);

        let settings = Route::Room {
            env: 1,
            room: 4,
            tab: Some(RoomTab::Settings),
        };
        assert_eq!(
            Mutation::RemoveRoom { env: 1, room: 4 }.landing(settings),
            Route::Environment {
                env: 1,
                tab: Some(EnvTab::Rooms)
            }
        );
    }

    #[test]
    fn test_only_removals_need_confirmation() {
        assert!(Mutation::RemoveMember { env: 1, member: 5 }.is_removal());
        assert!(!Mutation::AddMember {
            env: 1,
            email: "a@b.io".to_string()
        }
        .is_removal());
    }
}
