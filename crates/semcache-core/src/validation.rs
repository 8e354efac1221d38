use crate::{Message, RawMessage, Role, ValidationError};

/// Check that untyped messages form a usable conversation.
///
/// Checks run in a fixed order across the whole conversation: non-empty,
/// every message has `role` and `content`, every role is recognized, and the
/// first role is `system` or `user`. The first failing check wins.
pub fn validate(messages: &[RawMessage]) -> Result<(), ValidationError> {
    parse_conversation(messages).map(|_| ())
}

/// Validate untyped messages and convert them into typed ones.
pub fn parse_conversation(messages: &[RawMessage]) -> Result<Vec<Message>, ValidationError> {
    if messages.is_empty() {
        return Err(ValidationError::EmptyConversation);
    }

    let mut fields = Vec::with_capacity(messages.len());
    for (index, raw) in messages.iter().enumerate() {
        let role = raw.role.as_deref().ok_or(ValidationError::MissingField {
            index,
            field: "role",
        })?;
        let content = raw.content.as_deref().ok_or(ValidationError::MissingField {
            index,
            field: "content",
        })?;
        fields.push((role, content));
    }

    let mut parsed = Vec::with_capacity(fields.len());
    for (index, (role, content)) in fields.into_iter().enumerate() {
        let role = Role::parse(role).ok_or_else(|| ValidationError::InvalidRole {
            index,
            role: role.to_string(),
        })?;
        parsed.push(Message::new(role, content));
    }

    validate_conversation(&parsed)?;
    Ok(parsed)
}

/// Validate an already-typed conversation. Roles and fields are guaranteed
/// by construction, so only emptiness and the opening role are checked.
pub fn validate_conversation(messages: &[Message]) -> Result<(), ValidationError> {
    let first = messages.first().ok_or(ValidationError::EmptyConversation)?;
    if !first.role().can_open_conversation() {
        return Err(ValidationError::InvalidFirstRole { role: first.role() });
    }
    Ok(())
}
