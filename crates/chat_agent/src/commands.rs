#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackTarget {
    /// Checkpoint id as stored.
    Id(String),
    /// 1-based position in the checkpoint list (`#n`).
    Ordinal(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Approve,
    Checkpoints,
    Rollback(Option<RollbackTarget>),
    Code,
    Models(Option<String>),
    Reset,
    Quit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or(trimmed).to_string();
    let argument = parts.next().map(str::to_string);

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/approve" => SlashCommand::Approve,
        "/checkpoints" => SlashCommand::Checkpoints,
        "/rollback" => SlashCommand::Rollback(argument.as_deref().map(parse_rollback_target)),
        "/code" => SlashCommand::Code,
        "/models" => SlashCommand::Models(argument),
        "/reset" => SlashCommand::Reset,
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

fn parse_rollback_target(argument: &str) -> RollbackTarget {
    match argument
        .strip_prefix('#')
        .and_then(|ordinal| ordinal.parse::<usize>().ok())
    {
        Some(ordinal) => RollbackTarget::Ordinal(ordinal),
        None => RollbackTarget::Id(argument.to_string()),
    }
}
