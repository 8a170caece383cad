use std::collections::BTreeSet;
use std::io::{self, Read, Write};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use taskboard_shared::{FilterMode, Intent, Priority};
use tracing::{debug, info, instrument};

use crate::board::Board;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::Storage;
use crate::render::Renderer;
use crate::task::{contains, is_blank, position_of};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "list",
        "toggle",
        "delete",
        "priority",
        "rename",
        "bulk",
        "move",
        "export",
        "apply",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(board, cfg, renderer, inv))]
pub fn dispatch<S: Storage>(
    board: &mut Board<S>,
    cfg: &Config,
    renderer: &Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(board, cfg, renderer, &inv, &mut out, io::stdin().lock(), Utc::now())?;

    if let Some(warning) = board.warning() {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// Runs one command against `board`, writing user-facing output to `out`.
/// `input` is only consumed by `apply`.
pub fn execute<S: Storage, W: Write, R: Read>(
    board: &mut Board<S>,
    cfg: &Config,
    renderer: &Renderer,
    inv: &Invocation,
    out: &mut W,
    input: R,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    let args = inv.command_args.as_slice();
    debug!(command, args = ?args, "dispatching command");

    match command {
        "add" => cmd_add(board, args, out, now),
        "list" => cmd_list(board, renderer, args, out),
        "toggle" => cmd_toggle(board, args, out),
        "delete" => cmd_delete(board, args, out),
        "priority" => cmd_priority(board, args, out),
        "rename" => cmd_rename(board, args, out),
        "bulk" => cmd_bulk(board, args, out, now),
        "move" => cmd_move(board, args, out),
        "export" => cmd_export(board, out),
        "apply" => cmd_apply(board, input, out, now),
        "_commands" => cmd_commands(out),
        "_show" => cmd_show(cfg, out),
        "help" => cmd_help(out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip(board, args, out, now))]
fn cmd_add<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command add");

    let text = args.join(" ");
    match board.add(&text, now) {
        Some(id) => writeln!(out, "Created task {id}.")?,
        None => writeln!(out, "Nothing to add.")?,
    }
    Ok(())
}

#[instrument(skip(board, renderer, args, out))]
fn cmd_list<S: Storage, W: Write>(
    board: &mut Board<S>,
    renderer: &Renderer,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command list");

    if let Some(raw) = args.first() {
        let mode = raw.parse::<FilterMode>()?;
        board.set_filter(mode);
    }
    renderer.write_board(&mut *out, &board.view())
}

#[instrument(skip(board, args, out))]
fn cmd_toggle<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command toggle");

    let id = existing_id(board, args.first(), "toggle")?;
    board.toggle(id);
    let done = board
        .tasks()
        .iter()
        .any(|task| task.id == id && task.completed);
    if done {
        writeln!(out, "Completed task {id}.")?;
    } else {
        writeln!(out, "Reopened task {id}.")?;
    }
    Ok(())
}

#[instrument(skip(board, args, out))]
fn cmd_delete<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command delete");

    let id = existing_id(board, args.first(), "delete")?;
    board.delete(id);
    writeln!(out, "Deleted task {id}.")?;
    Ok(())
}

#[instrument(skip(board, args, out))]
fn cmd_priority<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command priority");

    let id = existing_id(board, args.first(), "priority")?;
    let level = args
        .get(1)
        .ok_or_else(|| anyhow!("priority requires a level (low, medium, high)"))?;
    let priority = level.parse::<Priority>()?;

    board.set_priority(id, priority);
    writeln!(out, "Set task {id} priority to {priority}.")?;
    Ok(())
}

#[instrument(skip(board, args, out))]
fn cmd_rename<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command rename");

    let id = existing_id(board, args.first(), "rename")?;
    let text = args.get(1..).unwrap_or_default().join(" ");
    if is_blank(&text) {
        return Err(anyhow!("rename requires non-blank text"));
    }

    board.rename(id, &text);
    writeln!(out, "Renamed task {id}.")?;
    Ok(())
}

/// `bulk <delete|complete|uncomplete> <id...>`: selects the ids in
/// multi-select mode, then runs the bulk action over the selection.
#[instrument(skip(board, args, out, now))]
fn cmd_bulk<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command bulk");

    let action = args
        .first()
        .ok_or_else(|| anyhow!("bulk requires an action: delete, complete or uncomplete"))?;
    let intent = match action.as_str() {
        "delete" => Intent::BulkDelete,
        "complete" => Intent::BulkComplete,
        "uncomplete" => Intent::BulkUncomplete,
        other => return Err(anyhow!("unknown bulk action: {other}")),
    };

    let ids = args[1..]
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<anyhow::Result<BTreeSet<u64>>>()?;
    if ids.is_empty() {
        return Err(anyhow!("bulk {action} requires at least one task id"));
    }

    if !board.multi_select() {
        board.toggle_multi_select();
    }
    for id in &ids {
        board.toggle_select(*id);
    }
    let selected = board.selection().len();
    debug!(requested = ids.len(), selected, "selection built");

    let verb = match intent {
        Intent::BulkDelete => "Deleted",
        Intent::BulkComplete => "Completed",
        _ => "Reopened",
    };
    board.dispatch(intent, now);
    board.toggle_multi_select();

    if selected == 0 {
        writeln!(out, "No matching tasks.")?;
        return Ok(());
    }
    writeln!(out, "{verb} {selected} task(s).")?;
    Ok(())
}

/// Replays a full drag gesture: pick up `source`, hover `target`, drop.
#[instrument(skip(board, args, out))]
fn cmd_move<S: Storage, W: Write>(
    board: &mut Board<S>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command move");

    let source = existing_id(board, args.first(), "move")?;
    let target = existing_id(board, args.get(1), "move")?;
    if source == target {
        writeln!(out, "Nothing to move.")?;
        return Ok(());
    }

    board.set_editing(None);
    board.drag_start(source);
    board.drag_enter(target);
    board.drop_on(target);

    let position = position_of(board.tasks(), source).map_or(0, |idx| idx + 1);
    writeln!(out, "Moved task {source} to position {position}.")?;
    Ok(())
}

#[instrument(skip(board, out))]
fn cmd_export<S: Storage, W: Write>(board: &Board<S>, out: &mut W) -> anyhow::Result<()> {
    info!("command export");

    let serialized = serde_json::to_string(board.tasks())?;
    writeln!(out, "{serialized}")?;
    Ok(())
}

#[instrument(skip(board, input, out, now))]
fn cmd_apply<S: Storage, R: Read, W: Write>(
    board: &mut Board<S>,
    mut input: R,
    out: &mut W,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command apply");

    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .context("failed reading stdin")?;

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("apply: empty input"));
    }

    let intents: Vec<Intent> =
        serde_json::from_str(trimmed).context("apply: expected a JSON array of intents")?;
    debug!(count = intents.len(), "applying intents");
    for intent in intents {
        board.dispatch(intent, now);
    }

    let view = serde_json::to_string(&board.view())?;
    writeln!(out, "{view}")?;
    Ok(())
}

fn cmd_commands<W: Write>(out: &mut W) -> anyhow::Result<()> {
    for command in known_command_names() {
        writeln!(out, "{command}")?;
    }
    Ok(())
}

fn cmd_show<W: Write>(cfg: &Config, out: &mut W) -> anyhow::Result<()> {
    let mut entries: Vec<_> = cfg.iter().collect();
    entries.sort();
    for (k, v) in entries {
        writeln!(out, "{k}={v}")?;
    }
    Ok(())
}

fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "Commands: add <text>, list [all|completed|incomplete], toggle <id>, delete <id>, \
         priority <id> <low|medium|high>, rename <id> <text>, \
         bulk <delete|complete|uncomplete> <id...>, move <id> <target-id>, export, apply"
    )?;
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("invalid task id: {raw}"))
}

fn existing_id<S: Storage>(
    board: &Board<S>,
    raw: Option<&String>,
    command: &str,
) -> anyhow::Result<u64> {
    let raw = raw.ok_or_else(|| anyhow!("{command} requires a task id"))?;
    let id = parse_id(raw)?;
    if !contains(board.tasks(), id) {
        return Err(anyhow!("no task with id {id}"));
    }
    Ok(id)
}
