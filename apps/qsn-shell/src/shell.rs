use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre};

use qsn_service::Session;

#[derive(Debug, Parser)]
#[command(no_binary_name = true, rename_all = "kebab")]
pub struct Line {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
	/// Connect and download every note.
	Start,
	/// List note titles, pinned first, then most recent.
	List,
	/// Open the note at a position shown by `list`.
	Open { position: usize },
	/// Create an empty note and open it.
	New,
	/// Upload the mirror file of a note.
	Save { key: String },
	/// Trash a note.
	Delete { key: String },
	/// Show what the queue is doing.
	Status,
	Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Quit,
}

pub fn parse(line: &str) -> Result<Option<Command>> {
	let words = line.split_whitespace().collect::<Vec<_>>();

	if words.is_empty() {
		return Ok(None);
	}

	let parsed = Line::try_parse_from(words).map_err(|err| eyre::eyre!(err.render().to_string()))?;

	Ok(Some(parsed.command))
}

pub fn execute(session: &mut Session, line: &str) -> Result<Flow> {
	let Some(command) = parse(line)? else {
		return Ok(Flow::Continue);
	};

	match command {
		Command::Start =>
			if !session.start()? {
				println!("Already started.");
			},
		Command::List =>
			for (position, title) in session.show_notes()?.iter().enumerate() {
				println!("{:>3}  {title}", position + 1);
			},
		Command::Open { position } => {
			let index = position
				.checked_sub(1)
				.ok_or_else(|| eyre::eyre!("Positions start at 1."))?;

			session.open_note(index)?;
		},
		Command::New => session.create_note()?,
		Command::Save { key } => {
			let path = session.mirror().path_for(&key)?;

			if !session.on_save(&path)? {
				println!("No saved file for note {key}.");
			}
		},
		Command::Delete { key } => {
			let path = session.mirror().path_for(&key)?;

			if !session.delete_note(&path)? {
				println!("Unknown note {key}.");
			}
		},
		Command::Status => {
			let state = if session.is_busy() { "busy" } else { "idle" };

			println!("{state}, {} notes", session.notes().len());
		},
		Command::Quit => return Ok(Flow::Quit),
	}

	Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_commands_with_arguments() {
		assert_eq!(parse("open 3").expect("parse failed"), Some(Command::Open { position: 3 }));
		assert_eq!(
			parse("  delete  abc ").expect("parse failed"),
			Some(Command::Delete { key: "abc".to_string() })
		);
		assert_eq!(parse("").expect("parse failed"), None);
	}

	#[test]
	fn rejects_unknown_commands() {
		assert!(parse("frobnicate").is_err());
		assert!(parse("open first").is_err());
	}
}
