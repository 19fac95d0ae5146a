use std::io::{BufRead, Write};
use std::time::Instant;

use anyhow::Result;
use profile_index_api::{match_percentage, MatchSource, QueryEngine};
use profile_index_core::validate_label;

const SEPARATOR: &str = "-------------------------------------------------------------";
const PROMPT: &str = "pidx> ";

const HELP_TEXT: &str = "\
commands:
  FIND <category|tag>
  GET_USER_PROFILE <user_id>
  ADD_TAG <user_id> <tag>
  REMOVE_TAG <user_id> <tag>
  EXPLAIN <user_id>
  STATS
  TIMING
  HELP
  EXIT | QUIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Find { key: String },
    GetUserProfile { user_id: String },
    AddTag { user_id: String, tag: String },
    RemoveTag { user_id: String, tag: String },
    Explain { user_id: String },
    Stats,
    Timing,
    Help,
    Exit,
    Invalid { input: String },
}

/// Parse one input line. Blank lines yield `None`.
///
/// Keywords are case-sensitive and extra trailing arguments are ignored.
#[must_use]
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next()?;
    let first = parts.next().map(str::to_string);
    let second = parts.next().map(str::to_string);

    let command = match (keyword, first, second) {
        ("FIND", Some(key), _) => ReplCommand::Find { key },
        ("GET_USER_PROFILE", Some(user_id), _) => ReplCommand::GetUserProfile { user_id },
        ("ADD_TAG", Some(user_id), Some(tag)) => ReplCommand::AddTag { user_id, tag },
        ("REMOVE_TAG", Some(user_id), Some(tag)) => ReplCommand::RemoveTag { user_id, tag },
        ("EXPLAIN", Some(user_id), _) => ReplCommand::Explain { user_id },
        ("STATS", _, _) => ReplCommand::Stats,
        ("TIMING", _, _) => ReplCommand::Timing,
        ("HELP", _, _) => ReplCommand::Help,
        ("EXIT" | "QUIT", _, _) => ReplCommand::Exit,
        _ => ReplCommand::Invalid { input: line.trim().to_string() },
    };
    Some(command)
}

pub struct Repl<'a> {
    engine: &'a QueryEngine,
    show_timing: bool,
}

impl<'a> Repl<'a> {
    #[must_use]
    pub fn new(engine: &'a QueryEngine, show_timing: bool) -> Self {
        Self { engine, show_timing }
    }

    /// Read commands until `EXIT`/`QUIT` or end of input.
    ///
    /// # Errors
    /// Returns an error when reading input or writing output fails.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Loaded {} user profile(s). Type HELP for commands.", self.engine.total_count())?;
        write!(out, "{PROMPT}")?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            if let Some(command) = parse_command(&line) {
                if command == ReplCommand::Exit {
                    writeln!(out, "bye")?;
                    return Ok(());
                }
                self.execute(&command, out)?;
            }
            write!(out, "{PROMPT}")?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// # Errors
    /// Returns an error when writing output fails.
    pub fn execute(&mut self, command: &ReplCommand, out: &mut impl Write) -> Result<()> {
        let started = Instant::now();
        match command {
            ReplCommand::Find { key } => self.find(key, out)?,
            ReplCommand::GetUserProfile { user_id } => self.profile(user_id, out)?,
            ReplCommand::AddTag { user_id, tag } => self.add_tag(user_id, tag, out)?,
            ReplCommand::RemoveTag { user_id, tag } => self.remove_tag(user_id, tag, out)?,
            ReplCommand::Explain { user_id } => self.explain(user_id, out)?,
            ReplCommand::Stats => self.stats(out)?,
            ReplCommand::Timing => {
                self.show_timing = !self.show_timing;
                let state = if self.show_timing { "on" } else { "off" };
                writeln!(out, "execution time display: {state}")?;
            }
            ReplCommand::Help => writeln!(out, "{HELP_TEXT}")?,
            ReplCommand::Exit => {}
            ReplCommand::Invalid { input } => {
                writeln!(out, "ERROR: invalid command format: {input}")?;
            }
        }

        if self.show_timing {
            writeln!(out, "Query executed in {:.3} seconds", started.elapsed().as_secs_f64())?;
        }
        writeln!(out, "{SEPARATOR}")?;
        Ok(())
    }

    fn find(&self, key: &str, out: &mut impl Write) -> Result<()> {
        let result = self.engine.find(key);
        let source = match result.matched {
            MatchSource::Category => "category",
            MatchSource::Tag => "tag",
            MatchSource::None => "no match",
        };
        writeln!(out, "FIND: {key} ({source})")?;
        if result.user_ids.is_empty() {
            writeln!(out, "  (no users found)")?;
        }
        for user_id in &result.user_ids {
            writeln!(out, "  - {user_id}")?;
        }
        writeln!(out, "Results: {} user(s) out of {}", result.user_ids.len(), result.total_users)?;
        writeln!(
            out,
            "Percentage: {:.2}%",
            match_percentage(result.user_ids.len(), result.total_users)
        )?;
        Ok(())
    }

    fn profile(&self, user_id: &str, out: &mut impl Write) -> Result<()> {
        writeln!(out, "GET_USER_PROFILE: {user_id}")?;
        match self.engine.get_profile(user_id) {
            Some(profile) => writeln!(out, "{profile}")?,
            None => writeln!(out, "ERROR: user {user_id} not found")?,
        }
        Ok(())
    }

    fn add_tag(&self, user_id: &str, tag: &str, out: &mut impl Write) -> Result<()> {
        writeln!(out, "ADD_TAG user={user_id} tag={tag}")?;
        if let Err(err) = validate_label(tag) {
            writeln!(out, "ERROR: {err}")?;
        } else if self.engine.add_tag(user_id, tag) {
            writeln!(out, "OK: tag '{tag}' added to {user_id}")?;
        } else {
            writeln!(out, "ERROR: user {user_id} not found")?;
        }
        Ok(())
    }

    fn remove_tag(&self, user_id: &str, tag: &str, out: &mut impl Write) -> Result<()> {
        writeln!(out, "REMOVE_TAG user={user_id} tag={tag}")?;
        if self.engine.remove_tag(user_id, tag) {
            writeln!(out, "OK: tag '{tag}' removed from {user_id}")?;
        } else {
            writeln!(out, "ERROR: tag '{tag}' not found on {user_id}")?;
        }
        Ok(())
    }

    fn explain(&self, user_id: &str, out: &mut impl Write) -> Result<()> {
        writeln!(out, "EXPLAIN: {user_id}")?;
        let Some(report) = self.engine.explain(user_id) else {
            writeln!(out, "ERROR: user {user_id} not found")?;
            return Ok(());
        };
        for verdict in &report.verdicts {
            let outcome = if verdict.matched { "match" } else { "no match" };
            match (verdict.score, verdict.threshold) {
                (Some(score), Some(threshold)) => {
                    writeln!(out, "  {}: {outcome} (score {score}/{threshold})", verdict.category)?;
                }
                _ => writeln!(out, "  {}: {outcome}", verdict.category)?,
            }
            for reason in &verdict.reasons {
                writeln!(out, "    {reason}")?;
            }
        }
        Ok(())
    }

    fn stats(&self, out: &mut impl Write) -> Result<()> {
        let stats = self.engine.stats();
        writeln!(out, "STATS: {} user(s)", stats.total_users)?;
        for (category, count) in &stats.categories {
            writeln!(out, "  category {category}: {count}")?;
        }
        for (tag, count) in &stats.tags {
            writeln!(out, "  tag {tag}: {count}")?;
        }
        Ok(())
    }
}
