use std::io::{self, Stdout, Write};

use colored::{ColoredString, Colorize};
use lunamon_trace::{replay_call, CallRecord, Direction, Kind, Record};
use serde_json::json;

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Renders trace records and call trees.
pub struct Console<W: Write = Stdout> {
    format: LogFormat,
    out: W,
}

impl Console<Stdout> {
    pub fn stdout(format: LogFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write> Console<W> {
    pub fn new(format: LogFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render one record of the flat view.
    pub fn record(&mut self, record: &Record) -> io::Result<()> {
        match self.format {
            LogFormat::Json => {
                let line = serde_json::to_string(record).map_err(io::Error::other)?;
                writeln!(self.out, "{}", line)
            }
            LogFormat::Compact => writeln!(
                self.out,
                "{:.3} {} {} {} {}>{}{}",
                record.timestamp,
                record.direction,
                record.kind,
                record.token,
                record.client,
                record.service,
                record.method.as_deref().unwrap_or("")
            ),
            LogFormat::Pretty => {
                writeln!(
                    self.out,
                    "{} {} {:<6} {} {} {} {} {}",
                    format!("{:>10.3}", record.timestamp).dimmed(),
                    direction_label(record.direction),
                    kind_label(record.kind),
                    format!("#{}", record.token).bold(),
                    endpoint(&record.client, &record.client_socket),
                    "→".dimmed(),
                    endpoint(&record.service, &record.service_socket),
                    record.method.as_deref().unwrap_or("").bright_white()
                )?;
                writeln!(self.out, "           {}", record.body.to_string().dimmed())
            }
        }
    }

    /// Render the correlated call tree, optionally with replay commands.
    pub fn calls(&mut self, calls: &[CallRecord], with_replay: bool) -> io::Result<()> {
        for call in calls {
            let replay = if with_replay {
                replay_call(call).ok()
            } else {
                None
            };

            match self.format {
                LogFormat::Json => {
                    let mut value = json!({
                        "call": call.call,
                        "responses": call.responses,
                    });
                    if let Some(ref cmd) = replay {
                        value["replay"] = json!(cmd);
                    }
                    writeln!(self.out, "{}", value)?;
                }
                LogFormat::Compact => {
                    write!(
                        self.out,
                        "{} {}>{}{} responses={}",
                        call.call.token,
                        call.call.client,
                        call.call.service,
                        call.call.method.as_deref().unwrap_or(""),
                        call.responses.len()
                    )?;
                    if let Some(ref cmd) = replay {
                        write!(self.out, " replay={}", cmd)?;
                    }
                    writeln!(self.out)?;
                }
                LogFormat::Pretty => self.call_tree(call, replay.as_deref())?,
            }
        }
        Ok(())
    }

    fn call_tree(&mut self, call: &CallRecord, replay: Option<&str>) -> io::Result<()> {
        let head = &call.call;
        writeln!(
            self.out,
            "{} {} {} {} {}{}  {}",
            "┌".bright_blue(),
            format!("#{}", head.token).bold(),
            endpoint(&head.client, &head.client_socket),
            "→".dimmed(),
            head.service.bright_white(),
            head.method.as_deref().unwrap_or("").bright_white(),
            format!("{:.3}", head.timestamp).dimmed()
        )?;
        writeln!(self.out, "{}   {}", "│".bright_blue(), head.body.to_string().dimmed())?;

        for response in &call.responses {
            let label = if response.kind == Kind::Call {
                "cancel".bright_red()
            } else {
                "return".bright_magenta()
            };
            writeln!(
                self.out,
                "{} {} {} {}",
                "├─".bright_blue(),
                format!("{:.3}", response.timestamp).dimmed(),
                label,
                response.body
            )?;
        }

        match replay {
            Some(cmd) => writeln!(self.out, "{} {}", "└".bright_blue(), cmd.bright_green()),
            None => writeln!(self.out, "{}", "└".bright_blue()),
        }
    }

    /// Session-level status line (stream ready, stream ended, ...).
    pub fn status(&mut self, message: &str) -> io::Result<()> {
        let now = chrono::Local::now().format("%H:%M:%S");
        match self.format {
            LogFormat::Json => writeln!(
                self.out,
                "{}",
                json!({"status": message, "time": now.to_string()})
            ),
            LogFormat::Compact => writeln!(self.out, "[{}] {}", now, message),
            LogFormat::Pretty => writeln!(
                self.out,
                "{} {}",
                format!("[{}]", now).dimmed(),
                message.bright_yellow()
            ),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn direction_label(direction: Direction) -> ColoredString {
    match direction {
        Direction::Outbound => "TX".bright_green(),
        Direction::Inbound => "RX".bright_cyan(),
    }
}

fn kind_label(kind: Kind) -> ColoredString {
    match kind {
        Kind::Call => "call".yellow(),
        Kind::Return => "return".magenta(),
    }
}

fn endpoint(name: &str, socket: &str) -> String {
    format!("{} ({})", name, socket.dimmed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunamon_trace::MonitorSession;

    fn session() -> MonitorSession {
        let mut session = MonitorSession::new();
        session.feed("Time\tStatus Prot Type Serial Sender Destination Method Payload\n");
        session.feed("12.5 TX call 7 com.app (s1) com.service (s2) app1 /foo/bar «{\"a\":1}»\n");
        session.feed("12.9 TX return 7 com.service (s2) com.app (s1) «{\"returnValue\":true}»\n");
        session
    }

    fn render(format: LogFormat, f: impl FnOnce(&mut Console<Vec<u8>>)) -> String {
        let mut console = Console::new(format, Vec::new());
        f(&mut console);
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("fancy".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_compact_record() {
        let session = session();
        let record = session.store().chronological().next().unwrap().clone();
        let out = render(LogFormat::Compact, |c| c.record(&record).unwrap());
        assert_eq!(out, "12.500 TX call 7 com.app>com.service/foo/bar\n");
    }

    #[test]
    fn test_json_record_round_trips() {
        let session = session();
        let record = session.store().iter().next().unwrap().clone();
        let out = render(LogFormat::Json, |c| c.record(&record).unwrap());
        let parsed: Record = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(&parsed, record.as_ref());
    }

    #[test]
    fn test_json_calls_include_replay() {
        let calls = session().calls();
        let out = render(LogFormat::Json, |c| c.calls(&calls, true).unwrap());
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["call"]["token"], 7);
        assert_eq!(value["responses"].as_array().unwrap().len(), 1);
        assert_eq!(
            value["replay"],
            r#"luna-send -n 1 "luna://com.service/foo/bar" "{\"a\":1}""#
        );
    }

    #[test]
    fn test_pretty_call_tree_mentions_endpoints() {
        let calls = session().calls();
        let out = render(LogFormat::Pretty, |c| c.calls(&calls, true).unwrap());
        assert!(out.contains("com.app"));
        assert!(out.contains("/foo/bar"));
        assert!(out.contains("returnValue"));
        assert!(out.contains("luna-send"));
    }
}
