use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Terminal output helper shared by every subcommand.
///
/// Colors apply only when stdout is a terminal and the theme allows it;
/// `--quiet` drops the decoration but keeps the text.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    spinner_style: ProgressStyle,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let stdout_is_tty = std::io::stdout().is_terminal();
        let paint = theme != Theme::Plain && stdout_is_tty && !quiet;

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        let spinner_style = ProgressStyle::with_template("{prefix} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        Self {
            palette,
            paint,
            quiet,
            spinner_style,
        }
    }

    pub fn spacer(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// A titled block of aligned key/value rows.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>key_width$}:")),
                    self.palette.value.paint(value)
                );
            } else {
                println!("  {key:>key_width$}: {value}");
            }
        }
    }

    pub fn list<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let entries: Vec<String> = entries.into_iter().collect();
        if entries.is_empty() {
            return;
        }
        self.heading(title);
        for entry in entries {
            if self.paint {
                println!("  {} {entry}", self.palette.bullet.paint("-"));
            } else {
                println!("  - {entry}");
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.line(self.palette.info, INFO_ICON, message);
    }

    pub fn success(&self, message: &str) {
        self.line(self.palette.success, SUCCESS_ICON, message);
    }

    pub fn warn(&self, message: &str) {
        if self.quiet {
            eprintln!("{message}");
            return;
        }
        if self.paint {
            eprintln!("{} {message}", self.palette.warn.paint(WARNING_ICON));
        } else {
            eprintln!("{WARNING_ICON} {message}");
        }
    }

    /// A spinner that reports how long the labelled step ran. Dropping the
    /// guard without finishing marks the step interrupted.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = if self.quiet {
            None
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style.clone());
            pb.set_prefix(self.painted(self.palette.info, PROGRESS_ICON));
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        };
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            println!("{title}");
        } else if self.paint {
            println!("{}", self.palette.heading.paint(format!("{HEADING_ICON} {title}")));
        } else {
            println!("{HEADING_ICON} {title}");
        }
    }

    fn line(&self, style: Style, icon: &str, message: &str) {
        if self.quiet {
            println!("{message}");
        } else if self.paint {
            println!("{} {message}", style.paint(icon));
        } else {
            println!("{icon} {message}");
        }
    }

    fn painted(&self, style: Style, text: &str) -> String {
        if self.paint {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        elapsed
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let elapsed = format_duration(self.start.elapsed());
        if let Some(pb) = self.pb.take() {
            pb.abandon_with_message(format!("{} interrupted after {elapsed}", self.label));
        } else {
            self.ui
                .warn(&format!("{} interrupted after {elapsed}", self.label));
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    bullet: Style,
    info: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Cyan).bold(),
            key: Style::new().fg(Color::LightBlue),
            value: Style::new().fg(Color::White),
            bullet: Style::new().fg(Color::Cyan),
            info: Style::new().fg(Color::LightCyan),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            bullet: Style::new().fg(Color::Blue),
            info: Style::new().fg(Color::Purple),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            bullet: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "::";
const SUCCESS_ICON: &str = "ok";
const WARNING_ICON: &str = "!!";
const INFO_ICON: &str = "--";
const PROGRESS_ICON: &str = ">>";
