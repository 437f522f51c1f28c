//! Talk to Merchant Pete in the terminal.
//!
//! ```text
//! moodlink-demo [--config moodlink.toml] [--emotion happy] [--money 50]
//! ```
//!
//! Without a camera the emotion comes from `--emotion`. Without credentials
//! the offline rule table answers. Press Enter to advance pages.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use moodlink_core::{EmotionLabel, MoodlinkConfig};
use moodlink_game::context::{situation_for_money, NpcProfile};
use moodlink_game::pagination::Monospace;
use moodlink_game::session::DialogueInput;
use moodlink_game::telemetry::init_tracing;
use moodlink_game::MoodApp;

struct Args {
    config: Option<PathBuf>,
    emotion: Option<EmotionLabel>,
    money: u64,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        emotion: None,
        money: 50,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter.next().with_context(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--config" => args.config = Some(PathBuf::from(value)),
            "--emotion" => args.emotion = Some(value.parse()?),
            "--money" => args.money = value.parse().context("--money must be a number")?,
            other => bail!("unknown flag {other}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => MoodlinkConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => MoodlinkConfig::default(),
    };
    init_tracing(&config.general);

    let mut app = MoodApp::new(&config, None, Monospace { char_width_px: 14 });
    if let Some(emotion) = args.emotion {
        app.history().push(emotion);
    }

    let pete = NpcProfile::merchant_pete();
    app.interact(
        &pete,
        situation_for_money(args.money),
        Some(Box::new(|| println!("(Merchant Pete waves goodbye)"))),
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();
    while app.session().is_active() {
        if let Some(page) = app.session().current_page() {
            writeln!(stdout, "\n{}:", pete.name)?;
            for line in page {
                writeln!(stdout, "  {line}")?;
            }
        }
        if let Some(prompt) = app.session().prompt() {
            write!(stdout, "{}", prompt.text())?;
            stdout.flush()?;
        }

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        app.session_mut().handle_input(DialogueInput::Continue);
    }

    app.shutdown();
    Ok(())
}
