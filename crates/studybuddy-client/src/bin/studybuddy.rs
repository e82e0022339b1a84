//! Headless StudyBuddy session.
//!
//! # Usage
//!
//! ```bash
//! # Connect with the settings in studybuddy.toml and follow a group
//! studybuddy --config studybuddy.toml --group 12
//!
//! # Load a course's progress as well
//! studybuddy --config studybuddy.toml --course 3
//! ```

use std::path::PathBuf;

use clap::Parser;
use studybuddy_client::{ClientConfig, Session, SessionView, init_tracing};
use studybuddy_proto::GroupId;

/// StudyBuddy chat session
#[derive(Parser, Debug)]
#[command(name = "studybuddy")]
#[command(about = "Headless StudyBuddy group chat session")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "studybuddy.toml")]
    config: PathBuf,

    /// Group to select once groups are loaded
    #[arg(short, long)]
    group: Option<String>,

    /// Course whose progress to load
    #[arg(long)]
    course: Option<String>,

    /// Log level, overriding the config file (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ClientConfig::load(&args.config)?;
    init_tracing(args.log_level.as_deref().unwrap_or(&config.log_level));

    let session = Session::start(&config)?;
    session.connect().await?;
    if let Some(course) = args.course {
        session.load_progress(course).await?;
    }

    let mut views = session.subscribe();
    let mut group = args.group;
    let mut seen = Seen::default();
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();

                // Groups arrive after connecting; select once the target is listed.
                if let Some(target) = group.take_if(|g| view.groups.iter().any(|v| v.id.as_str() == g.as_str())) {
                    session.select_group(target).await?;
                }
                seen.log(&view);
            }

            _ = &mut interrupted => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    session.shutdown().await?;
    Ok(())
}

/// How much of the selected thread has been logged.
#[derive(Default)]
struct Seen {
    group: Option<GroupId>,
    messages: usize,
}

impl Seen {
    /// Log status and messages not logged yet.
    fn log(&mut self, view: &SessionView) {
        if self.group != view.selected || self.messages > view.messages.len() {
            self.group.clone_from(&view.selected);
            self.messages = 0;
        }

        for message in &view.messages[self.messages..] {
            tracing::info!(
                group_id = %message.group_id,
                time = %message.timestamp,
                sender = %message.sender,
                "{}",
                message.content
            );
        }
        self.messages = view.messages.len();

        tracing::debug!(
            status = ?view.status,
            groups = view.groups.len(),
            unread = view.total_unread,
            progress = view.overall_progress,
            "view updated"
        );
    }
}
