//! Command reference.

use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Intent, IntentKind};

/// Command families with example phrasings, in display order.
pub const COMMAND_FAMILIES: &[(&str, &[(&str, &str)])] = &[
    (
        "General & System",
        &[
            ("'help', 'what can you do'", "Shows this command reference."),
            ("'exit', 'quit', 'goodbye'", "Ends the session."),
            ("'what time is it?', 'date and time'", "Current date and time."),
            ("'system stats', 'cpu usage'", "CPU and memory usage."),
            ("'system uptime'", "How long the system has been running."),
            ("'check internet', 'am I online'", "Connectivity check."),
            ("'lock screen'", "Locks the screen."),
            ("'shutdown' / 'restart' / 'logout'", "Power operations (confirmation required)."),
            ("'empty recycle bin'", "Clears the recycle bin (confirmation required)."),
            ("'open gui', 'launch interface'", "Starts the graphical interface."),
        ],
    ),
    (
        "Timers & Productivity",
        &[
            ("'timer 5 minutes for my break'", "Sets a timer, e.g. 'timer 1h 30m meeting prep'."),
            ("'cancel timer break' / 'cancel timer 3'", "Stops a specific timer."),
            ("'cancel all timers'", "Stops every active timer."),
            ("'take a note: buy milk'", "Adds a note for this session."),
            ("'show notes' / 'clear notes'", "Lists or erases the session notes."),
            ("'copy: some text'", "Copies text to the clipboard."),
            ("'read clipboard'", "Shows the clipboard content."),
            ("'type: Hello there'", "Types text into the focused window after a short delay."),
        ],
    ),
    (
        "Fun, Information & Calculation",
        &[
            ("'calculate 15 * (23 + 10) / 2'", "Arithmetic."),
            ("'weather in London'", "Searches for the forecast."),
            ("'roll a dice', 'flip a coin'", "A bit of chance."),
            ("'tell me a joke'", "Something to smile about."),
            ("'random number between 1 and 100'", "A random integer in range."),
        ],
    ),
    (
        "Applications, Web, Files & Media",
        &[
            ("'open chrome', 'quit spotify'", "Opens or closes an application."),
            ("'switch to firefox'", "Brings a window to the front."),
            ("'close tab'", "Closes the active tab."),
            ("'open wikipedia.org'", "Opens a URL in the browser."),
            ("'search for rust async'", "Web search."),
            ("'list files in Downloads'", "Directory contents."),
            ("'create directory projects'", "Makes a new folder."),
            ("'open file report.docx'", "Opens a file with its default application."),
            ("'next song', 'pause music'", "Media controls."),
            ("'volume up', 'set volume to 50%'", "Adjusts the system volume."),
        ],
    ),
];

/// Render [`COMMAND_FAMILIES`] as the reply text.
pub fn help_text() -> String {
    let width = COMMAND_FAMILIES
        .iter()
        .flat_map(|(_, commands)| commands.iter())
        .map(|(example, _)| example.chars().count())
        .max()
        .unwrap_or(0);

    let mut text = String::from("Here's what I can do:");
    for (family, commands) in COMMAND_FAMILIES {
        text.push_str(&format!("\n\n{}:", family));
        for (example, description) in commands.iter() {
            text.push_str(&format!("\n  {:<width$}  {}", example, description, width = width));
        }
    }
    text.push_str("\n\nAnything else I'll try to answer conversationally.");
    text
}

pub struct HelpHandler;

#[async_trait]
impl ActionHandler for HelpHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[IntentKind::Help]
    }

    async fn execute(&self, _intent: &Intent) -> Result<String, ActionError> {
        Ok(help_text())
    }

    fn describe(&self, _intent: &Intent) -> String {
        "Show command reference".to_string()
    }
}
